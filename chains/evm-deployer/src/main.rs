use evm_deployer::artifacts::ArtifactStore;
use evm_deployer::deployer::{redact_endpoint, EthersDeployer};
use evm_deployer::etherscan::{api_url_for_chain, EtherscanClient};
use evm_deployer::records::DeploymentStore;
use evm_deployer::task::deploy::{DEFAULT_CONSTRUCTOR_ARG, DEFAULT_CONTRACT};
use evm_deployer::task::{DeployContext, DeployScript, VerifyContext, VerifyScript};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use core_logic::security::secret::validate_private_key;
use core_logic::{
    encrypt_keystore, setup_logger, DeployConfig, LogOptions, ScriptReport, ScriptRunner, Secret,
    WalletManager,
};
use dialoguer::{theme::ColorfulTheme, Password};
use dotenv::dotenv;
use ethers::prelude::*;
use ethers::utils::to_checksum;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "deploy.toml")]
    config: String,
    /// Increase console log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Do not write logs/deploy.* files
    #[arg(long, global = true)]
    no_log_file: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy a compiled contract (default)
    Deploy(DeployArgs),
    /// Verify a saved deployment on Etherscan
    Verify(VerifyArgs),
    /// List configured networks
    Networks,
    /// Create an encrypted keystore for use as `keystore:PATH`
    Keystore(KeystoreArgs),
}

#[derive(Args, Debug)]
struct DeployArgs {
    #[arg(short, long)]
    network: Option<String>,
    #[arg(long, default_value = DEFAULT_CONTRACT)]
    contract: String,
    /// Constructor arguments, in declaration order
    #[arg(default_value = DEFAULT_CONSTRUCTOR_ARG)]
    args: Vec<String>,
    /// Deploy with no constructor arguments
    #[arg(long, conflicts_with = "args")]
    no_args: bool,
}

impl DeployArgs {
    fn constructor_args(&self) -> Vec<String> {
        if self.no_args {
            Vec::new()
        } else {
            self.args.clone()
        }
    }
}

impl Default for DeployArgs {
    fn default() -> Self {
        Self {
            network: None,
            contract: DEFAULT_CONTRACT.to_string(),
            args: vec![DEFAULT_CONSTRUCTOR_ARG.to_string()],
            no_args: false,
        }
    }
}

#[derive(Args, Debug)]
struct VerifyArgs {
    #[arg(short, long)]
    network: Option<String>,
    #[arg(long, default_value = DEFAULT_CONTRACT)]
    contract: String,
}

#[derive(Args, Debug)]
struct KeystoreArgs {
    /// Where to write the keystore JSON
    out: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();

    let mut log_options = LogOptions::default().with_verbosity(cli.verbose);
    if cli.no_log_file {
        log_options.log_dir = None;
    }
    // Keep guard alive for file logging
    let _log_guard = setup_logger(log_options);

    let result = execute(cli).await;
    let code = ScriptRunner::report(&result, &mut std::io::stdout(), &mut std::io::stderr());
    ExitCode::from(code)
}

async fn execute(cli: Cli) -> Result<ScriptReport> {
    match cli.command.unwrap_or(Command::Deploy(DeployArgs::default())) {
        Command::Deploy(args) => deploy(load_config(&cli.config)?, args).await,
        Command::Verify(args) => verify(load_config(&cli.config)?, args).await,
        Command::Networks => Ok(list_networks(&*load_config(&cli.config)?)),
        Command::Keystore(args) => create_keystore(&args),
    }
}

fn load_config(path: &str) -> Result<Arc<DeployConfig>> {
    info!("Loading config from: {}", path);
    let config = DeployConfig::load(path).with_context(|| format!("Invalid config {}", path))?;
    Ok(Arc::new(config))
}

async fn deploy(config: Arc<DeployConfig>, args: DeployArgs) -> Result<ScriptReport> {
    let (network_name, network) = config.select_network(args.network.as_deref())?;

    let key = WalletManager::new()
        .deployer_key(&network.accounts)
        .await
        .with_context(|| format!("No usable deployer account on '{}'", network_name))?;

    let deployer = EthersDeployer::connect(network_name, network, &key).await?;
    info!(
        "Deployer {:?} on {} (chain {})",
        deployer.address(),
        network_name,
        deployer.chain_id()
    );

    let ctx = DeployContext {
        network: network_name.to_string(),
        config: Arc::clone(&config),
        artifacts: ArtifactStore::from_paths(&config.paths),
        deployer: Arc::new(deployer),
        records: network
            .save_deployments
            .then(|| DeploymentStore::from_paths(&config.paths)),
    };

    let script = DeployScript::new(args.contract.clone(), args.constructor_args());
    ScriptRunner::run(&script, ctx).await
}

async fn verify(config: Arc<DeployConfig>, args: VerifyArgs) -> Result<ScriptReport> {
    let (network_name, network) = config.select_network(args.network.as_deref())?;

    let api_key_ref = config
        .etherscan
        .api_key
        .as_ref()
        .ok_or_else(|| anyhow!("etherscan.api_key is not configured"))?;
    let api_key = WalletManager::new().resolve(api_key_ref).await?;

    let records = DeploymentStore::from_paths(&config.paths);
    let chain_id = match network.expected_chain_id(network_name) {
        Some(id) => id,
        None => records
            .chain_id(network_name)?
            .ok_or_else(|| anyhow!("Unknown chain id for network '{}'", network_name))?,
    };

    let api_url = match &config.etherscan.api_url {
        Some(url) => url.clone(),
        None => api_url_for_chain(chain_id)
            .ok_or_else(|| anyhow!("No Etherscan API known for chain {}", chain_id))?
            .to_string(),
    };

    let ctx = VerifyContext {
        network: network_name.to_string(),
        artifacts: ArtifactStore::from_paths(&config.paths),
        records,
        etherscan: Arc::new(EtherscanClient::new(api_url, api_key)),
    };

    ScriptRunner::run(&VerifyScript::new(args.contract), ctx).await
}

fn list_networks(config: &DeployConfig) -> ScriptReport {
    let lines: Vec<String> = config
        .networks
        .iter()
        .map(|(name, network)| {
            let endpoint = network
                .rpc_url(name)
                .map(|url| redact_endpoint(&url))
                .unwrap_or_else(|e| e.to_string());
            let chain = network
                .expected_chain_id(name)
                .map(|id| id.to_string())
                .unwrap_or_else(|| "?".to_string());
            let marker = if *name == config.default_network {
                " (default)"
            } else {
                ""
            };
            format!(
                "{}{}\t{}\tchain {}\t{} account(s){}",
                name,
                marker,
                endpoint,
                chain,
                network.accounts.len(),
                if network.live { "\tlive" } else { "" }
            )
        })
        .collect();

    ScriptReport {
        message: lines.join("\n"),
        address: None,
        tx_hash: None,
    }
}

fn create_keystore(args: &KeystoreArgs) -> Result<ScriptReport> {
    if args.out.exists() {
        bail!("{} already exists", args.out.display());
    }

    let theme = ColorfulTheme::default();
    let raw_key = Secret::new(
        Password::with_theme(&theme)
            .with_prompt("Private key")
            .interact()?,
    );
    let key = validate_private_key(raw_key.expose())?;
    let wallet: LocalWallet = key.expose().parse().context("Invalid private key")?;
    let address = to_checksum(&wallet.address(), None);

    let password = Secret::new(
        Password::with_theme(&theme)
            .with_prompt("Keystore password")
            .with_confirmation("Repeat password", "Passwords do not match")
            .interact()?,
    );

    let json = encrypt_keystore(&key, &address, password.expose())?;
    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&args.out, serde_json::to_string_pretty(&json)?)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    Ok(ScriptReport {
        message: format!("Keystore for {} written to {}", address, args.out.display()),
        address: Some(address),
        tx_hash: None,
    })
}

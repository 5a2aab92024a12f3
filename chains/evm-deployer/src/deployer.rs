use crate::utils::GasPolicy;
use anyhow::{Context, Result};
use async_trait::async_trait;
use core_logic::{NetworkConfig, NetworkError, Secret};
use ethers::abi::{Abi, Token};
use ethers::prelude::*;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info};

pub type DeployClient = SignerMiddleware<Provider<Http>, LocalWallet>;

#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub contract_name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
    pub args: Vec<Token>,
}

/// A mined contract creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub address: Address,
    pub transaction_hash: H256,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
    pub deployer: Address,
    pub chain_id: u64,
}

/// Submits a contract creation and waits until it is mined.
#[async_trait]
pub trait ContractDeployer: Send + Sync {
    async fn deploy(&self, request: DeployRequest) -> Result<Deployment>;
}

pub struct EthersDeployer {
    client: Arc<DeployClient>,
    endpoint: String,
    chain_id: u64,
    gas: GasPolicy,
    confirmations: usize,
}

impl EthersDeployer {
    /// Connect to the network's RPC endpoint, check the chain id and attach
    /// the signer.
    pub async fn connect(
        network_name: &str,
        network: &NetworkConfig,
        private_key: &Secret,
    ) -> Result<Self> {
        let url = network.rpc_url(network_name)?;
        let endpoint = redact_endpoint(&url);
        let provider = Provider::new(Http::new_with_client(url, Client::new()));

        let chain_id = provider
            .get_chainid()
            .await
            .with_context(|| format!("Failed to reach {}", endpoint))?
            .as_u64();

        if let Some(expected) = network.expected_chain_id(network_name) {
            if expected != chain_id {
                return Err(NetworkError::ChainIdMismatch {
                    endpoint,
                    expected,
                    actual: chain_id,
                }
                .into());
            }
        }

        let wallet = private_key
            .expose()
            .parse::<LocalWallet>()
            .context("Invalid deployer private key")?
            .with_chain_id(chain_id);

        debug!(
            "Connected to {} (chain {}) as {:?}",
            endpoint,
            chain_id,
            wallet.address()
        );

        Ok(Self {
            client: Arc::new(SignerMiddleware::new(provider, wallet)),
            endpoint,
            chain_id,
            gas: GasPolicy::from_network(network),
            confirmations: network.confirmations(),
        })
    }

    pub fn address(&self) -> Address {
        self.client.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[async_trait]
impl ContractDeployer for EthersDeployer {
    async fn deploy(&self, request: DeployRequest) -> Result<Deployment> {
        let factory = ContractFactory::new(request.abi, request.bytecode, Arc::clone(&self.client));
        let mut deployer = factory
            .deploy_tokens(request.args)
            .with_context(|| format!("Failed to build deployment of {}", request.contract_name))?
            .confirmations(self.confirmations);

        if self.gas.is_legacy() {
            deployer = deployer.legacy();
            self.gas.apply_price(&mut deployer.tx);
        }

        if self.gas.gas_multiplier.is_some() {
            deployer.tx.set_from(self.client.address());
            self.client
                .fill_transaction(&mut deployer.tx, None)
                .await
                .context("Failed to estimate deployment gas")?;
            // fill_transaction may overwrite the price; the configured one wins
            self.gas.apply_price(&mut deployer.tx);
            self.gas.apply_multiplier(&mut deployer.tx);
        }

        info!(
            "Deploying {} from {:?} via {}",
            request.contract_name,
            self.client.address(),
            self.endpoint
        );

        let (contract, receipt) = deployer
            .send_with_receipt()
            .await
            .with_context(|| format!("Deployment of {} failed", request.contract_name))?;

        if receipt.status == Some(U64::zero()) {
            return Err(NetworkError::Reverted {
                tx_hash: format!("{:?}", receipt.transaction_hash),
            }
            .into());
        }

        Ok(Deployment {
            address: contract.address(),
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
            gas_used: receipt.gas_used,
            deployer: self.client.address(),
            chain_id: self.chain_id,
        })
    }
}

/// Host only; RPC URLs often carry an API key in the path.
pub fn redact_endpoint(url: &url::Url) -> String {
    format!(
        "{}://{}",
        url.scheme(),
        url.host_str().unwrap_or("<unknown host>")
    )
}

use crate::args::encode_constructor_args;
use crate::artifacts::check_compiler;
use crate::deployer::DeployRequest;
use crate::records::DeploymentRecord;
use crate::task::{DeployContext, Script, ScriptReport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::utils::to_checksum;
use tracing::{info, warn};

pub const DEFAULT_CONTRACT: &str = "BullieverseAssets";
pub const DEFAULT_CONSTRUCTOR_ARG: &str = "test";

/// Resolve a compiled contract, deploy it with the given constructor
/// arguments and wait for the creation to be mined.
pub struct DeployScript {
    contract: String,
    args: Vec<String>,
    name: String,
}

impl DeployScript {
    pub fn new(contract: impl Into<String>, args: Vec<String>) -> Self {
        let contract = contract.into();
        Self {
            name: format!("deploy {}", contract),
            contract,
            args,
        }
    }
}

impl Default for DeployScript {
    fn default() -> Self {
        Self::new(DEFAULT_CONTRACT, vec![DEFAULT_CONSTRUCTOR_ARG.to_string()])
    }
}

#[async_trait]
impl Script<DeployContext> for DeployScript {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: DeployContext) -> Result<ScriptReport> {
        let artifact = ctx.artifacts.find(&self.contract)?;

        let build_info = match ctx.artifacts.build_info(&artifact) {
            Ok(info) => {
                check_compiler(&artifact, &info, &ctx.config.solidity)?;
                Some(info)
            }
            Err(e) => {
                warn!("Skipping compiler check: {:#}", e);
                None
            }
        };

        let (abi, bytecode) = artifact.factory_parts()?;
        let tokens = encode_constructor_args(&artifact.contract_name, &abi, &self.args)?;

        info!(
            "Deploying {} to {} with args {:?}",
            artifact.fully_qualified_name(),
            ctx.network,
            self.args
        );

        let deployment = ctx
            .deployer
            .deploy(DeployRequest {
                contract_name: artifact.contract_name.clone(),
                abi,
                bytecode,
                args: tokens,
            })
            .await?;

        let address = to_checksum(&deployment.address, None);

        if let Some(records) = &ctx.records {
            let record = DeploymentRecord::new(&artifact, &deployment, &self.args, build_info.as_ref());
            records
                .save(&ctx.network, deployment.chain_id, record)
                .with_context(|| {
                    format!(
                        "{} deployed at {} but the deployment record could not be saved",
                        artifact.contract_name, address
                    )
                })?;
        }

        Ok(ScriptReport {
            message: format!("Deployed {} Address: {}", artifact.contract_name, address),
            address: Some(address),
            tx_hash: Some(format!("{:?}", deployment.transaction_hash)),
        })
    }
}

use crate::args::{encode_constructor_args, encoded_args_hex};
use crate::etherscan::{VerifyRequest, VerifyStatus, STATUS_RETRY};
use crate::task::{Script, ScriptReport, VerifyContext};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use core_logic::RetryConfig;
use ethers::utils::to_checksum;

/// Verify a previously saved deployment's source on Etherscan.
pub struct VerifyScript {
    contract: String,
    retry: RetryConfig,
    name: String,
}

impl VerifyScript {
    pub fn new(contract: impl Into<String>) -> Self {
        let contract = contract.into();
        Self {
            name: format!("verify {}", contract),
            contract,
            retry: STATUS_RETRY,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build the Etherscan request from the saved record and the build info.
    pub fn prepare(&self, ctx: &VerifyContext) -> Result<VerifyRequest> {
        // records are keyed by bare contract name
        let (source, name) = match self.contract.rsplit_once(':') {
            Some((source, name)) => (Some(source), name),
            None => (None, self.contract.as_str()),
        };

        let record = ctx.records.load(&ctx.network, name)?.ok_or_else(|| {
            anyhow!(
                "No saved deployment of {} on {}; deploy with save_deployments enabled first",
                self.contract,
                ctx.network
            )
        })?;

        if let Some(source) = source {
            if record.source_name != source {
                bail!(
                    "Saved deployment of {} on {} is {}, not {}",
                    name,
                    ctx.network,
                    record.fully_qualified_name(),
                    self.contract
                );
            }
        }

        let artifact = ctx.artifacts.find(&record.fully_qualified_name())?;
        let build_info = ctx.artifacts.build_info(&artifact)?;

        let tokens = encode_constructor_args(&artifact.contract_name, &artifact.abi()?, &record.args)?;

        VerifyRequest::new(
            record.address,
            &build_info.input,
            record.fully_qualified_name(),
            &build_info.solc_long_version,
            encoded_args_hex(&tokens),
        )
    }
}

#[async_trait]
impl Script<VerifyContext> for VerifyScript {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: VerifyContext) -> Result<ScriptReport> {
        let request = self.prepare(&ctx)?;
        let address = to_checksum(&request.address, None);

        let status = ctx.etherscan.verify(&request, self.retry).await?;
        let message = match status {
            VerifyStatus::AlreadyVerified => {
                format!("{} at {} is already verified", self.contract, address)
            }
            _ => format!("Verified {} at {}", self.contract, address),
        };

        Ok(ScriptReport {
            message,
            address: Some(address),
            tx_hash: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::tests::write_fixture;
    use crate::artifacts::ArtifactStore;
    use crate::deployer::Deployment;
    use crate::etherscan::tests::ScriptedApi;
    use crate::etherscan::EtherscanClient;
    use crate::records::{DeploymentRecord, DeploymentStore};
    use core_logic::Secret;
    use ethers::types::{Address, H256};
    use std::sync::Arc;

    fn context(artifacts: &tempfile::TempDir, deployments: &tempfile::TempDir) -> VerifyContext {
        VerifyContext {
            network: "rinkeby".to_string(),
            artifacts: ArtifactStore::new(artifacts.path()),
            records: DeploymentStore::new(deployments.path()),
            etherscan: Arc::new(EtherscanClient::new(
                "https://api-rinkeby.etherscan.io/api",
                Secret::new("KEY"),
            )),
        }
    }

    /// Artifacts for `contracts/Assets.sol:Assets` with a saved rinkeby deployment.
    fn saved_deployment() -> (tempfile::TempDir, tempfile::TempDir) {
        let artifacts = tempfile::tempdir().unwrap();
        let deployments = tempfile::tempdir().unwrap();
        write_fixture(artifacts.path(), "contracts/Assets.sol", "Assets", "0.8.0", 200);

        let artifact = ArtifactStore::new(artifacts.path()).find("Assets").unwrap();
        let deployment = Deployment {
            address: Address::repeat_byte(0x11),
            transaction_hash: H256::repeat_byte(0x22),
            block_number: Some(1),
            gas_used: None,
            deployer: Address::repeat_byte(0x33),
            chain_id: 4,
        };
        DeploymentStore::new(deployments.path())
            .save(
                "rinkeby",
                4,
                DeploymentRecord::new(&artifact, &deployment, &["test".to_string()], None),
            )
            .unwrap();

        (artifacts, deployments)
    }

    #[test]
    fn test_prepare_from_saved_deployment() {
        let (artifacts, deployments) = saved_deployment();

        let ctx = context(&artifacts, &deployments);
        let request = VerifyScript::new("Assets").prepare(&ctx).unwrap();

        assert_eq!(request.address, Address::repeat_byte(0x11));
        assert_eq!(request.contract_name, "contracts/Assets.sol:Assets");
        assert_eq!(request.compiler_version, "v0.8.0+commit.c7dfd78e");
        assert!(request.source.contains("\"language\":\"Solidity\""));
        // offset word, length word (4), then "test" padded
        assert!(request.constructor_args.starts_with(&format!("{}20", "0".repeat(62))));
        assert!(request.constructor_args.contains("74657374"));
    }

    #[test]
    fn test_prepare_with_fully_qualified_name() {
        let (artifacts, deployments) = saved_deployment();
        let ctx = context(&artifacts, &deployments);

        let request = VerifyScript::new("contracts/Assets.sol:Assets")
            .prepare(&ctx)
            .unwrap();
        assert_eq!(request.address, Address::repeat_byte(0x11));

        let err = VerifyScript::new("contracts/Other.sol:Assets")
            .prepare(&ctx)
            .unwrap_err();
        assert!(err.to_string().contains("contracts/Assets.sol:Assets"));
    }

    #[tokio::test]
    async fn test_run_reports_verified_address() {
        let (artifacts, deployments) = saved_deployment();
        let api = Arc::new(ScriptedApi::queued(vec![
            VerifyStatus::Pending,
            VerifyStatus::Verified,
        ]));
        let ctx = VerifyContext {
            etherscan: api.clone(),
            ..context(&artifacts, &deployments)
        };

        let report = VerifyScript::new("Assets")
            .with_retry(RetryConfig::fixed(3, 1))
            .run(ctx)
            .await
            .unwrap();

        assert_eq!(api.calls(), 2);
        assert_eq!(
            report.address.as_deref(),
            Some(to_checksum(&Address::repeat_byte(0x11), None).as_str())
        );
        assert!(report.message.starts_with("Verified Assets at 0x"));
    }

    #[test]
    fn test_prepare_without_record() {
        let artifacts = tempfile::tempdir().unwrap();
        let deployments = tempfile::tempdir().unwrap();
        write_fixture(artifacts.path(), "contracts/Assets.sol", "Assets", "0.8.0", 200);

        let ctx = context(&artifacts, &deployments);
        let err = VerifyScript::new("Assets").prepare(&ctx).unwrap_err();
        assert!(err.to_string().contains("No saved deployment"));
    }
}

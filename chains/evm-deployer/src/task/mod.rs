use crate::artifacts::ArtifactStore;
use crate::deployer::ContractDeployer;
use crate::etherscan::VerificationApi;
use crate::records::DeploymentStore;
use core_logic::DeployConfig;
use std::sync::Arc;

pub mod deploy;
pub mod verify;

pub use self::deploy::DeployScript;
pub use self::verify::VerifyScript;

pub use core_logic::traits::{Script, ScriptReport};

#[derive(Clone)]
pub struct DeployContext {
    pub network: String,
    pub config: Arc<DeployConfig>,
    pub artifacts: ArtifactStore,
    pub deployer: Arc<dyn ContractDeployer>,
    /// Set when the network has `save_deployments` enabled.
    pub records: Option<DeploymentStore>,
}

#[derive(Clone)]
pub struct VerifyContext {
    pub network: String,
    pub artifacts: ArtifactStore,
    pub records: DeploymentStore,
    pub etherscan: Arc<dyn VerificationApi>,
}

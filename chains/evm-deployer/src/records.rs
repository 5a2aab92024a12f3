//! Saved deployments, one JSON file per contract and network:
//! `deployments/<network>/<Contract>.json` plus a `.chainId` marker.

use crate::artifacts::{Artifact, BuildInfo};
use crate::deployer::Deployment;
use anyhow::{Context, Result};
use core_logic::PathsConfig;
use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const CHAIN_ID_FILE: &str = ".chainId";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub address: Address,
    pub contract_name: String,
    pub source_name: String,
    pub abi: Value,
    pub transaction_hash: H256,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
    pub deployer: Address,
    pub args: Vec<String>,
    pub num_deployments: u64,
    pub solc_input_hash: Option<String>,
    pub bytecode: String,
    pub deployed_bytecode: String,
}

impl DeploymentRecord {
    pub fn new(
        artifact: &Artifact,
        deployment: &Deployment,
        args: &[String],
        build_info: Option<&BuildInfo>,
    ) -> Self {
        Self {
            address: deployment.address,
            contract_name: artifact.contract_name.clone(),
            source_name: artifact.source_name.clone(),
            abi: artifact.abi.clone(),
            transaction_hash: deployment.transaction_hash,
            block_number: deployment.block_number,
            gas_used: deployment.gas_used,
            deployer: deployment.deployer,
            args: args.to_vec(),
            num_deployments: 1,
            solc_input_hash: build_info.map(|b| b.id.clone()).filter(|id| !id.is_empty()),
            bytecode: artifact.bytecode.clone(),
            deployed_bytecode: artifact.deployed_bytecode.clone(),
        }
    }

    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }
}

#[derive(Debug, Clone)]
pub struct DeploymentStore {
    root: PathBuf,
}

impl DeploymentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_paths(paths: &PathsConfig) -> Self {
        Self::new(&paths.deployments)
    }

    fn network_dir(&self, network: &str) -> PathBuf {
        self.root.join(network)
    }

    fn record_path(&self, network: &str, contract: &str) -> PathBuf {
        self.network_dir(network).join(format!("{}.json", contract))
    }

    /// Write the record, bumping `numDeployments` when one already exists.
    pub fn save(&self, network: &str, chain_id: u64, mut record: DeploymentRecord) -> Result<PathBuf> {
        let dir = self.network_dir(network);
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {:?}", dir))?;
        write_file(&dir.join(CHAIN_ID_FILE), &chain_id.to_string())?;

        if let Some(previous) = self.load(network, &record.contract_name)? {
            record.num_deployments = previous.num_deployments + 1;
        }

        let path = self.record_path(network, &record.contract_name);
        let json = serde_json::to_string_pretty(&record)?;
        write_file(&path, &json)?;

        info!("Saved deployment of {} to {:?}", record.contract_name, path);
        Ok(path)
    }

    pub fn load(&self, network: &str, contract: &str) -> Result<Option<DeploymentRecord>> {
        let path = self.record_path(network, contract);
        if !path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Invalid deployment record {:?}", path))?;
        Ok(Some(record))
    }

    pub fn chain_id(&self, network: &str) -> Result<Option<u64>> {
        let path = self.network_dir(network).join(CHAIN_ID_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content =
            fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
        let id = content
            .trim()
            .parse()
            .with_context(|| format!("Invalid chain id in {:?}", path))?;
        Ok(Some(id))
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))
}

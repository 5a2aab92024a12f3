//! Compiled contract artifacts.
//!
//! Reads the Hardhat artifact layout:
//!
//! ```text
//! artifacts/
//!   build-info/<id>.json
//!   contracts/Token.sol/Token.json
//!   contracts/Token.sol/Token.dbg.json
//! ```

use anyhow::{Context, Result};
use core_logic::{ArtifactError, PathsConfig, SolidityConfig};
use ethers::abi::Abi;
use ethers::types::Bytes;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ARTIFACT_FORMAT: &str = "hh-sol-artifact-1";
const BUILD_INFO_DIR: &str = "build-info";
const DBG_SUFFIX: &str = ".dbg.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(rename = "_format")]
    pub format: String,
    pub contract_name: String,
    pub source_name: String,
    pub abi: Value,
    pub bytecode: String,
    #[serde(default)]
    pub deployed_bytecode: String,
    /// source file -> library name -> placeholder offsets
    #[serde(default)]
    pub link_references: BTreeMap<String, BTreeMap<String, Value>>,
    #[serde(skip)]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    #[serde(default)]
    pub id: String,
    pub solc_version: String,
    pub solc_long_version: String,
    /// Standard JSON input handed to solc.
    pub input: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: String,
}

impl Artifact {
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    pub fn abi(&self) -> Result<Abi> {
        serde_json::from_value(self.abi.clone())
            .with_context(|| format!("Invalid ABI in artifact {:?}", self.path))
    }

    /// Creation bytecode, refusing abstract contracts and unlinked code.
    pub fn creation_code(&self) -> Result<Bytes> {
        let libraries: Vec<String> = self
            .link_references
            .iter()
            .flat_map(|(source, libs)| libs.keys().map(move |lib| format!("{}:{}", source, lib)))
            .collect();
        if !libraries.is_empty() {
            return Err(ArtifactError::UnlinkedLibraries {
                name: self.contract_name.clone(),
                libraries: libraries.join(", "),
            }
            .into());
        }

        let code = self.bytecode.trim_start_matches("0x");
        if code.is_empty() {
            return Err(ArtifactError::NoBytecode {
                name: self.contract_name.clone(),
            }
            .into());
        }

        let bytes = hex::decode(code)
            .with_context(|| format!("Invalid bytecode hex in artifact {:?}", self.path))?;
        Ok(Bytes::from(bytes))
    }

    /// ABI and bytecode, the two halves of a contract factory.
    pub fn factory_parts(&self) -> Result<(Abi, Bytes)> {
        Ok((self.abi()?, self.creation_code()?))
    }

    fn debug_file_path(&self) -> PathBuf {
        self.path
            .with_file_name(format!("{}{}", self.contract_name, DBG_SUFFIX))
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_paths(paths: &PathsConfig) -> Self {
        Self::new(&paths.artifacts)
    }

    /// Resolve a contract by bare name (`Token`) or fully qualified name
    /// (`contracts/Token.sol:Token`).
    pub fn find(&self, name: &str) -> Result<Artifact> {
        if let Some((source, contract)) = name.rsplit_once(':') {
            let path = self.root.join(source).join(format!("{}.json", contract));
            if !path.is_file() {
                return Err(self.not_found(name).into());
            }
            let artifact = Self::read(&path)?;
            if artifact.contract_name != contract || artifact.source_name != source {
                return Err(self.not_found(name).into());
            }
            return Ok(artifact);
        }

        let file_name = format!("{}.json", name);
        let mut candidates = Vec::new();
        self.collect(&self.root, &file_name, &mut candidates)?;
        candidates.sort();

        let mut matches = Vec::new();
        for path in candidates {
            let artifact = Self::read(&path)?;
            if artifact.contract_name == name {
                matches.push(artifact);
            }
        }

        match matches.len() {
            0 => Err(self.not_found(name).into()),
            1 => Ok(matches.remove(0)),
            _ => Err(ArtifactError::Ambiguous {
                name: name.to_string(),
                candidates: matches
                    .iter()
                    .map(Artifact::fully_qualified_name)
                    .collect::<Vec<_>>()
                    .join(", "),
            }
            .into()),
        }
    }

    pub fn build_info(&self, artifact: &Artifact) -> Result<BuildInfo> {
        let missing = |reason: String| ArtifactError::MissingBuildInfo {
            name: artifact.contract_name.clone(),
            reason,
        };

        let dbg_path = artifact.debug_file_path();
        let content =
            fs::read_to_string(&dbg_path).map_err(|e| missing(format!("{:?}: {}", dbg_path, e)))?;
        let dbg: DebugFile =
            serde_json::from_str(&content).map_err(|e| missing(format!("{:?}: {}", dbg_path, e)))?;

        let base = dbg_path.parent().unwrap_or(&self.root);
        let info_path = base.join(&dbg.build_info);
        let content = fs::read_to_string(&info_path)
            .map_err(|e| missing(format!("{:?}: {}", info_path, e)))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Invalid build info {:?}", info_path))
    }

    fn read(path: &Path) -> Result<Artifact> {
        debug!("Reading artifact {:?}", path);
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let mut artifact: Artifact = serde_json::from_str(&content)
            .with_context(|| format!("Invalid artifact JSON in {:?}", path))?;

        if artifact.format != ARTIFACT_FORMAT {
            return Err(ArtifactError::UnsupportedFormat {
                path: path.display().to_string(),
                format: artifact.format,
            }
            .into());
        }

        artifact.path = path.to_path_buf();
        Ok(artifact)
    }

    fn collect(&self, dir: &Path, file_name: &str, out: &mut Vec<PathBuf>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) if dir == self.root => return Err(self.not_found(file_name).into()),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", dir)),
        };

        for entry in entries.filter_map(|res| res.ok()) {
            let path = entry.path();
            if path.is_dir() {
                if path.file_name().is_some_and(|n| n == BUILD_INFO_DIR) {
                    continue;
                }
                self.collect(&path, file_name, out)?;
            } else if path.file_name().is_some_and(|n| n == file_name) {
                out.push(path);
            }
        }
        Ok(())
    }

    fn not_found(&self, name: &str) -> ArtifactError {
        ArtifactError::NotFound {
            name: name.trim_end_matches(".json").to_string(),
            dir: self.root.display().to_string(),
        }
    }
}

/// Fails when the artifact was built with other compiler settings than the
/// project is configured for.
pub fn check_compiler(
    artifact: &Artifact,
    build_info: &BuildInfo,
    solidity: &SolidityConfig,
) -> Result<(), ArtifactError> {
    let mismatch = |reason: String| ArtifactError::CompilerMismatch {
        name: artifact.contract_name.clone(),
        reason,
    };

    if build_info.solc_version != solidity.version {
        return Err(mismatch(format!(
            "built with solc {}, configured {}",
            build_info.solc_version, solidity.version
        )));
    }

    let configured = solidity.settings.optimizer;
    let optimizer = &build_info.input["settings"]["optimizer"];
    let enabled = optimizer["enabled"].as_bool().unwrap_or(false);
    if enabled != configured.enabled {
        return Err(mismatch(format!(
            "optimizer enabled={} in build, configured {}",
            enabled, configured.enabled
        )));
    }

    if enabled {
        let runs = optimizer["runs"].as_u64().unwrap_or(200);
        if runs != u64::from(configured.runs) {
            return Err(mismatch(format!(
                "optimizer runs={} in build, configured {}",
                runs, configured.runs
            )));
        }
    }

    Ok(())
}

//! # Deployment Configuration
//!
//! Static project configuration: named networks, compiler settings, path
//! overrides, block explorer credentials and the test timeout. Loaded once at
//! startup and never mutated afterwards.

use crate::error::ConfigError;
use crate::security::secret::SecretRef;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::BTreeMap;
use url::Url;

/// Networks that resolve to a local node when no url is configured.
pub const LOCAL_NETWORKS: [&str; 2] = ["hardhat", "localhost"];
pub const LOCAL_RPC_URL: &str = "http://127.0.0.1:8545";
pub const LOCAL_CHAIN_ID: u64 = 31337;

const ENV_PREFIX: &str = "DEPLOY";

#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
    #[serde(default = "default_network")]
    pub default_network: String,
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
    #[serde(default)]
    pub solidity: SolidityConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub etherscan: EtherscanConfig,
    #[serde(default)]
    pub test: TestConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub accounts: Vec<SecretRef>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// Fixed gas price in wei. Forces legacy transactions when set.
    #[serde(default)]
    pub gas_price: Option<u64>,
    #[serde(default)]
    pub gas_multiplier: Option<f64>,
    #[serde(default)]
    pub confirmations: Option<usize>,
    #[serde(default)]
    pub live: bool,
    #[serde(default)]
    pub save_deployments: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolidityConfig {
    #[serde(default = "default_solc_version")]
    pub version: String,
    #[serde(default)]
    pub settings: CompilerSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompilerSettings {
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_runs")]
    pub runs: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_sources")]
    pub sources: String,
    #[serde(default = "default_cache")]
    pub cache: String,
    #[serde(default = "default_artifacts")]
    pub artifacts: String,
    #[serde(default = "default_deployments")]
    pub deployments: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EtherscanConfig {
    #[serde(default)]
    pub api_key: Option<SecretRef>,
    /// Overrides the API endpoint derived from the chain id.
    #[serde(default)]
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestConfig {
    #[serde(default = "default_test_timeout")]
    pub timeout_ms: u64,
}

fn default_network() -> String {
    "rinkeby".to_string()
}

fn default_solc_version() -> String {
    "0.8.0".to_string()
}

fn default_true() -> bool {
    true
}

fn default_runs() -> u32 {
    200
}

fn default_sources() -> String {
    "./contracts".to_string()
}

fn default_cache() -> String {
    "./cache".to_string()
}

fn default_artifacts() -> String {
    "./artifacts".to_string()
}

fn default_deployments() -> String {
    "./deployments".to_string()
}

fn default_test_timeout() -> u64 {
    20_000
}

impl Default for SolidityConfig {
    fn default() -> Self {
        Self {
            version: default_solc_version(),
            settings: CompilerSettings::default(),
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            runs: default_runs(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            cache: default_cache(),
            artifacts: default_artifacts(),
            deployments: default_deployments(),
        }
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_test_timeout(),
        }
    }
}

impl DeployConfig {
    /// Load from a file (format picked from the extension), layered with
    /// `DEPLOY__`-prefixed environment overrides.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    /// Same as [`DeployConfig::load`] with overrides read from
    /// `<prefix>__SECTION__KEY` variables.
    pub fn load_with_env_prefix(path: &str, prefix: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix(prefix).separator("__"))
            .build()
            .map_err(|e| ConfigError::Load {
                path: path.to_string(),
                msg: e.to_string(),
            })?;

        Self::from_settings(settings, path)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigError::Load {
                path: "<inline>".to_string(),
                msg: e.to_string(),
            })?;

        Self::from_settings(settings, "<inline>")
    }

    fn from_settings(settings: Config, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = settings
            .try_deserialize()
            .map_err(|e| ConfigError::Load {
                path: origin.to_string(),
                msg: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.network(&self.default_network)?;

        for (name, network) in &self.networks {
            network.rpc_url(name)?;

            if let Some(multiplier) = network.gas_multiplier {
                if !(multiplier.is_finite() && multiplier > 0.0) {
                    return Err(ConfigError::InvalidValue {
                        field: format!("networks.{}.gas_multiplier", name),
                        reason: format!("must be a positive number, got {}", multiplier),
                    });
                }
            }

            if network.confirmations == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: format!("networks.{}.confirmations", name),
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        let optimizer = self.solidity.settings.optimizer;
        if optimizer.enabled && optimizer.runs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "solidity.settings.optimizer.runs".to_string(),
                reason: "must be greater than zero when the optimizer is enabled".to_string(),
            });
        }

        if !is_semver(&self.solidity.version) {
            return Err(ConfigError::InvalidValue {
                field: "solidity.version".to_string(),
                reason: format!("expected MAJOR.MINOR.PATCH, got '{}'", self.solidity.version),
            });
        }

        if let Some(api_url) = &self.etherscan.api_url {
            Url::parse(api_url).map_err(|e| ConfigError::InvalidValue {
                field: "etherscan.api_url".to_string(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    pub fn network(&self, name: &str) -> Result<&NetworkConfig, ConfigError> {
        self.networks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownNetwork {
                network: name.to_string(),
                known: self
                    .networks
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// The network to use for this run: the explicit one, else the default.
    pub fn select_network<'a>(
        &'a self,
        requested: Option<&'a str>,
    ) -> Result<(&'a str, &'a NetworkConfig), ConfigError> {
        let name = requested.unwrap_or(&self.default_network);
        Ok((name, self.network(name)?))
    }
}

impl NetworkConfig {
    pub fn is_local(name: &str) -> bool {
        LOCAL_NETWORKS.contains(&name)
    }

    /// The endpoint to connect to. Local networks fall back to a node on
    /// the default port.
    pub fn rpc_url(&self, name: &str) -> Result<Url, ConfigError> {
        let raw = match (&self.url, Self::is_local(name)) {
            (Some(url), _) => url.as_str(),
            (None, true) => LOCAL_RPC_URL,
            (None, false) => {
                return Err(ConfigError::MissingUrl {
                    network: name.to_string(),
                })
            }
        };

        let invalid = || ConfigError::InvalidRpcUrl {
            network: name.to_string(),
            url: raw.to_string(),
        };

        let url = Url::parse(raw).map_err(|_| invalid())?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(invalid()),
        }
    }

    /// Configured chain id; local networks default to the dev chain id.
    pub fn expected_chain_id(&self, name: &str) -> Option<u64> {
        match self.chain_id {
            Some(id) => Some(id),
            None if Self::is_local(name) && self.url.is_none() => Some(LOCAL_CHAIN_ID),
            None => None,
        }
    }

    pub fn confirmations(&self) -> usize {
        self.confirmations.unwrap_or(1)
    }
}

fn is_semver(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semver_check() {
        assert!(is_semver("0.8.0"));
        assert!(is_semver("0.8.21"));
        assert!(!is_semver("0.8"));
        assert!(!is_semver("^0.8.0"));
        assert!(!is_semver("0.8.x"));
    }

    #[test]
    fn test_local_network_defaults() {
        let network = NetworkConfig::default();
        let url = network.rpc_url("hardhat").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8545/");
        assert_eq!(network.expected_chain_id("hardhat"), Some(LOCAL_CHAIN_ID));
        assert_eq!(network.expected_chain_id("rinkeby"), None);
        assert_eq!(network.confirmations(), 1);
    }

    #[test]
    fn test_remote_network_requires_url() {
        let network = NetworkConfig::default();
        assert!(matches!(
            network.rpc_url("mainnet"),
            Err(ConfigError::MissingUrl { .. })
        ));
    }

    #[test]
    fn test_rejects_non_rpc_scheme() {
        for url in ["ftp://example.com", "wss://mainnet.example.com/ws"] {
            let network = NetworkConfig {
                url: Some(url.to_string()),
                ..Default::default()
            };
            assert!(matches!(
                network.rpc_url("mainnet"),
                Err(ConfigError::InvalidRpcUrl { .. })
            ));
        }
    }
}

//! # Core Logic - Shared Utilities for the Deployer
//!
//! Chain-agnostic building blocks used by the deployment binaries: the
//! project configuration, secret handling, logging and the script runner.
//!
//! ## Modules
//!
//! - [`config`] - Network, compiler and path configuration
//! - [`error`] - Typed error handling with thiserror
//! - [`security`] - Secret references and keystore encryption
//! - [`traits`] - The [`Script`] trait
//! - [`utils`] - Logger, retry helper, wallet manager, runner

// Module declarations - internal modules marked pub(crate)
pub mod config;
pub mod error;
pub mod security;
pub mod traits;
pub(crate) mod utils;

// Selective exports - only public API types
pub use config::{
    CompilerSettings, DeployConfig, EtherscanConfig, NetworkConfig, OptimizerConfig, PathsConfig,
    SolidityConfig, TestConfig,
};
pub use error::{ArtifactError, ConfigError, NetworkError, SecretError};
pub use security::secret::{Secret, SecretRef};
pub use security::{EncryptedComponents, SecurityUtils};
pub use traits::{Script, ScriptReport};

// Utils are pub(crate) - only export specific public utilities
pub use utils::{
    decrypt_keystore, encrypt_keystore, setup_logger, DecryptedWallet, LogOptions, PasswordPrompt,
    ScriptRunner, WalletManager, EXIT_FAILURE, EXIT_SUCCESS, PASSWORD_ENV,
};

// Export retry utilities for testing
pub use utils::retry::{with_retry, RetryConfig};

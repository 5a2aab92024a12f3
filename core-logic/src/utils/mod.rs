//! # Utilities Module
//!
//! Internal utility modules for the core-logic crate.
//! These modules are marked as `pub(crate)` to enforce API boundaries.

// Internal modules - not part of public API
pub(crate) mod logger;
pub(crate) mod retry;
pub(crate) mod runner;
pub(crate) mod wallet_manager;

// Selective exports - only public utilities
pub use logger::{setup_logger, LogOptions};
pub use runner::{ScriptRunner, EXIT_FAILURE, EXIT_SUCCESS};
pub use wallet_manager::{
    decrypt_keystore, encrypt_keystore, DecryptedWallet, PasswordPrompt, WalletManager,
    PASSWORD_ENV,
};

//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Invalid RPC URL for network '{network}': '{url}'")]
    InvalidRpcUrl { network: String, url: String },

    #[error("Network '{network}' has no url and is not a local network")]
    MissingUrl { network: String },

    #[error("Unknown network '{network}' (configured: {known})")]
    UnknownNetwork { network: String, known: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to load configuration from {path}: {msg}")]
    Load { path: String, msg: String },
}

/// Secret resolution and keystore errors
#[derive(Error, Debug, Clone)]
pub enum SecretError {
    #[error("Literal secret found in configuration; use env:NAME, file:PATH or keystore:PATH instead")]
    LiteralSecret,

    #[error("Unsupported secret scheme '{scheme}'")]
    UnknownScheme { scheme: String },

    #[error("Environment variable '{name}' is not set")]
    MissingEnv { name: String },

    #[error("Secret file '{path}' is empty")]
    EmptyFile { path: String },

    #[error("No accounts configured")]
    NoAccounts,

    #[error("Password required but not provided")]
    PasswordRequired,

    #[error("Decryption failed for keystore at '{path}': {reason}")]
    DecryptionFailed { path: String, reason: String },

    #[error("Encryption/decryption failed: {reason}")]
    CryptographyFailed { reason: String },

    #[error("Invalid private key format: expected 64 hex chars, got {length}")]
    InvalidKeyLength { length: usize },
}

/// Build artifact errors
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("Artifact for contract '{name}' not found under {dir}")]
    NotFound { name: String, dir: String },

    #[error("Multiple artifacts match '{name}': {candidates}. Use a fully qualified name")]
    Ambiguous { name: String, candidates: String },

    #[error("Artifact {path} has unsupported format '{format}'")]
    UnsupportedFormat { path: String, format: String },

    #[error("Contract '{name}' has no bytecode (abstract contract or interface)")]
    NoBytecode { name: String },

    #[error("Contract '{name}' needs linked libraries: {libraries}")]
    UnlinkedLibraries { name: String, libraries: String },

    #[error("Build info for '{name}' not found: {reason}")]
    MissingBuildInfo { name: String, reason: String },

    #[error("Compiler mismatch for '{name}': {reason}")]
    CompilerMismatch { name: String, reason: String },

    #[error("Constructor of '{name}' expects {expected} arguments, got {actual}")]
    ArgumentCount {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Network and RPC-related errors
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("Chain id mismatch on {endpoint}: configured {expected}, node reports {actual}")]
    ChainIdMismatch {
        endpoint: String,
        expected: u64,
        actual: u64,
    },

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("HTTP error {status_code} from {endpoint}")]
    HttpError { status_code: u16, endpoint: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

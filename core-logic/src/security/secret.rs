//! Secret references.
//!
//! Credentials never appear literally in configuration. A config value names
//! where the secret lives instead:
//!
//! - `env:NAME` reads an environment variable
//! - `file:PATH` reads the first non-comment line of a plain file
//! - `keystore:PATH` decrypts an encrypted JSON wallet

use crate::error::SecretError;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use zeroize::Zeroizing;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum SecretRef {
    Env(String),
    File(PathBuf),
    Keystore(PathBuf),
}

impl FromStr for SecretRef {
    type Err = SecretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((scheme, rest)) = s.split_once(':') else {
            return Err(SecretError::LiteralSecret);
        };

        if rest.is_empty() {
            return Err(SecretError::LiteralSecret);
        }

        match scheme {
            "env" => Ok(SecretRef::Env(rest.to_string())),
            "file" => Ok(SecretRef::File(PathBuf::from(rest))),
            "keystore" => Ok(SecretRef::Keystore(PathBuf::from(rest))),
            // hex before the colon means a pasted key, not a scheme
            other if other.chars().all(|c| c.is_ascii_hexdigit()) => {
                Err(SecretError::LiteralSecret)
            }
            other => Err(SecretError::UnknownScheme {
                scheme: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for SecretRef {
    type Error = SecretError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretRef::Env(name) => write!(f, "env:{}", name),
            SecretRef::File(path) => write!(f, "file:{}", path.display()),
            SecretRef::Keystore(path) => write!(f, "keystore:{}", path.display()),
        }
    }
}

/// A resolved secret value. Wiped from memory on drop.
#[derive(Clone)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***REDACTED***)")
    }
}

/// Normalize and sanity-check an EVM private key.
pub fn validate_private_key(key: &str) -> Result<Secret, SecretError> {
    let trimmed = key.trim();
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if hex_part.len() != 64 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SecretError::InvalidKeyLength {
            length: hex_part.len(),
        });
    }
    Ok(Secret::new(hex_part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schemes() {
        assert_eq!(
            "env:RINKEBY_KEY".parse::<SecretRef>().unwrap(),
            SecretRef::Env("RINKEBY_KEY".to_string())
        );
        assert_eq!(
            "keystore:wallet-json/deployer.json"
                .parse::<SecretRef>()
                .unwrap(),
            SecretRef::Keystore(PathBuf::from("wallet-json/deployer.json"))
        );
        assert_eq!(
            "file:/run/secrets/etherscan".parse::<SecretRef>().unwrap(),
            SecretRef::File(PathBuf::from("/run/secrets/etherscan"))
        );
    }

    #[test]
    fn test_rejects_literal_key() {
        let raw = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
        assert!(matches!(
            raw.parse::<SecretRef>(),
            Err(SecretError::LiteralSecret)
        ));
        assert!(matches!(
            "ABCD1234EXAMPLEAPIKEY5678".parse::<SecretRef>(),
            Err(SecretError::LiteralSecret)
        ));
        assert!(matches!(
            "env:".parse::<SecretRef>(),
            Err(SecretError::LiteralSecret)
        ));
    }

    #[test]
    fn test_unknown_scheme() {
        assert!(matches!(
            "vault:secret/data/key".parse::<SecretRef>(),
            Err(SecretError::UnknownScheme { .. })
        ));
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::new("super-secret");
        let printed = format!("{:?}", secret);
        assert!(!printed.contains("super-secret"));
        assert_eq!(secret.expose(), "super-secret");
    }

    #[test]
    fn test_validate_private_key() {
        let key = format!("0x{}", "ab".repeat(32));
        assert_eq!(validate_private_key(&key).unwrap().expose(), "ab".repeat(32));
        assert!(matches!(
            validate_private_key("0x1234"),
            Err(SecretError::InvalidKeyLength { length: 4 })
        ));
    }
}

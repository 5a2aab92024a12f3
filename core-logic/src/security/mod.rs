pub mod secret;

use crate::error::SecretError;
use aes_gcm::{
    aead::{Aead, NewAead}, // NewAead for 0.9/0.4
    Aes256Gcm,
    Nonce,
};
use rand::RngCore;

const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;
const SALT_LEN: usize = 16;

/// Hex-encoded pieces of an encrypted keystore payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedComponents {
    pub ciphertext: String,
    pub iv: String,
    pub salt: String,
    pub tag: String,
}

pub struct SecurityUtils;

impl SecurityUtils {
    pub fn decrypt_components(
        ciphertext_hex: &str,
        iv_hex: &str,
        salt_hex: &str,
        tag_hex: &str,
        password: &str,
    ) -> Result<String, SecretError> {
        let ciphertext = decode_hex(ciphertext_hex, "ciphertext")?;
        let iv = decode_hex(iv_hex, "iv")?;
        let salt = decode_hex(salt_hex, "salt")?;
        let mut tag = decode_hex(tag_hex, "tag")?;

        if iv.len() != IV_LEN {
            return Err(SecretError::CryptographyFailed {
                reason: format!("IV must be {} bytes, got {}", IV_LEN, iv.len()),
            });
        }

        let key = Self::derive_key(password, &salt)?;
        let cipher = Aes256Gcm::new(&key.into());
        let nonce = Nonce::from_slice(&iv);

        let mut full_payload = ciphertext;
        full_payload.append(&mut tag);

        let plaintext = cipher
            .decrypt(nonce, full_payload.as_ref())
            .map_err(|_| SecretError::CryptographyFailed {
                reason: "authentication failed (wrong password or corrupted file)".to_string(),
            })?;

        String::from_utf8(plaintext).map_err(|_| SecretError::CryptographyFailed {
            reason: "decrypted data is not valid UTF-8".to_string(),
        })
    }

    pub fn encrypt_components(
        plaintext: &str,
        password: &str,
    ) -> Result<EncryptedComponents, SecretError> {
        let mut rng = rand::thread_rng();
        let mut iv = [0u8; IV_LEN];
        let mut salt = [0u8; SALT_LEN];
        rng.fill_bytes(&mut iv);
        rng.fill_bytes(&mut salt);

        let key = Self::derive_key(password, &salt)?;
        let cipher = Aes256Gcm::new(&key.into());

        let mut sealed = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
            .map_err(|e| SecretError::CryptographyFailed {
                reason: format!("Encryption failed: {}", e),
            })?;
        // aes-gcm appends the tag to the ciphertext
        let tag = sealed.split_off(sealed.len() - TAG_LEN);

        Ok(EncryptedComponents {
            ciphertext: hex::encode(sealed),
            iv: hex::encode(iv),
            salt: hex::encode(salt),
            tag: hex::encode(tag),
        })
    }

    // scrypt N=16384 (log_n 14), r=8, p=1, 32-byte key
    fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; 32], SecretError> {
        let params =
            scrypt::Params::new(14, 8, 1, 32).map_err(|e| SecretError::CryptographyFailed {
                reason: format!("Invalid scrypt params: {}", e),
            })?;
        let mut key = [0u8; 32];
        scrypt::scrypt(password.as_bytes(), salt, &params, &mut key).map_err(|e| {
            SecretError::CryptographyFailed {
                reason: format!("Scrypt failed: {}", e),
            }
        })?;
        Ok(key)
    }
}

fn decode_hex(value: &str, field: &str) -> Result<Vec<u8>, SecretError> {
    hex::decode(value).map_err(|_| SecretError::CryptographyFailed {
        reason: format!("Invalid {} hex", field),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_then_decrypt() {
        let parts = SecurityUtils::encrypt_components("{\"evm_private_key\":\"ab\"}", "hunter2")
            .unwrap();
        let plain = SecurityUtils::decrypt_components(
            &parts.ciphertext,
            &parts.iv,
            &parts.salt,
            &parts.tag,
            "hunter2",
        )
        .unwrap();
        assert_eq!(plain, "{\"evm_private_key\":\"ab\"}");
    }

    #[test]
    fn test_wrong_password_fails() {
        let parts = SecurityUtils::encrypt_components("payload", "right").unwrap();
        let result = SecurityUtils::decrypt_components(
            &parts.ciphertext,
            &parts.iv,
            &parts.salt,
            &parts.tag,
            "wrong",
        );
        assert!(matches!(
            result,
            Err(SecretError::CryptographyFailed { .. })
        ));
    }

    #[test]
    fn test_bad_iv_length_does_not_panic() {
        let result = SecurityUtils::decrypt_components("00", "0011", "00", "00", "pw");
        assert!(result.is_err());
    }
}

use crate::error::SecretError;
use crate::security::secret::{validate_private_key, Secret, SecretRef};
use crate::security::SecurityUtils;
use dialoguer::{theme::ColorfulTheme, Password};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

pub const PASSWORD_ENV: &str = "WALLET_PASSWORD";

#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct DecryptedWallet {
    #[serde(default)]
    pub mnemonic: String,
    #[serde(default)]
    pub evm_private_key: String,
    #[serde(default)]
    pub evm_address: String,
}

impl fmt::Debug for DecryptedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptedWallet")
            .field("evm_address", &self.evm_address)
            .field("mnemonic", &"***REDACTED***")
            .field("evm_private_key", &"***REDACTED***")
            .finish()
    }
}

/// Asks for the keystore password. Runs on the blocking thread pool.
pub type PasswordPrompt = Arc<dyn Fn() -> Result<String, SecretError> + Send + Sync>;

/// Resolves [`SecretRef`]s to values. Keystores are decrypted at most once
/// per process and the password is asked for at most once.
pub struct WalletManager {
    password: Mutex<Option<Zeroizing<String>>>,
    prompt: Option<PasswordPrompt>,
    cache: Mutex<HashMap<PathBuf, Arc<DecryptedWallet>>>,
}

impl WalletManager {
    /// Password from `WALLET_PASSWORD`, falling back to a prompt when
    /// attached to a terminal.
    pub fn new() -> Self {
        let password = std::env::var(PASSWORD_ENV).ok().map(Zeroizing::new);
        let prompt: Option<PasswordPrompt> = if std::io::stdin().is_terminal() {
            Some(Arc::new(prompt_password))
        } else {
            None
        };
        Self {
            password: Mutex::new(password),
            prompt,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Fixed password, never prompts.
    pub fn with_password(password: Option<&str>) -> Self {
        Self {
            password: Mutex::new(password.map(|p| Zeroizing::new(p.to_string()))),
            prompt: None,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// No preset password; `prompt` is asked once, on first use.
    pub fn with_prompt<F>(prompt: F) -> Self
    where
        F: Fn() -> Result<String, SecretError> + Send + Sync + 'static,
    {
        Self {
            password: Mutex::new(None),
            prompt: Some(Arc::new(prompt)),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn resolve(&self, secret: &SecretRef) -> Result<Secret, SecretError> {
        match secret {
            SecretRef::Env(name) => std::env::var(name)
                .map(Secret::new)
                .map_err(|_| SecretError::MissingEnv { name: name.clone() }),
            SecretRef::File(path) => read_secret_file(path),
            SecretRef::Keystore(path) => {
                let wallet = self.keystore(path).await?;
                Ok(Secret::new(wallet.evm_private_key.clone()))
            }
        }
    }

    /// Resolve one account reference to a validated private key.
    pub async fn private_key(&self, account: &SecretRef) -> Result<Secret, SecretError> {
        let raw = self.resolve(account).await?;
        validate_private_key(raw.expose())
    }

    /// The deploying account is the first configured one. Later accounts
    /// are never resolved.
    pub async fn deployer_key(&self, accounts: &[SecretRef]) -> Result<Secret, SecretError> {
        let first = accounts.first().ok_or(SecretError::NoAccounts)?;
        self.private_key(first).await
    }

    async fn keystore(&self, path: &Path) -> Result<Arc<DecryptedWallet>, SecretError> {
        {
            let cache = self.cache.lock().await;
            if let Some(wallet) = cache.get(path) {
                return Ok(Arc::clone(wallet));
            }
        }

        let password = self.password().await?;
        debug!("Decrypting keystore {:?}", path);
        let wallet = Arc::new(decrypt_keystore(path, password.as_str())?);

        self.cache
            .lock()
            .await
            .insert(path.to_path_buf(), Arc::clone(&wallet));

        Ok(wallet)
    }

    async fn password(&self) -> Result<Zeroizing<String>, SecretError> {
        let mut slot = self.password.lock().await;
        if let Some(password) = slot.as_ref() {
            return Ok(password.clone());
        }

        let Some(prompt) = self.prompt.clone() else {
            return Err(SecretError::PasswordRequired);
        };

        let input = tokio::task::spawn_blocking(move || prompt())
            .await
            .map_err(|_| SecretError::PasswordRequired)??;
        let password = Zeroizing::new(input);
        *slot = Some(password.clone());
        Ok(password)
    }
}

impl Default for WalletManager {
    fn default() -> Self {
        Self::new()
    }
}

fn prompt_password() -> Result<String, SecretError> {
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Enter wallet password")
        .interact()
        .map_err(|_| SecretError::PasswordRequired)
}

fn read_secret_file(path: &Path) -> Result<Secret, SecretError> {
    let display = path.display().to_string();
    let content = Zeroizing::new(fs::read_to_string(path).map_err(|e| {
        SecretError::DecryptionFailed {
            path: display.clone(),
            reason: e.to_string(),
        }
    })?);

    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Secret::new)
        .ok_or(SecretError::EmptyFile { path: display })
}

pub fn decrypt_keystore(path: &Path, password: &str) -> Result<DecryptedWallet, SecretError> {
    let display = path.display().to_string();
    let failed = |reason: String| SecretError::DecryptionFailed {
        path: display.clone(),
        reason,
    };

    let content = fs::read_to_string(path).map_err(|e| failed(e.to_string()))?;
    let json: Value = serde_json::from_str(&content).map_err(|e| failed(e.to_string()))?;

    let block = json
        .get("encrypted")
        .filter(|v| v.is_object())
        .ok_or_else(|| failed("missing 'encrypted' object".to_string()))?;
    let field = |name: &str| block.get(name).and_then(|v| v.as_str()).unwrap_or("");

    let decrypted = Zeroizing::new(
        SecurityUtils::decrypt_components(
            field("ciphertext"),
            field("iv"),
            field("salt"),
            field("tag"),
            password,
        )
        .map_err(|e| failed(e.to_string()))?,
    );

    serde_json::from_str(&decrypted).map_err(|e| failed(e.to_string()))
}

/// Encrypt a private key into the keystore JSON layout read by
/// [`decrypt_keystore`].
pub fn encrypt_keystore(
    private_key: &Secret,
    address: &str,
    password: &str,
) -> Result<Value, SecretError> {
    let key = validate_private_key(private_key.expose())?;
    let payload = Zeroizing::new(
        json!({
            "evm_private_key": key.expose(),
            "evm_address": address,
        })
        .to_string(),
    );
    let parts = SecurityUtils::encrypt_components(&payload, password)?;

    Ok(json!({
        "address": address,
        "encrypted": {
            "ciphertext": parts.ciphertext,
            "iv": parts.iv,
            "salt": parts.salt,
            "tag": parts.tag,
        }
    }))
}

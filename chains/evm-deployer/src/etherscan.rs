//! Source verification against the Etherscan API.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use core_logic::{with_retry, NetworkError, RetryConfig, Secret};
use ethers::types::Address;
use ethers::utils::to_checksum;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

pub const CODE_FORMAT: &str = "solidity-standard-json-input";

/// Status polling: Etherscan usually needs a few seconds per queue slot.
pub const STATUS_RETRY: RetryConfig = RetryConfig {
    max_retries: 8,
    base_delay_ms: 5_000,
    max_delay_ms: 5_000,
    exponential_base: 1.0,
    jitter: false,
};

pub fn api_url_for_chain(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("https://api.etherscan.io/api"),
        4 => Some("https://api-rinkeby.etherscan.io/api"),
        5 => Some("https://api-goerli.etherscan.io/api"),
        11155111 => Some("https://api-sepolia.etherscan.io/api"),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct VerifyRequest {
    pub address: Address,
    /// Standard JSON input, serialized.
    pub source: String,
    /// `path/File.sol:Name`
    pub contract_name: String,
    /// `v0.8.0+commit.c7dfd78e`
    pub compiler_version: String,
    /// ABI-encoded constructor arguments, hex without prefix.
    pub constructor_args: String,
}

impl VerifyRequest {
    pub fn new(
        address: Address,
        standard_json: &Value,
        contract_name: String,
        solc_long_version: &str,
        constructor_args: String,
    ) -> Result<Self> {
        Ok(Self {
            address,
            source: serde_json::to_string(standard_json)?,
            contract_name,
            compiler_version: format!("v{}", solc_long_version.trim_start_matches('v')),
            constructor_args,
        })
    }

    fn form(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("apikey", api_key.to_string()),
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("contractaddress", to_checksum(&self.address, None)),
            ("sourceCode", self.source.clone()),
            ("codeformat", CODE_FORMAT.to_string()),
            ("contractname", self.contract_name.clone()),
            ("compilerversion", self.compiler_version.clone()),
            // sic: the API spells it this way
            ("constructorArguements", self.constructor_args.clone()),
        ]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EtherscanResponse {
    pub status: String,
    pub message: String,
    pub result: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Queued { guid: String },
    AlreadyVerified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyStatus {
    Pending,
    Verified,
    AlreadyVerified,
    Failed(String),
}

impl EtherscanResponse {
    pub fn submission(self) -> Result<Submission> {
        if self.status == "1" {
            return Ok(Submission::Queued { guid: self.result });
        }
        if is_already_verified(&self.result) {
            return Ok(Submission::AlreadyVerified);
        }
        bail!(
            "Verification submission rejected: {} ({})",
            self.result,
            self.message
        )
    }

    pub fn status(&self) -> VerifyStatus {
        let result = self.result.as_str();
        if result == "Pending in queue" {
            VerifyStatus::Pending
        } else if result == "Pass - Verified" {
            VerifyStatus::Verified
        } else if is_already_verified(result) {
            VerifyStatus::AlreadyVerified
        } else {
            VerifyStatus::Failed(result.to_string())
        }
    }
}

fn is_already_verified(result: &str) -> bool {
    result.to_lowercase().contains("already verified")
}

/// The two calls verification needs. [`EtherscanClient`] is the HTTP
/// implementation.
#[async_trait]
pub trait VerificationApi: Send + Sync {
    async fn submit(&self, request: &VerifyRequest) -> Result<Submission>;

    async fn check_status(&self, guid: &str) -> Result<VerifyStatus>;

    /// Submit and poll until a final status. Already verified counts as
    /// success; a failed verification is an error.
    async fn verify(&self, request: &VerifyRequest, retry: RetryConfig) -> Result<VerifyStatus> {
        let guid = match self.submit(request).await? {
            Submission::AlreadyVerified => return Ok(VerifyStatus::AlreadyVerified),
            Submission::Queued { guid } => guid,
        };

        let guid = guid.as_str();
        let status = with_retry(retry, "checkverifystatus", || async move {
            match self.check_status(guid).await? {
                VerifyStatus::Pending => Err(anyhow!("Pending in queue")),
                other => Ok(other),
            }
        })
        .await?;

        match status {
            VerifyStatus::Failed(reason) => bail!("Verification failed: {}", reason),
            other => Ok(other),
        }
    }
}

pub struct EtherscanClient {
    http: Client,
    api_url: String,
    api_key: Secret,
}

impl EtherscanClient {
    pub fn new(api_url: impl Into<String>, api_key: Secret) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url.into(),
            api_key,
        }
    }

    async fn parse(&self, response: reqwest::Response) -> Result<EtherscanResponse> {
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::HttpError {
                status_code: status.as_u16(),
                endpoint: self.api_url.clone(),
            }
            .into());
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            NetworkError::InvalidResponse {
                endpoint: self.api_url.clone(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl VerificationApi for EtherscanClient {
    async fn submit(&self, request: &VerifyRequest) -> Result<Submission> {
        info!(
            "Submitting verification for [{}] {:?}",
            request.contract_name, request.address
        );
        let response = self
            .http
            .post(&self.api_url)
            .form(&request.form(self.api_key.expose()))
            .send()
            .await
            .context("Failed to reach Etherscan")?;
        self.parse(response).await?.submission()
    }

    async fn check_status(&self, guid: &str) -> Result<VerifyStatus> {
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("apikey", self.api_key.expose()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await
            .context("Failed to reach Etherscan")?;
        let status = self.parse(response).await?.status();
        debug!("Verification {} status: {:?}", guid, status);
        Ok(status)
    }
}

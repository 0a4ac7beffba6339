//! External minting relayer.
//!
//! The chain side of bike registration lives behind a hosted relayer with a
//! narrow contract: it takes a recipient wallet plus bike metadata and
//! returns a transaction hash. It may fail transiently; callers must not
//! persist anything before the relayer call has succeeded.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    pub to: String,
    pub name: String,
    pub serial_number: String,
    pub image_uri: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MintReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub tx_url: String,
}

#[async_trait]
pub trait Relayer: Send + Sync {
    async fn mint(&self, request: MintRequest) -> Result<MintReceipt, AuthError>;
}

/// Production relayer over HTTP.
pub struct HttpRelayer {
    http: reqwest::Client,
    url: String,
    api_key: String,
    tx_base_url: String,
}

impl HttpRelayer {
    pub fn new(url: String, api_key: String, tx_base_url: String) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AuthError::Internal(format!("relayer client build failed: {}", e)))?;
        Ok(Self {
            http,
            url,
            api_key,
            tx_base_url,
        })
    }
}

#[async_trait]
impl Relayer for HttpRelayer {
    async fn mint(&self, request: MintRequest) -> Result<MintReceipt, AuthError> {
        let response = self
            .http
            .post(&self.url)
            .header("X-Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AuthError::Internal(format!("relayer request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AuthError::Internal(format!(
                "relayer returned status {}",
                response.status()
            )));
        }

        let mut receipt: MintReceipt = response
            .json()
            .await
            .map_err(|e| AuthError::Internal(format!("relayer response malformed: {}", e)))?;
        receipt.tx_url = format!("{}{}", self.tx_base_url, receipt.transaction_hash);
        Ok(receipt)
    }
}

/// Stand-in for deployments without a relayer, and for tests. Returns a
/// deterministic pseudo-hash of the request.
pub struct NoopRelayer;

#[async_trait]
impl Relayer for NoopRelayer {
    async fn mint(&self, request: MintRequest) -> Result<MintReceipt, AuthError> {
        let mut hasher = Sha256::new();
        hasher.update(request.to.as_bytes());
        hasher.update(request.name.as_bytes());
        hasher.update(request.serial_number.as_bytes());
        hasher.update(request.image_uri.as_bytes());
        let hash = format!("0x{}", hex::encode(hasher.finalize()));

        Ok(MintReceipt {
            tx_url: hash.clone(),
            transaction_hash: hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_relayer_is_deterministic() {
        let relayer = NoopRelayer;
        let request = MintRequest {
            to: "0xabc".to_string(),
            name: "City bike".to_string(),
            serial_number: "SN-001".to_string(),
            image_uri: "https://example.com/bike.png".to_string(),
        };
        let a = relayer.mint(request.clone()).await.unwrap();
        let b = relayer.mint(request).await.unwrap();
        assert_eq!(a.transaction_hash, b.transaction_hash);
        assert!(a.transaction_hash.starts_with("0x"));
    }

    #[test]
    fn test_mint_request_wire_format() {
        let request = MintRequest {
            to: "0xabc".to_string(),
            name: "City bike".to_string(),
            serial_number: "SN-001".to_string(),
            image_uri: "ipfs://img".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["serialNumber"], "SN-001");
        assert_eq!(json["imageUri"], "ipfs://img");
    }
}

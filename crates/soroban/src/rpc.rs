use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::TransportError;

/// An entry as returned by `getLedgerEntries`, still XDR encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLedgerEntry {
    /// Base64 `LedgerKey`
    pub key: String,
    /// Base64 `LedgerEntryData`
    pub xdr: String,
    #[serde(rename = "lastModifiedLedgerSeq")]
    pub last_modified_ledger: u32,
    #[serde(rename = "liveUntilLedgerSeq", default)]
    pub live_until_ledger: Option<u32>,
}

/// Ledger read service.
///
/// Returns only entries that exist, in any order, from a single ledger
/// snapshot.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn get_ledger_entries(
        &self,
        keys: &[String],
    ) -> Result<Vec<RawLedgerEntry>, TransportError>;
}

#[derive(Debug, Deserialize)]
struct LedgerEntriesResult {
    #[serde(default)]
    entries: Option<Vec<RawLedgerEntry>>,
    #[serde(rename = "latestLedger")]
    latest_ledger: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: u32,
    #[serde(rename = "oldestLedger")]
    pub oldest_ledger: u32,
    #[serde(rename = "ledgerRetentionWindow")]
    pub ledger_retention_window: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestLedgerResponse {
    pub id: String,
    #[serde(rename = "protocolVersion")]
    pub protocol_version: u32,
    pub sequence: u32,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

/// Soroban JSON-RPC client.
#[derive(Debug, Clone)]
pub struct RpcClient {
    url: String,
    http: reqwest::Client,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(url, Duration::from_secs(30))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, TransportError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json::<RpcResponse<R>>()
            .await?;

        if let Some(error) = response.error {
            return Err(TransportError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        response.result.ok_or_else(|| {
            TransportError::InvalidResponse(format!("{} returned no result", method))
        })
    }

    pub async fn get_health(&self) -> Result<HealthResponse, TransportError> {
        self.call("getHealth", json!({})).await
    }

    pub async fn get_latest_ledger(&self) -> Result<LatestLedgerResponse, TransportError> {
        self.call("getLatestLedger", json!({})).await
    }
}

#[async_trait]
impl LedgerReader for RpcClient {
    async fn get_ledger_entries(
        &self,
        keys: &[String],
    ) -> Result<Vec<RawLedgerEntry>, TransportError> {
        let result: LedgerEntriesResult = self
            .call("getLedgerEntries", json!({ "keys": keys }))
            .await?;
        let entries = result.entries.unwrap_or_default();
        debug!(
            "getLedgerEntries returned {} of {} entries at ledger {}",
            entries.len(),
            keys.len(),
            result.latest_ledger
        );
        Ok(entries)
    }
}

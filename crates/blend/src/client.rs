use std::time::Duration;

use chrono::{DateTime, Utc};
use soroban::{LedgerReader, Result, RpcClient};

use crate::backstop::{
    self, BackstopConfig, BackstopPoolBalance, BackstopPoolUser, BackstopToken,
};

/// Entry point for Blend protocol reads.
///
/// Every call is an independent read against the ledger; nothing is cached
/// between calls.
#[derive(Debug, Clone)]
pub struct BlendClient<R: LedgerReader = RpcClient> {
    reader: R,
}

impl BlendClient<RpcClient> {
    pub fn new(rpc_url: impl Into<String>) -> Result<Self> {
        Ok(Self::with_reader(RpcClient::new(rpc_url)?))
    }

    pub fn with_timeout(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self::with_reader(RpcClient::with_timeout(rpc_url, timeout)?))
    }
}

impl<R: LedgerReader> BlendClient<R> {
    pub fn with_reader(reader: R) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    // Backstop

    /// Backstop token addresses, emitter, pool factory and reward zone.
    pub async fn backstop_config(&self, backstop_id: &str) -> Result<BackstopConfig> {
        backstop::load_config(&self.reader, backstop_id).await
    }

    /// Backstop LP token makeup and price.
    pub async fn backstop_token(
        &self,
        comet_id: &str,
        blnd_id: &str,
        usdc_id: &str,
    ) -> Result<BackstopToken> {
        backstop::load_token(&self.reader, comet_id, blnd_id, usdc_id).await
    }

    pub async fn backstop_pool_balance(
        &self,
        backstop_id: &str,
        pool_id: &str,
    ) -> Result<BackstopPoolBalance> {
        backstop::load_pool_balance(&self.reader, backstop_id, pool_id).await
    }

    /// A user's backstop position in a pool, with queued withdrawals split
    /// at `now`.
    pub async fn backstop_pool_user(
        &self,
        backstop_id: &str,
        pool_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<BackstopPoolUser> {
        backstop::load_pool_user(&self.reader, backstop_id, pool_id, user_id, now).await
    }
}

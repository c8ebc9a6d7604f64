use anyhow::{Result, anyhow};
use serde::Serialize;
use std::env;
use std::path::Path;

const MAINNET_RPC_URL: &str = "https://soroban-rpc.creit.tech";
const TESTNET_RPC_URL: &str = "https://soroban-testnet.stellar.org";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Testnet,
    Mainnet,
}

impl Network {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            _ => Err(anyhow!("Unknown network: {}. Please use 'testnet' or 'mainnet'.", s)),
        }
    }

    pub fn rpc_url(&self) -> &'static str {
        match self {
            Network::Testnet => TESTNET_RPC_URL,
            Network::Mainnet => MAINNET_RPC_URL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub network: Network,
    /// Overrides the network's default RPC endpoint.
    pub rpc_url: Option<String>,
    pub request_timeout_secs: u64,
    pub backstop_id: Option<String>,
    pub comet_id: Option<String>,
    pub blnd_id: Option<String>,
    pub usdc_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            rpc_url: None,
            request_timeout_secs: 30,
            backstop_id: None,
            comet_id: None,
            blnd_id: None,
            usdc_id: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        if Path::new(".env").exists() {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(network) = lookup("STELLAR_NETWORK") {
            config.network = Network::from_str(&network)?;
        }
        if let Some(url) = lookup("SOROBAN_RPC_URL") {
            config.rpc_url = Some(url);
        }
        if let Some(timeout) = lookup("RPC_TIMEOUT_SECS") {
            config.request_timeout_secs = timeout.parse()?;
        }
        config.backstop_id = lookup("BACKSTOP_ID");
        config.comet_id = lookup("COMET_ID");
        config.blnd_id = lookup("BLND_ID");
        config.usdc_id = lookup("USDC_ID");

        Ok(config)
    }

    pub fn rpc_url(&self) -> &str {
        self.rpc_url.as_deref().unwrap_or(self.network.rpc_url())
    }
}

mod config;

use std::time::Duration;

use anyhow::{Context, Result};
use blend::BlendClient;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Config, Network};

#[derive(Parser)]
#[command(name = "blend")]
#[command(
    about = "Blend backstop reader - Query backstop state from Soroban RPC",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "STELLAR_NETWORK")]
    network: Option<String>,

    #[arg(long, env = "SOROBAN_RPC_URL")]
    rpc_url: Option<String>,

    /// RPC request timeout in seconds
    #[arg(long, env = "RPC_TIMEOUT_SECS")]
    timeout: Option<u64>,

    #[arg(long, env = "BACKSTOP_ID")]
    backstop: Option<String>,

    #[arg(long, env = "COMET_ID")]
    comet: Option<String>,

    #[arg(long, env = "BLND_ID")]
    blnd: Option<String>,

    #[arg(long, env = "USDC_ID")]
    usdc: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show backstop configuration and reward zone
    Config,

    /// Show backstop LP token makeup and price
    Token,

    /// Show a pool's backstop balance
    PoolBalance {
        #[arg(long)]
        pool: String,
    },

    /// Show a user's backstop position in a pool
    PoolUser {
        #[arg(long)]
        pool: String,

        /// G... account or C... contract
        #[arg(long)]
        user: String,

        /// Evaluate queued withdrawals at this RFC 3339 time instead of now
        #[arg(long, value_parser = parse_time)]
        at: Option<DateTime<Utc>>,
    },

    /// Show RPC node health and latest ledger
    Status,
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 time: {}", e))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load config from environment
    let mut config = Config::from_env()?;

    // Override with CLI arguments
    if let Some(network) = cli.network {
        config.network = Network::from_str(&network)?;
    }
    if let Some(url) = cli.rpc_url {
        config.rpc_url = Some(url);
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout_secs = timeout;
    }
    config.backstop_id = cli.backstop.or(config.backstop_id);
    config.comet_id = cli.comet.or(config.comet_id);
    config.blnd_id = cli.blnd.or(config.blnd_id);
    config.usdc_id = cli.usdc.or(config.usdc_id);

    info!("Using {} RPC at {}", config.network.as_str(), config.rpc_url());
    let client = BlendClient::with_timeout(
        config.rpc_url(),
        Duration::from_secs(config.request_timeout_secs),
    )?;

    match cli.command {
        Commands::Config => {
            let backstop = required(&config.backstop_id, "BACKSTOP_ID")?;
            print_json(&client.backstop_config(backstop).await?)?;
        }
        Commands::Token => {
            let comet = required(&config.comet_id, "COMET_ID")?;
            let blnd = required(&config.blnd_id, "BLND_ID")?;
            let usdc = required(&config.usdc_id, "USDC_ID")?;
            print_json(&client.backstop_token(comet, blnd, usdc).await?)?;
        }
        Commands::PoolBalance { pool } => {
            let backstop = required(&config.backstop_id, "BACKSTOP_ID")?;
            print_json(&client.backstop_pool_balance(backstop, &pool).await?)?;
        }
        Commands::PoolUser { pool, user, at } => {
            let backstop = required(&config.backstop_id, "BACKSTOP_ID")?;
            let now = at.unwrap_or_else(Utc::now);
            print_json(&client.backstop_pool_user(backstop, &pool, &user, now).await?)?;
        }
        Commands::Status => show_status(&client, &config).await?,
    }

    Ok(())
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .with_context(|| format!("{} is not set (use the flag or the environment variable)", name))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn show_status(client: &BlendClient, config: &Config) -> Result<()> {
    let rpc = client.reader();
    let health = rpc.get_health().await?;
    let latest = rpc.get_latest_ledger().await?;
    print_json(&json!({
        "network": config.network,
        "rpc_url": rpc.url(),
        "health": health,
        "latest_ledger": latest,
    }))
}

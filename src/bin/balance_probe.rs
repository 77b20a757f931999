//! Operational probe: fetch one account balance through the configured
//! endpoint pool.
//!
//! Usage: `balance_probe <base58-address>` with `RPC_ENDPOINTS` (and
//! optionally the other engine knobs) in the environment or a `.env` file.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use solana_transfer_engine::app::BalanceQueryService;
use solana_transfer_engine::config::EngineConfig;
use solana_transfer_engine::domain::StaticPriceFeed;
use solana_transfer_engine::infra::EndpointPool;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let address = env::args()
        .nth(1)
        .context("usage: balance_probe <base58-address>")?;

    let config = EngineConfig::from_env().context("loading engine configuration")?;
    info!(endpoints = config.endpoints.len(), "Engine configured");

    let price = match env::var("SOL_USD_PRICE") {
        Ok(raw) => raw
            .parse::<f64>()
            .context("SOL_USD_PRICE must be a number")?,
        Err(_) => 0.0,
    };

    let pool = Arc::new(EndpointPool::new(&config)?);
    let service = BalanceQueryService::new(pool, Arc::new(StaticPriceFeed::new(price)));

    let balance = service.get_balance(&address).await?;

    println!("address:  {}", balance.address);
    println!("lamports: {}", balance.lamports);
    println!("SOL:      {}", balance.sol_balance);
    if price > 0.0 {
        println!("value:    {:.2}", balance.display_value);
    }

    Ok(())
}

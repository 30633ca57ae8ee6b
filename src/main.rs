//! pairlab - Statistical Arbitrage Pair Analytics
//!
//! Pair screening, mean-reversion estimation and threshold backtests from
//! the command line.

use anyhow::Result;

use pairlab::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (PAIRLAB_PRICES_FILE, RUST_LOG)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}

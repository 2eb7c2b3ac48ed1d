//! Catalyst Pipeline - news-catalyst driven equity trading.

use anyhow::Result;

use catalyst_pipeline::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}

//! Market data port: bar history and last-trade quotes.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::bar::{Bar, Quote};

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("REST API error: {0}")]
    RestError(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),

    /// Recoverable: the caller substitutes neutral defaults.
    #[error("No data available for {0}")]
    Unavailable(String),

    #[error("Request timed out: {0}")]
    Timeout(String),
}

#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Most recent bars for a symbol, oldest first, at most `limit`.
    async fn recent_bars(&self, symbol: &str, limit: usize) -> Result<Vec<Bar>, MarketDataError>;

    /// Last traded price.
    async fn last_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;

    /// Cheap liveness probe for the health monitor.
    async fn health_check(&self) -> Result<(), MarketDataError>;
}

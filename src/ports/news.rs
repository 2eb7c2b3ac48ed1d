//! News feed port: recent headlines per symbol.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::news::NewsItem;

#[derive(Error, Debug)]
pub enum NewsFeedError {
    #[error("REST API error: {0}")]
    RestError(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("Request timed out: {0}")]
    Timeout(String),
}

#[async_trait]
pub trait NewsFeedPort: Send + Sync {
    /// Headlines for `symbol` published within the last `window_hours`.
    /// An empty result is normal and not an error.
    async fn recent_news(&self, symbol: &str, window_hours: i64) -> Result<Vec<NewsItem>, NewsFeedError>;

    async fn health_check(&self) -> Result<(), NewsFeedError>;
}

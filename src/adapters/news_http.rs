//! REST news-feed client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::domain::bar::MarketSession;
use crate::domain::news::NewsItem;
use crate::ports::news::{NewsFeedError, NewsFeedPort};

#[derive(Debug, Clone)]
pub struct NewsHttpConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Exchange offset from UTC, used to stamp each item's session.
    pub utc_offset_hours: i64,
}

impl Default for NewsHttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8802".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            utc_offset_hours: -4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewsHttpClient {
    config: NewsHttpConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    items: Vec<WireItem>,
}

#[derive(Debug, Deserialize)]
struct WireItem {
    headline: String,
    source: String,
    published_at: DateTime<Utc>,
    #[serde(default)]
    breaking: bool,
}

impl NewsHttpClient {
    pub fn new(config: NewsHttpConfig) -> Result<Self, NewsFeedError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NewsFeedError::RestError(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response, NewsFeedError> {
        let mut req = self.http.get(url).query(query);
        if let Some(ref key) = self.config.api_key {
            req = req.header("x-api-key", key);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                NewsFeedError::Timeout(url.to_string())
            } else {
                NewsFeedError::RestError(e.to_string())
            }
        })?;

        match response.status() {
            s if !s.is_success() && s != StatusCode::NOT_FOUND => {
                let body = response.text().await.unwrap_or_default();
                Err(NewsFeedError::RestError(format!("HTTP {}: {}", s, body)))
            }
            _ => Ok(response),
        }
    }
}

#[async_trait]
impl NewsFeedPort for NewsHttpClient {
    async fn recent_news(&self, symbol: &str, window_hours: i64) -> Result<Vec<NewsItem>, NewsFeedError> {
        let url = format!("{}/news", self.config.base_url);
        let response = self
            .get(&url, &[("symbol", symbol.to_string()), ("hours", window_hours.to_string())])
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let parsed: NewsResponse = response
            .json()
            .await
            .map_err(|e| NewsFeedError::ParseError(e.to_string()))?;

        Ok(parsed
            .items
            .into_iter()
            .map(|item| NewsItem {
                symbol: symbol.to_string(),
                session: MarketSession::at(item.published_at, self.config.utc_offset_hours),
                headline: item.headline,
                source: item.source,
                published_at: item.published_at,
                is_breaking: item.breaking,
            })
            .collect())
    }

    async fn health_check(&self) -> Result<(), NewsFeedError> {
        let url = format!("{}/health", self.config.base_url);
        self.get(&url, &[]).await?;
        Ok(())
    }
}

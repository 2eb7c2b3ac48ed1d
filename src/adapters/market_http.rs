//! REST market-data client.
//!
//! Thin wrapper over a bars/quotes HTTP API. Bounded timeout on every
//! call; quote retries are the caller's decision (quotes are idempotent,
//! the monitor loop retries once).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::domain::bar::{Bar, Quote};
use crate::ports::market_data::{MarketDataError, MarketDataPort};

#[derive(Debug, Clone)]
pub struct MarketDataHttpConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for MarketDataHttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8801".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarketDataHttpClient {
    config: MarketDataHttpConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct BarsResponse {
    bars: Vec<WireBar>,
}

#[derive(Debug, Deserialize)]
struct WireBar {
    t: DateTime<Utc>,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    symbol: String,
    price: f64,
    timestamp: DateTime<Utc>,
}

impl MarketDataHttpClient {
    pub fn new(config: MarketDataHttpConfig) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MarketDataError::RestError(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.get(url);
        if let Some(ref key) = self.config.api_key {
            req = req.header("x-api-key", key);
        }
        req
    }

    async fn send(&self, req: reqwest::RequestBuilder, symbol: &str) -> Result<reqwest::Response, MarketDataError> {
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout(symbol.to_string())
            } else {
                MarketDataError::RestError(e.to_string())
            }
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(MarketDataError::Unavailable(symbol.to_string())),
            s if !s.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(MarketDataError::RestError(format!("HTTP {}: {}", s, body)))
            }
            _ => Ok(response),
        }
    }
}

#[async_trait]
impl MarketDataPort for MarketDataHttpClient {
    async fn recent_bars(&self, symbol: &str, limit: usize) -> Result<Vec<Bar>, MarketDataError> {
        let url = format!("{}/bars/{}", self.config.base_url, symbol);
        let req = self.request(&url).query(&[("limit", limit.to_string())]);

        let response = self.send(req, symbol).await?;
        let parsed: BarsResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::ParseError(e.to_string()))?;

        Ok(parsed
            .bars
            .into_iter()
            .map(|b| Bar {
                timestamp: b.t,
                open: b.o,
                high: b.h,
                low: b.l,
                close: b.c,
                volume: b.v,
            })
            .collect())
    }

    async fn last_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let url = format!("{}/quotes/{}", self.config.base_url, symbol);
        let response = self.send(self.request(&url), symbol).await?;
        let parsed: QuoteResponse = response
            .json()
            .await
            .map_err(|e| MarketDataError::ParseError(e.to_string()))?;

        Ok(Quote {
            symbol: parsed.symbol,
            price: parsed.price,
            timestamp: parsed.timestamp,
        })
    }

    async fn health_check(&self) -> Result<(), MarketDataError> {
        let url = format!("{}/health", self.config.base_url);
        self.send(self.request(&url), "health").await?;
        Ok(())
    }
}

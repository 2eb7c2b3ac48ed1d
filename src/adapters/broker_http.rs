//! REST broker client.
//!
//! Order submission is a single attempt by contract: a timed-out submit
//! is ambiguous (the order may have been accepted) and must surface as an
//! error rather than be retried here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::ports::broker::{AccountSnapshot, BrokerError, BrokerPort, OrderAck, OrderRequest};

#[derive(Debug, Clone)]
pub struct BrokerHttpConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for BrokerHttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8803".to_string(),
            api_key: None,
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrokerHttpClient {
    config: BrokerHttpConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct WireAccount {
    equity: f64,
    buying_power: f64,
}

impl BrokerHttpClient {
    pub fn new(config: BrokerHttpConfig) -> Result<Self, BrokerError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BrokerError::RestError(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key {
            Some(ref key) => req.header("x-api-key", key),
            None => req,
        }
    }

    fn map_send_error(e: reqwest::Error, context: &str) -> BrokerError {
        if e.is_timeout() {
            BrokerError::Timeout(context.to_string())
        } else {
            BrokerError::RestError(e.to_string())
        }
    }
}

#[async_trait]
impl BrokerPort for BrokerHttpClient {
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderAck, BrokerError> {
        let url = format!("{}/orders", self.config.base_url);
        let response = self
            .with_auth(self.http.post(&url).json(request))
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, &request.symbol))?;

        match response.status() {
            StatusCode::UNPROCESSABLE_ENTITY | StatusCode::FORBIDDEN => {
                let body = response.text().await.unwrap_or_default();
                Err(BrokerError::Rejected(body))
            }
            s if !s.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(BrokerError::RestError(format!("HTTP {}: {}", s, body)))
            }
            _ => response
                .json()
                .await
                .map_err(|e| BrokerError::RestError(format!("malformed ack: {}", e))),
        }
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), BrokerError> {
        let url = format!("{}/orders/{}", self.config.base_url, order_id);
        let response = self
            .with_auth(self.http.delete(&url))
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, order_id))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(BrokerError::UnknownOrder(order_id.to_string())),
            s if !s.is_success() => Err(BrokerError::RestError(format!("HTTP {}", s))),
            _ => Ok(()),
        }
    }

    async fn order_status(&self, order_id: &str) -> Result<OrderAck, BrokerError> {
        let url = format!("{}/orders/{}", self.config.base_url, order_id);
        let response = self
            .with_auth(self.http.get(&url))
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, order_id))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(BrokerError::UnknownOrder(order_id.to_string())),
            s if !s.is_success() => Err(BrokerError::RestError(format!("HTTP {}", s))),
            _ => response
                .json()
                .await
                .map_err(|e| BrokerError::RestError(format!("malformed ack: {}", e))),
        }
    }

    async fn account(&self) -> Result<AccountSnapshot, BrokerError> {
        let url = format!("{}/account", self.config.base_url);
        let response = self
            .with_auth(self.http.get(&url))
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, "account"))?;

        if !response.status().is_success() {
            return Err(BrokerError::RestError(format!("HTTP {}", response.status())));
        }
        let account: WireAccount = response
            .json()
            .await
            .map_err(|e| BrokerError::RestError(format!("malformed account: {}", e)))?;
        Ok(AccountSnapshot {
            equity: account.equity,
            buying_power: account.buying_power,
        })
    }

    async fn health_check(&self) -> Result<(), BrokerError> {
        self.account().await.map(|_| ())
    }
}

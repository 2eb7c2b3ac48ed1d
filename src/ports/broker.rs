//! Broker port: order submission and account state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::position::Side;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Order rejected by broker: {0}")]
    Rejected(String),

    #[error("REST API error: {0}")]
    RestError(String),

    #[error("Unknown order: {0}")]
    UnknownOrder(String),

    #[error("Request timed out: {0}")]
    Timeout(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
}

/// Order to submit. Pre-market entries must be extended-hours limit
/// orders; regular-session entries go in as market orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub order_type: OrderType,
    pub limit_price: Option<f64>,
    pub extended_hours: bool,
}

impl OrderRequest {
    pub fn market(symbol: &str, side: Side, quantity: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            quantity,
            order_type: OrderType::Market,
            limit_price: None,
            extended_hours: false,
        }
    }

    pub fn extended_limit(symbol: &str, side: Side, quantity: f64, limit_price: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            quantity,
            order_type: OrderType::Limit,
            limit_price: Some(limit_price),
            extended_hours: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Accepted,
    Filled,
    Cancelled,
    Rejected,
}

/// Broker acknowledgement of a submitted order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub status: OrderStatus,
    pub filled_price: Option<f64>,
    pub submitted_at: DateTime<Utc>,
}

/// Account snapshot used for sizing and the daily loss limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub equity: f64,
    pub buying_power: f64,
}

#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// Submit an order. Never retried by callers: a timeout here is
    /// ambiguous and surfaces as an execution failure.
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderAck, BrokerError>;

    async fn cancel_order(&self, order_id: &str) -> Result<(), BrokerError>;

    async fn order_status(&self, order_id: &str) -> Result<OrderAck, BrokerError>;

    async fn account(&self) -> Result<AccountSnapshot, BrokerError>;

    async fn health_check(&self) -> Result<(), BrokerError>;
}

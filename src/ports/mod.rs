//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, these traits abstract:
//! - Market data feeds (bars, quotes)
//! - News feeds (headlines per symbol)
//! - Broker access (orders, account state)

pub mod broker;
pub mod market_data;
pub mod mocks;
pub mod news;

pub use broker::{AccountSnapshot, BrokerError, BrokerPort, OrderAck, OrderRequest, OrderStatus, OrderType};
pub use market_data::{MarketDataError, MarketDataPort};
pub use news::{NewsFeedError, NewsFeedPort};

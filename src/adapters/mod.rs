//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Market Data: REST bars/quotes client and a seeded simulation feed
//! - News: REST headline client and a canned simulation feed
//! - Broker: REST order client and an instant-fill paper broker
//! - CLI: Command-line interface handlers

pub mod broker_http;
pub mod cli;
pub mod market_http;
pub mod news_http;
pub mod sim;

pub use broker_http::{BrokerHttpClient, BrokerHttpConfig};
pub use cli::CliApp;
pub use market_http::{MarketDataHttpClient, MarketDataHttpConfig};
pub use news_http::{NewsHttpClient, NewsHttpConfig};
pub use sim::{PaperBroker, SimMarketData, SimNewsFeed};

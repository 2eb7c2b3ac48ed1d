//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    load_config, BrokerSection, Config, ConfigError, MarketDataSection, NewsSection, RiskSection,
    ScannerSection, ScheduleSection, SignalsSection, StorageSection,
};

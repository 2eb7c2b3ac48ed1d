//! Catalyst Pipeline - news-catalyst driven equity trading library.
//!
//! Headlines are scored into per-symbol catalyst summaries, aligned with
//! candlestick patterns and technical indicators, blended into priced
//! signals and executed through a risk-gated engine on a session-aware
//! schedule.
//!
//! # Modules
//!
//! - `domain`: Core types (Bar, NewsItem, Signal, Trade, Cycle, RiskLimits)
//! - `ports`: Trait abstractions (MarketDataPort, NewsFeedPort, BrokerPort)
//! - `catalyst`: Headline classification and catalyst scoring
//! - `indicators`: RSI, MACD, moving averages, support/resistance
//! - `patterns`: Candlestick pattern detection with catalyst alignment
//! - `scanner`: Three-stage universe funnel
//! - `strategy`: Weighted signal generation
//! - `engine`: Risk-gated execution, position monitoring, outcomes
//! - `application`: Cycle orchestrator, scheduler, health monitor
//! - `adapters`: REST clients, simulated feeds, CLI
//! - `storage`: Store trait, in-memory store, crash-recovery snapshot
//! - `config`: Configuration loading and validation

pub mod adapters;
pub mod application;
pub mod catalyst;
pub mod config;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod patterns;
pub mod ports;
pub mod scanner;
pub mod storage;
pub mod strategy;

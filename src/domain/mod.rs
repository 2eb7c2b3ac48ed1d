//! Domain Layer - Core business types for the catalyst pipeline
//!
//! Pure data and invariant-enforcing logic with no external dependencies.
//! All external interactions happen through the ports layer.

pub mod bar;
pub mod cycle;
pub mod news;
pub mod outcome;
pub mod position;
pub mod risk;
pub mod signal;

pub use bar::{Bar, MarketSession, Quote};
pub use cycle::{Cycle, CycleMode, CycleStatus, Stage, StageRecord};
pub use news::{CatalystSummary, CatalystType, NewsItem, Sentiment};
pub use outcome::{CatalystBreakdown, OutcomeRecord, PerformanceSummary};
pub use position::{ExitReason, PositionStatus, Side, Trade, TradeError};
pub use risk::{RiskLimits, RiskRejection};
pub use signal::{CatalystStrength, ComponentScores, Signal, SignalType};

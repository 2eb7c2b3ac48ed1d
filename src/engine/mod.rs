//! Execution Engine - risk-gated order placement, position monitoring
//! and outcome collection.

pub mod execution;
pub mod monitor;
pub mod outcome;

pub use execution::{EngineConfig, ExecutionEngine, ExecutionError, ExecutionResult};
pub use monitor::PositionMonitor;
pub use outcome::OutcomeCollector;

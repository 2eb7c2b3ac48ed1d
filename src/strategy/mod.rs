//! Strategy Layer - turns scored evidence into priced trading signals.
//!
//! The generator blends four evidence channels (catalyst, pattern,
//! indicator, volume) into a single confidence and resolves the trade
//! direction with catalyst-sentiment guardrails.

pub mod signal_generator;

pub use signal_generator::{GeneratorConfig, SignalGenerator};

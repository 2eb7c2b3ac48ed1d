//! Catalyst scoring: turns raw headlines into per-symbol catalyst summaries.

pub mod keywords;
pub mod scorer;

pub use keywords::{classify_headline, resolve_sentiment, Category, Impact};
pub use scorer::{CatalystScorer, ScorerConfig};

//! News items and catalyst classification types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::bar::MarketSession;

/// A single headline attached to a symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub symbol: String,
    pub headline: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    /// Marked by the feed or inferred from headline markers.
    #[serde(default)]
    pub is_breaking: bool,
    /// Session the item was published in, relative to the exchange clock.
    pub session: MarketSession,
}

/// Catalyst categories recognized by the keyword classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalystType {
    EarningsBeat,
    EarningsMiss,
    Earnings,
    FdaApproval,
    Merger,
    Upgrade,
    Downgrade,
    Insider,
    Lawsuit,
    ProductLaunch,
    Guidance,
    Partnership,
    Ipo,
    Bankruptcy,
    Dividend,
    Other,
}

impl CatalystType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalystType::EarningsBeat => "earnings_beat",
            CatalystType::EarningsMiss => "earnings_miss",
            CatalystType::Earnings => "earnings",
            CatalystType::FdaApproval => "fda_approval",
            CatalystType::Merger => "merger",
            CatalystType::Upgrade => "upgrade",
            CatalystType::Downgrade => "downgrade",
            CatalystType::Insider => "insider",
            CatalystType::Lawsuit => "lawsuit",
            CatalystType::ProductLaunch => "product_launch",
            CatalystType::Guidance => "guidance",
            CatalystType::Partnership => "partnership",
            CatalystType::Ipo => "ipo",
            CatalystType::Bankruptcy => "bankruptcy",
            CatalystType::Dividend => "dividend",
            CatalystType::Other => "other",
        }
    }
}

/// Directional read of a catalyst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Aggregated catalyst view for one symbol over the lookback window.
///
/// `score` is normalized to [0, 1]. A symbol with no recent news gets a
/// summary with score 0.0 and neutral sentiment rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalystSummary {
    pub symbol: String,
    pub score: f64,
    pub sentiment: Sentiment,
    pub catalyst_type: CatalystType,
    pub item_count: usize,
    pub top_headline: Option<String>,
    pub has_breaking: bool,
    pub has_pre_market: bool,
}

impl CatalystSummary {
    /// Empty summary for a symbol with no qualifying news.
    pub fn quiet(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            score: 0.0,
            sentiment: Sentiment::Neutral,
            catalyst_type: CatalystType::Other,
            item_count: 0,
            top_headline: None,
            has_breaking: false,
            has_pre_market: false,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.item_count == 0 || self.score <= 0.0
    }
}

//! Per-symbol catalyst scoring over a news lookback window.
//!
//! Each headline contributes the sum of its matched category weights,
//! boosted for breaking news and pre-market publication, then decayed
//! linearly to zero over the lookback window. The symbol score is the
//! capped sum of item scores.

use chrono::{DateTime, Duration, Utc};

use crate::catalyst::keywords::{classify_headline, resolve_sentiment};
use crate::domain::bar::MarketSession;
use crate::domain::news::{CatalystSummary, CatalystType, NewsItem, Sentiment};

const BREAKING_MARKERS: [&str; 4] = ["breaking", "alert", "just in", "urgent"];

#[derive(Debug, Clone)]
pub struct ScorerConfig {
    /// Items older than this contribute nothing.
    pub decay_hours: f64,
    /// Multiplier for breaking items.
    pub breaking_boost: f64,
    /// Multiplier for items published pre-market.
    pub pre_market_boost: f64,
    /// Items published within this window count as breaking even without markers.
    pub breaking_recency_minutes: i64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            decay_hours: 24.0,
            breaking_boost: 1.5,
            pre_market_boost: 1.3,
            breaking_recency_minutes: 30,
        }
    }
}

pub struct CatalystScorer {
    config: ScorerConfig,
}

impl CatalystScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    /// Score one symbol's news. No news means a quiet summary, never an error.
    pub fn score(&self, symbol: &str, items: &[NewsItem], now: DateTime<Utc>) -> CatalystSummary {
        let mut total = 0.0;
        let mut best_item_score = 0.0;
        let mut best_type = CatalystType::Other;
        let mut best_headline: Option<String> = None;
        let mut best_sentiment = Sentiment::Neutral;
        let mut has_breaking = false;
        let mut has_pre_market = false;
        let mut scored_items = 0usize;

        for item in items {
            let lower = item.headline.to_lowercase();
            let hits = classify_headline(&item.headline);
            if hits.is_empty() {
                continue;
            }

            let base: f64 = hits.iter().map(|(_, w)| w).sum();
            let breaking = self.is_breaking(item, now);
            let pre_market = item.session == MarketSession::PreMarket;

            let mut score = base;
            if breaking {
                score *= self.config.breaking_boost;
            }
            if pre_market {
                score *= self.config.pre_market_boost;
            }
            score *= self.decay_factor(item.published_at, now);
            if score <= 0.0 {
                continue;
            }

            has_breaking |= breaking;
            has_pre_market |= pre_market;
            scored_items += 1;
            total += score;

            if score > best_item_score {
                best_item_score = score;
                // Dominant category of the best item decides the type
                let (category, _) = hits
                    .iter()
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .copied()
                    .unwrap_or(hits[0]);
                best_type = category.catalyst_type(&lower);
                best_sentiment = resolve_sentiment(best_type, &lower);
                best_headline = Some(item.headline.clone());
            }
        }

        if scored_items == 0 {
            return CatalystSummary::quiet(symbol);
        }

        let summary = CatalystSummary {
            symbol: symbol.to_string(),
            score: total.min(1.0),
            sentiment: best_sentiment,
            catalyst_type: best_type,
            item_count: scored_items,
            top_headline: best_headline,
            has_breaking,
            has_pre_market,
        };

        tracing::debug!(
            symbol,
            score = summary.score,
            catalyst = summary.catalyst_type.as_str(),
            items = summary.item_count,
            "catalyst scored"
        );

        summary
    }

    fn is_breaking(&self, item: &NewsItem, now: DateTime<Utc>) -> bool {
        if item.is_breaking {
            return true;
        }
        let lower = item.headline.to_lowercase();
        if BREAKING_MARKERS.iter().any(|m| lower.contains(m)) {
            return true;
        }
        now - item.published_at <= Duration::minutes(self.config.breaking_recency_minutes)
    }

    /// Linear decay: 1.0 at publication, 0.0 at the window edge and beyond.
    fn decay_factor(&self, published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let age_hours = (now - published_at).num_seconds() as f64 / 3600.0;
        if age_hours < 0.0 {
            return 1.0;
        }
        (1.0 - age_hours / self.config.decay_hours).max(0.0)
    }
}

impl Default for CatalystScorer {
    fn default() -> Self {
        Self::new(ScorerConfig::default())
    }
}

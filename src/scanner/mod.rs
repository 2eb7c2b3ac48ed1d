//! Scanner - narrows the universe to a handful of catalyst-backed
//! candidates.
//!
//! Three-stage funnel: universe, catalyst filter (minimum score, top N),
//! technical ranking (top finalists by combined score). Stages emit what
//! survives; nothing is padded to fill a quota.

pub mod cache;
pub mod universe;

pub use cache::ScanCache;
pub use universe::DEFAULT_UNIVERSE;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::bar::Bar;
use crate::domain::news::CatalystSummary;
use crate::indicators::{IndicatorSnapshot, Trend};
use crate::ports::market_data::{MarketDataError, MarketDataPort};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),
}

/// A symbol that survived the funnel, carrying everything downstream
/// stages need so they do not refetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub symbol: String,
    pub catalyst: CatalystSummary,
    pub bars: Vec<Bar>,
    pub indicators: IndicatorSnapshot,
    pub combined_score: f64,
    pub last_price: f64,
}

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Catalyst score floor for stage two.
    pub min_catalyst_score: f64,
    /// Survivors of the catalyst filter.
    pub catalyst_top_n: usize,
    /// Finalists of the technical ranking.
    pub final_top_n: usize,
    pub min_price: f64,
    pub max_price: f64,
    /// 20-bar average volume floor.
    pub min_avg_volume: f64,
    /// Bars fetched per symbol for the technical read.
    pub bar_lookback: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_catalyst_score: 0.3,
            catalyst_top_n: 20,
            final_top_n: 5,
            min_price: 5.0,
            max_price: 500.0,
            min_avg_volume: 100_000.0,
            bar_lookback: 60,
        }
    }
}

pub struct Scanner {
    config: ScannerConfig,
    market_data: Arc<dyn MarketDataPort>,
}

impl Scanner {
    pub fn new(config: ScannerConfig, market_data: Arc<dyn MarketDataPort>) -> Self {
        Self { config, market_data }
    }

    /// Run the funnel over precomputed catalyst summaries.
    ///
    /// Symbols whose market data is missing are skipped with a warning;
    /// the scan itself only fails when nothing can be evaluated at all.
    pub async fn scan(
        &self,
        catalysts: &HashMap<String, CatalystSummary>,
    ) -> Result<Vec<Candidate>, ScanError> {
        // Stage two: catalyst filter
        let mut hot: Vec<&CatalystSummary> = catalysts
            .values()
            .filter(|c| c.score >= self.config.min_catalyst_score)
            .collect();
        hot.sort_by(|a, b| b.score.total_cmp(&a.score));
        hot.truncate(self.config.catalyst_top_n);

        tracing::info!(
            universe = catalysts.len(),
            catalyst_survivors = hot.len(),
            "catalyst filter applied"
        );

        // Stage three: technical ranking
        let mut candidates = Vec::new();
        for summary in hot {
            match self.evaluate(summary).await {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(symbol = %summary.symbol, error = %e, "skipping symbol");
                }
            }
        }

        candidates.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
        candidates.truncate(self.config.final_top_n);

        tracing::info!(finalists = candidates.len(), "scan complete");
        Ok(candidates)
    }

    async fn evaluate(&self, summary: &CatalystSummary) -> Result<Option<Candidate>, MarketDataError> {
        let bars = self
            .market_data
            .recent_bars(&summary.symbol, self.config.bar_lookback)
            .await?;
        let snapshot = match IndicatorSnapshot::compute(&bars) {
            Some(s) => s,
            None => return Ok(None),
        };

        let price = snapshot.last_close;
        if price < self.config.min_price || price > self.config.max_price {
            return Ok(None);
        }
        if let Some(avg) = average_volume(&bars, 20) {
            if avg < self.config.min_avg_volume {
                return Ok(None);
            }
        }

        let combined_score = combined_score(summary, &snapshot, &bars);
        Ok(Some(Candidate {
            symbol: summary.symbol.clone(),
            catalyst: summary.clone(),
            bars,
            indicators: snapshot,
            combined_score,
            last_price: price,
        }))
    }
}

fn average_volume(bars: &[Bar], period: usize) -> Option<f64> {
    if bars.len() < period {
        return None;
    }
    let tail = &bars[bars.len() - period..];
    Some(tail.iter().map(|b| b.volume).sum::<f64>() / period as f64)
}

/// Combined ranking score out of 100: 40% news, 20% momentum, 30% RSI
/// setup, 10% trend.
fn combined_score(summary: &CatalystSummary, snapshot: &IndicatorSnapshot, bars: &[Bar]) -> f64 {
    let news = summary.score * 40.0;

    let change_pct = daily_change_pct(bars).unwrap_or(0.0);
    let momentum = match snapshot.volume_ratio {
        Some(ratio) if ratio > 1.5 && change_pct.abs() > 1.0 => 20.0,
        _ => 0.0,
    };

    let rsi_setup = match snapshot.rsi {
        Some(rsi) if !(30.0..=70.0).contains(&rsi) => 30.0,
        Some(rsi) if !(40.0..=60.0).contains(&rsi) => 15.0,
        Some(_) => 5.0,
        None => 0.0,
    };

    let trend = match snapshot.trend {
        Trend::Up | Trend::Down => 10.0,
        Trend::Sideways => 0.0,
    };

    news + momentum + rsi_setup + trend
}

fn daily_change_pct(bars: &[Bar]) -> Option<f64> {
    if bars.len() < 2 {
        return None;
    }
    let prev = bars[bars.len() - 2].close;
    let last = bars[bars.len() - 1].close;
    if prev <= 0.0 {
        return None;
    }
    Some((last - prev) / prev * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::news::{CatalystType, Sentiment};
    use crate::ports::mocks::MockMarketData;
    use chrono::Utc;

    fn summary(symbol: &str, score: f64) -> CatalystSummary {
        CatalystSummary {
            symbol: symbol.into(),
            score,
            sentiment: Sentiment::Positive,
            catalyst_type: CatalystType::EarningsBeat,
            item_count: 2,
            top_headline: None,
            has_breaking: false,
            has_pre_market: false,
        }
    }

    fn flat_bars(price: f64, volume: f64, count: usize) -> Vec<Bar> {
        (0..count)
            .map(|_| Bar {
                timestamp: Utc::now(),
                open: price,
                high: price + 0.2,
                low: price - 0.2,
                close: price,
                volume,
            })
            .collect()
    }

    fn catalysts(entries: &[(&str, f64)]) -> HashMap<String, CatalystSummary> {
        entries
            .iter()
            .map(|(s, score)| (s.to_string(), summary(s, *score)))
            .collect()
    }

    #[tokio::test]
    async fn test_catalyst_floor_filters() {
        let market = Arc::new(
            MockMarketData::new()
                .with_bars("HOT", flat_bars(50.0, 1_000_000.0, 60))
                .with_bars("COLD", flat_bars(50.0, 1_000_000.0, 60)),
        );
        let scanner = Scanner::new(ScannerConfig::default(), market);

        let found = scanner
            .scan(&catalysts(&[("HOT", 0.6), ("COLD", 0.1)]))
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].symbol, "HOT");
    }

    #[tokio::test]
    async fn test_no_padding_when_few_survive() {
        let market = Arc::new(MockMarketData::new().with_bars("ONLY", flat_bars(50.0, 1_000_000.0, 60)));
        let scanner = Scanner::new(ScannerConfig::default(), market);

        let found = scanner.scan(&catalysts(&[("ONLY", 0.5)])).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_price_band_exclusion() {
        let market = Arc::new(
            MockMarketData::new()
                .with_bars("PENNY", flat_bars(2.0, 1_000_000.0, 60))
                .with_bars("FAIR", flat_bars(50.0, 1_000_000.0, 60)),
        );
        let scanner = Scanner::new(ScannerConfig::default(), market);

        let found = scanner
            .scan(&catalysts(&[("PENNY", 0.8), ("FAIR", 0.5)]))
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].symbol, "FAIR");
    }

    #[tokio::test]
    async fn test_illiquid_symbol_excluded() {
        let market = Arc::new(MockMarketData::new().with_bars("THIN", flat_bars(50.0, 1_000.0, 60)));
        let scanner = Scanner::new(ScannerConfig::default(), market);

        let found = scanner.scan(&catalysts(&[("THIN", 0.9)])).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_missing_data_skips_symbol() {
        let market = Arc::new(MockMarketData::new().with_bars("GOOD", flat_bars(50.0, 1_000_000.0, 60)));
        let scanner = Scanner::new(ScannerConfig::default(), market);

        // NODATA has a catalyst but no bars configured
        let found = scanner
            .scan(&catalysts(&[("GOOD", 0.5), ("NODATA", 0.9)]))
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].symbol, "GOOD");
    }

    #[tokio::test]
    async fn test_ranking_prefers_stronger_catalyst() {
        let market = Arc::new(
            MockMarketData::new()
                .with_bars("A", flat_bars(50.0, 1_000_000.0, 60))
                .with_bars("B", flat_bars(50.0, 1_000_000.0, 60)),
        );
        let mut config = ScannerConfig::default();
        config.final_top_n = 1;
        let scanner = Scanner::new(config, market);

        let found = scanner
            .scan(&catalysts(&[("A", 0.4), ("B", 0.9)]))
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].symbol, "B");
    }
}

//! Pattern detection over recent bars, scored against the active catalyst.

use serde::{Deserialize, Serialize};

use crate::domain::bar::{Bar, MarketSession};
use crate::domain::news::CatalystSummary;
use crate::patterns::{
    PatternDirection, PatternKind, PatternSpec, BEARISH_ENGULFING, BULLISH_ENGULFING, DOJI,
    GAP_DOWN, GAP_UP, HAMMER, MAX_DOJI_BODY_RATIO, MIN_GAP_PCT, MIN_SHADOW_RATIO,
    MIN_VOLUME_SURGE_RATIO, SHOOTING_STAR, THREE_BLACK_CROWS, THREE_WHITE_SOLDIERS, VOLUME_SURGE,
};

/// A detected pattern with its catalyst-adjusted confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternDetection {
    pub name: String,
    pub kind: PatternKind,
    pub direction: PatternDirection,
    /// Geometry quality in [0, 100].
    pub strength: f64,
    /// Catalyst-adjusted confidence in [0, 100].
    pub confidence: f64,
    /// True when the pattern direction agrees with the catalyst sentiment.
    pub aligned: bool,
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Extra multiplier for momentum patterns when any catalyst is active.
    pub momentum_catalyst_boost: f64,
    /// Multiplier for any pattern forming pre-market on top of a catalyst.
    pub pre_market_catalyst_boost: f64,
    /// How many detections to surface per symbol.
    pub max_results: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            momentum_catalyst_boost: 1.2,
            pre_market_catalyst_boost: 2.0,
            max_results: 3,
        }
    }
}

pub struct PatternDetector {
    config: DetectorConfig,
}

impl PatternDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Detect patterns on the tail of `bars` and score them against the
    /// symbol's catalyst. Fewer than two bars yields no detections.
    pub fn detect(
        &self,
        bars: &[Bar],
        catalyst: &CatalystSummary,
        session: MarketSession,
    ) -> Vec<PatternDetection> {
        if bars.len() < 2 {
            return Vec::new();
        }

        let mut raw: Vec<(PatternSpec, f64)> = Vec::new();
        let last = &bars[bars.len() - 1];
        let prev = &bars[bars.len() - 2];

        if let Some(strength) = hammer_strength(last) {
            raw.push((HAMMER, strength));
        }
        if let Some(strength) = shooting_star_strength(last) {
            raw.push((SHOOTING_STAR, strength));
        }
        if let Some(strength) = doji_strength(last) {
            raw.push((DOJI, strength));
        }
        if let Some(strength) = engulfing_strength(prev, last, true) {
            raw.push((BULLISH_ENGULFING, strength));
        }
        if let Some(strength) = engulfing_strength(prev, last, false) {
            raw.push((BEARISH_ENGULFING, strength));
        }
        if let Some(strength) = gap_strength(prev, last, true) {
            raw.push((GAP_UP, strength));
        }
        if let Some(strength) = gap_strength(prev, last, false) {
            raw.push((GAP_DOWN, strength));
        }

        if bars.len() >= 3 {
            let trio = &bars[bars.len() - 3..];
            if let Some(strength) = soldiers_strength(trio, true) {
                raw.push((THREE_WHITE_SOLDIERS, strength));
            }
            if let Some(strength) = soldiers_strength(trio, false) {
                raw.push((THREE_BLACK_CROWS, strength));
            }
        }

        if bars.len() >= 21 {
            if let Some(strength) = volume_surge_strength(bars) {
                raw.push((VOLUME_SURGE, strength));
            }
        }

        let has_catalyst = !catalyst.is_quiet();
        let mut detections: Vec<PatternDetection> = raw
            .into_iter()
            .map(|(spec, strength)| {
                let mut confidence = spec.base_confidence * spec.boost_for(catalyst.sentiment);
                if has_catalyst && spec.kind == PatternKind::Momentum {
                    confidence *= self.config.momentum_catalyst_boost;
                }
                if has_catalyst && session == MarketSession::PreMarket {
                    confidence *= self.config.pre_market_catalyst_boost;
                }
                PatternDetection {
                    name: spec.name.to_string(),
                    kind: spec.kind,
                    direction: spec.direction,
                    strength,
                    confidence: confidence.min(100.0),
                    aligned: spec.aligns_with(catalyst.sentiment),
                }
            })
            .collect();

        detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        detections.truncate(self.config.max_results);

        if !detections.is_empty() {
            tracing::debug!(
                symbol = %catalyst.symbol,
                top = %detections[0].name,
                confidence = detections[0].confidence,
                count = detections.len(),
                "patterns detected"
            );
        }

        detections
    }
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

fn hammer_strength(bar: &Bar) -> Option<f64> {
    let body = bar.body();
    if body <= 0.0 || bar.range() <= 0.0 {
        return None;
    }
    let lower = bar.lower_shadow();
    if lower >= MIN_SHADOW_RATIO * body && bar.upper_shadow() < body {
        Some((lower / body * 20.0).min(100.0))
    } else {
        None
    }
}

fn shooting_star_strength(bar: &Bar) -> Option<f64> {
    let body = bar.body();
    if body <= 0.0 || bar.range() <= 0.0 {
        return None;
    }
    let upper = bar.upper_shadow();
    if upper >= MIN_SHADOW_RATIO * body && bar.lower_shadow() < body {
        Some((upper / body * 20.0).min(100.0))
    } else {
        None
    }
}

fn doji_strength(bar: &Bar) -> Option<f64> {
    let range = bar.range();
    if range <= 0.0 {
        return None;
    }
    let body_ratio = bar.body() / range;
    if body_ratio <= MAX_DOJI_BODY_RATIO {
        Some(((MAX_DOJI_BODY_RATIO - body_ratio) / MAX_DOJI_BODY_RATIO * 100.0).min(100.0))
    } else {
        None
    }
}

fn engulfing_strength(prev: &Bar, cur: &Bar, bullish: bool) -> Option<f64> {
    let engulfs = if bullish {
        prev.is_bearish() && cur.is_bullish() && cur.open <= prev.close && cur.close >= prev.open
    } else {
        prev.is_bullish() && cur.is_bearish() && cur.open >= prev.close && cur.close <= prev.open
    };
    if !engulfs || prev.body() <= 0.0 {
        return None;
    }
    Some((cur.body() / prev.body() * 50.0).min(100.0))
}

fn gap_strength(prev: &Bar, cur: &Bar, up: bool) -> Option<f64> {
    if prev.close <= 0.0 {
        return None;
    }
    let gap_pct = (cur.open - prev.close) / prev.close * 100.0;
    let qualifying = if up { gap_pct >= MIN_GAP_PCT } else { gap_pct <= -MIN_GAP_PCT };
    if qualifying {
        Some((gap_pct.abs() * 25.0).min(100.0))
    } else {
        None
    }
}

fn soldiers_strength(trio: &[Bar], bullish: bool) -> Option<f64> {
    debug_assert_eq!(trio.len(), 3);
    let consistent = if bullish {
        trio.iter().all(|b| b.is_bullish())
            && trio[1].close > trio[0].close
            && trio[2].close > trio[1].close
    } else {
        trio.iter().all(|b| b.is_bearish())
            && trio[1].close < trio[0].close
            && trio[2].close < trio[1].close
    };
    if !consistent || trio[0].close <= 0.0 {
        return None;
    }
    let move_pct = ((trio[2].close - trio[0].close) / trio[0].close * 100.0).abs();
    Some((move_pct * 10.0).min(100.0))
}

fn volume_surge_strength(bars: &[Bar]) -> Option<f64> {
    let last = &bars[bars.len() - 1];
    let window = &bars[bars.len() - 21..bars.len() - 1];
    let avg: f64 = window.iter().map(|b| b.volume).sum::<f64>() / window.len() as f64;
    if avg <= 0.0 {
        return None;
    }
    let ratio = last.volume / avg;
    if ratio >= MIN_VOLUME_SURGE_RATIO {
        Some((ratio * 25.0).min(100.0))
    } else {
        None
    }
}

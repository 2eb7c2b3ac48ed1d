//! Weighted signal generation from catalyst, pattern, indicator and volume
//! evidence.
//!
//! Blended confidence: 0.35 catalyst + 0.35 pattern + 0.20 indicator +
//! 0.10 volume, all components in [0, 100]. Direction comes from the
//! pattern majority, overridden by RSI extremes, and is never allowed to
//! oppose the catalyst sentiment (it degrades to Hold instead).

use chrono::Utc;

use crate::domain::bar::MarketSession;
use crate::domain::news::{CatalystSummary, CatalystType, Sentiment};
use crate::domain::signal::{CatalystStrength, ComponentScores, Signal, SignalType};
use crate::indicators::IndicatorSnapshot;
use crate::patterns::{PatternDetection, PatternDirection};

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub catalyst_weight: f64,
    pub pattern_weight: f64,
    pub indicator_weight: f64,
    pub volume_weight: f64,
    /// Below this blended confidence every signal is a Hold.
    pub hold_threshold: f64,
    /// Catalyst component boost during pre-market.
    pub pre_market_boost: f64,
    /// Catalyst component boost when more than `corroboration_items`
    /// headlines back the catalyst.
    pub corroboration_boost: f64,
    pub corroboration_items: usize,
    /// Stop distance in percent before the strength multiplier.
    pub base_stop_pct: f64,
    /// Entry offset from the last price, percent.
    pub entry_offset_pct: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            catalyst_weight: 0.35,
            pattern_weight: 0.35,
            indicator_weight: 0.20,
            volume_weight: 0.10,
            hold_threshold: 30.0,
            pre_market_boost: 1.2,
            corroboration_boost: 1.1,
            corroboration_items: 3,
            base_stop_pct: 2.0,
            entry_offset_pct: 0.1,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
        }
    }
}

pub struct SignalGenerator {
    config: GeneratorConfig,
}

impl SignalGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn generate(
        &self,
        symbol: &str,
        catalyst: &CatalystSummary,
        patterns: &[PatternDetection],
        indicators: &IndicatorSnapshot,
        session: MarketSession,
    ) -> Signal {
        let catalyst_score = self.catalyst_component(catalyst, session);
        let pattern_score = pattern_component(patterns);
        let bullishness = indicator_bullishness(indicators, &self.config);
        let volume_score = volume_component(indicators.volume_ratio);

        let mut direction = self.resolve_direction(catalyst, patterns, indicators);

        // Indicator agreement should raise confidence for shorts too
        let indicator_score = match direction {
            SignalType::Sell => 100.0 - bullishness,
            _ => bullishness,
        };

        let confidence = (self.config.catalyst_weight * catalyst_score
            + self.config.pattern_weight * pattern_score
            + self.config.indicator_weight * indicator_score
            + self.config.volume_weight * volume_score)
            .clamp(0.0, 100.0);

        if confidence < self.config.hold_threshold {
            direction = SignalType::Hold;
        }

        // Stop sizing follows catalyst conviction, not the blend: a weak
        // catalyst keeps a wide stop even under strong confluence.
        let strength = CatalystStrength::from_catalyst_score(catalyst_score);
        let components = ComponentScores {
            catalyst: catalyst_score,
            pattern: pattern_score,
            indicator: indicator_score,
            volume: volume_score,
        };

        let signal = self.price_signal(
            symbol, direction, confidence, strength, components, catalyst, patterns, indicators,
        );

        tracing::info!(
            symbol,
            signal = ?signal.signal_type,
            confidence = format!("{:.1}", signal.confidence),
            catalyst = catalyst.catalyst_type.as_str(),
            "signal generated"
        );

        signal
    }

    /// Catalyst component: normalized score scaled to 100 with type,
    /// session and corroboration multipliers, capped at 100.
    fn catalyst_component(&self, catalyst: &CatalystSummary, session: MarketSession) -> f64 {
        if catalyst.is_quiet() {
            return 0.0;
        }
        let mut score = catalyst.score * 100.0 * type_multiplier(catalyst.catalyst_type);
        if session == MarketSession::PreMarket {
            score *= self.config.pre_market_boost;
        }
        if catalyst.item_count > self.config.corroboration_items {
            score *= self.config.corroboration_boost;
        }
        score.min(100.0)
    }

    fn resolve_direction(
        &self,
        catalyst: &CatalystSummary,
        patterns: &[PatternDetection],
        indicators: &IndicatorSnapshot,
    ) -> SignalType {
        // Confidence-weighted pattern majority
        let mut bull = 0.0;
        let mut bear = 0.0;
        for p in patterns {
            match p.direction {
                PatternDirection::Bullish => bull += p.confidence,
                PatternDirection::Bearish => bear += p.confidence,
                PatternDirection::Neutral => {}
            }
        }

        let mut direction = if bull > bear {
            SignalType::Buy
        } else if bear > bull {
            SignalType::Sell
        } else {
            match catalyst.sentiment {
                Sentiment::Positive => SignalType::Buy,
                Sentiment::Negative => SignalType::Sell,
                Sentiment::Neutral => SignalType::Hold,
            }
        };

        // RSI extremes trump the pattern read
        if let Some(rsi) = indicators.rsi {
            if rsi <= self.config.rsi_oversold {
                direction = SignalType::Buy;
            } else if rsi >= self.config.rsi_overbought {
                direction = SignalType::Sell;
            }
        }

        // Never trade against the catalyst
        match (direction, catalyst.sentiment) {
            (SignalType::Buy, Sentiment::Negative) | (SignalType::Sell, Sentiment::Positive) => {
                SignalType::Hold
            }
            _ => direction,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn price_signal(
        &self,
        symbol: &str,
        direction: SignalType,
        confidence: f64,
        strength: CatalystStrength,
        components: ComponentScores,
        catalyst: &CatalystSummary,
        patterns: &[PatternDetection],
        indicators: &IndicatorSnapshot,
    ) -> Signal {
        let now = Utc::now();
        let id = format!("sig-{}-{}", symbol.to_lowercase(), now.timestamp_millis());
        let price = indicators.last_close;
        let offset = self.config.entry_offset_pct / 100.0;
        let stop_pct = self.config.base_stop_pct * strength.stop_multiplier() / 100.0;

        // Entry is offset against the direction: buys bid slightly under
        // the last price, sells offer slightly over.
        let (entry, stop, target_1, target_2) = match direction {
            SignalType::Buy => {
                let entry = price * (1.0 - offset);
                let stop = entry * (1.0 - stop_pct);
                let risk = entry - stop;
                (entry, stop, entry + 1.5 * risk, entry + 3.0 * risk)
            }
            SignalType::Sell => {
                let entry = price * (1.0 + offset);
                let stop = entry * (1.0 + stop_pct);
                let risk = stop - entry;
                (entry, stop, entry - 1.5 * risk, entry - 3.0 * risk)
            }
            SignalType::Hold => (price, price, price, price),
        };

        let position_pct = match direction {
            SignalType::Hold => 0.0,
            _ if confidence >= 70.0 => 100.0,
            _ if confidence >= 50.0 => 50.0,
            _ => 25.0,
        };

        // Reward measured to the first target, the conservative exit
        let risk = (entry - stop).abs();
        let reward = (target_1 - entry).abs();
        let risk_reward_ratio = if risk > 0.0 { reward / risk } else { 0.0 };

        let mut key_factors = Vec::new();
        if !catalyst.is_quiet() {
            key_factors.push(format!(
                "{} catalyst, score {:.2} across {} items",
                catalyst.catalyst_type.as_str(),
                catalyst.score,
                catalyst.item_count
            ));
        }
        if let Some(top) = patterns.first() {
            key_factors.push(format!("{} pattern at {:.0} confidence", top.name, top.confidence));
        }
        if let Some(rsi) = indicators.rsi {
            if rsi <= self.config.rsi_oversold {
                key_factors.push(format!("RSI {:.1} oversold", rsi));
            } else if rsi >= self.config.rsi_overbought {
                key_factors.push(format!("RSI {:.1} overbought", rsi));
            }
        }
        if let Some(ratio) = indicators.volume_ratio {
            if ratio >= 1.5 {
                key_factors.push(format!("volume {:.1}x average", ratio));
            }
        }

        Signal {
            id,
            symbol: symbol.to_string(),
            signal_type: direction,
            confidence,
            catalyst_strength: strength,
            components,
            catalyst_type: catalyst.catalyst_type,
            catalyst_sentiment: catalyst.sentiment,
            pattern: patterns.first().map(|p| p.name.clone()),
            entry_price: entry,
            stop_loss: stop,
            target_1,
            target_2,
            position_pct,
            risk_reward_ratio,
            key_factors,
            generated_at: now,
        }
    }
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

/// Multiplier applied to the catalyst component per catalyst type.
fn type_multiplier(catalyst_type: CatalystType) -> f64 {
    match catalyst_type {
        CatalystType::FdaApproval => 1.5,
        CatalystType::Merger => 1.4,
        CatalystType::EarningsBeat | CatalystType::EarningsMiss => 1.3,
        CatalystType::Upgrade | CatalystType::Downgrade => 1.2,
        CatalystType::Lawsuit => 1.1,
        _ => 1.0,
    }
}

/// Best pattern confidence, boosted when at least two detections agree
/// on a direction.
fn pattern_component(patterns: &[PatternDetection]) -> f64 {
    let best = patterns
        .iter()
        .map(|p| p.confidence)
        .fold(0.0f64, f64::max);
    if best == 0.0 {
        return 0.0;
    }

    let bullish = patterns.iter().filter(|p| p.direction == PatternDirection::Bullish).count();
    let bearish = patterns.iter().filter(|p| p.direction == PatternDirection::Bearish).count();
    let score = if bullish >= 2 || bearish >= 2 { best * 1.1 } else { best };
    score.min(100.0)
}

/// Bullishness read of the indicator snapshot, 50 when nothing is known.
fn indicator_bullishness(snapshot: &IndicatorSnapshot, config: &GeneratorConfig) -> f64 {
    let mut score: f64 = 50.0;

    if let Some(rsi) = snapshot.rsi {
        if rsi <= config.rsi_oversold {
            score += 20.0;
        } else if rsi >= config.rsi_overbought {
            score -= 20.0;
        }
    }

    if let Some(macd) = snapshot.macd {
        if macd.histogram > 0.0 {
            score += 15.0;
        } else if macd.histogram < 0.0 {
            score -= 15.0;
        }
    }

    if let (Some(fast), Some(slow)) = (snapshot.sma_20, snapshot.sma_50) {
        if snapshot.last_close > fast && fast > slow {
            score += 15.0;
        } else if snapshot.last_close < fast && fast < slow {
            score -= 15.0;
        }
    }

    match snapshot.trend {
        crate::indicators::Trend::Up => score += 10.0,
        crate::indicators::Trend::Down => score -= 10.0,
        crate::indicators::Trend::Sideways => {}
    }

    score.clamp(0.0, 100.0)
}

/// Relative volume tiers; unknown volume is scored neutral.
fn volume_component(ratio: Option<f64>) -> f64 {
    match ratio {
        Some(r) if r >= 2.0 => 90.0,
        Some(r) if r >= 1.5 => 70.0,
        Some(r) if r >= 1.0 => 50.0,
        Some(_) => 30.0,
        None => 50.0,
    }
}

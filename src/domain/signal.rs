//! Trading signals produced by the weighted generator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::news::{CatalystType, Sentiment};

/// Direction of a signal. Hold never reaches the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Buy,
    Sell,
    Hold,
}

/// Conviction tier classified from the catalyst component score.
/// Stronger catalysts justify tighter stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalystStrength {
    Strong,
    Moderate,
    Weak,
}

impl CatalystStrength {
    /// Stop-distance multiplier: tighter stops for higher conviction.
    pub fn stop_multiplier(&self) -> f64 {
        match self {
            CatalystStrength::Strong => 0.5,
            CatalystStrength::Moderate => 1.0,
            CatalystStrength::Weak => 1.5,
        }
    }

    /// Tier from the catalyst component score in [0, 100].
    pub fn from_catalyst_score(score: f64) -> Self {
        if score >= 70.0 {
            CatalystStrength::Strong
        } else if score >= 40.0 {
            CatalystStrength::Moderate
        } else {
            CatalystStrength::Weak
        }
    }
}

/// The four component scores feeding the blended confidence, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub catalyst: f64,
    pub pattern: f64,
    pub indicator: f64,
    pub volume: f64,
}

/// A fully priced trading signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub symbol: String,
    pub signal_type: SignalType,
    /// Blended confidence in [0, 100].
    pub confidence: f64,
    pub catalyst_strength: CatalystStrength,
    pub components: ComponentScores,
    pub catalyst_type: CatalystType,
    pub catalyst_sentiment: Sentiment,
    pub pattern: Option<String>,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub target_1: f64,
    pub target_2: f64,
    /// Fraction of buying power requested, in percent (25/50/100 tiers).
    pub position_pct: f64,
    pub risk_reward_ratio: f64,
    pub key_factors: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl Signal {
    pub fn is_actionable(&self) -> bool {
        self.signal_type != SignalType::Hold
    }

    /// Per-share risk implied by the entry/stop pair.
    pub fn risk_per_share(&self) -> f64 {
        (self.entry_price - self.stop_loss).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_tiers() {
        assert_eq!(CatalystStrength::from_catalyst_score(85.0), CatalystStrength::Strong);
        assert_eq!(CatalystStrength::from_catalyst_score(70.0), CatalystStrength::Strong);
        assert_eq!(CatalystStrength::from_catalyst_score(55.0), CatalystStrength::Moderate);
        assert_eq!(CatalystStrength::from_catalyst_score(40.0), CatalystStrength::Moderate);
        assert_eq!(CatalystStrength::from_catalyst_score(10.0), CatalystStrength::Weak);
    }

    #[test]
    fn test_stop_multiplier_ordering() {
        assert!(
            CatalystStrength::Strong.stop_multiplier() < CatalystStrength::Moderate.stop_multiplier()
        );
        assert!(
            CatalystStrength::Moderate.stop_multiplier() < CatalystStrength::Weak.stop_multiplier()
        );
    }
}

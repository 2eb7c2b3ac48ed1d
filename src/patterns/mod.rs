//! Candlestick pattern table and catalyst-aware detection.

pub mod detector;

pub use detector::{DetectorConfig, PatternDetection, PatternDetector};

use serde::{Deserialize, Serialize};

use crate::domain::news::Sentiment;

/// Pattern families. Momentum patterns get extra weight when a catalyst
/// is present; continuation patterns need a third bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Reversal,
    Continuation,
    Momentum,
}

/// Directional implication of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternDirection {
    Bullish,
    Bearish,
    Neutral,
}

/// Static spec for one pattern: base confidence plus the sentiment boost
/// triple (positive / negative / neutral catalyst).
#[derive(Debug, Clone, Copy)]
pub struct PatternSpec {
    pub name: &'static str,
    pub kind: PatternKind,
    pub direction: PatternDirection,
    pub base_confidence: f64,
    pub boost_positive: f64,
    pub boost_negative: f64,
    pub boost_neutral: f64,
}

impl PatternSpec {
    pub fn boost_for(&self, sentiment: Sentiment) -> f64 {
        match sentiment {
            Sentiment::Positive => self.boost_positive,
            Sentiment::Negative => self.boost_negative,
            Sentiment::Neutral => self.boost_neutral,
        }
    }

    /// Whether this pattern's direction agrees with the catalyst sentiment.
    /// Neutral patterns and neutral sentiment always align.
    pub fn aligns_with(&self, sentiment: Sentiment) -> bool {
        match (self.direction, sentiment) {
            (PatternDirection::Neutral, _) => true,
            (_, Sentiment::Neutral) => true,
            (PatternDirection::Bullish, Sentiment::Positive) => true,
            (PatternDirection::Bearish, Sentiment::Negative) => true,
            _ => false,
        }
    }
}

/// Geometry thresholds shared by the detectors.
pub const MIN_SHADOW_RATIO: f64 = 2.0;
pub const MAX_DOJI_BODY_RATIO: f64 = 0.1;
pub const MIN_GAP_PCT: f64 = 2.0;
pub const MIN_VOLUME_SURGE_RATIO: f64 = 2.0;

pub const HAMMER: PatternSpec = PatternSpec {
    name: "hammer",
    kind: PatternKind::Reversal,
    direction: PatternDirection::Bullish,
    base_confidence: 65.0,
    boost_positive: 1.5,
    boost_negative: 0.7,
    boost_neutral: 1.0,
};

pub const SHOOTING_STAR: PatternSpec = PatternSpec {
    name: "shooting_star",
    kind: PatternKind::Reversal,
    direction: PatternDirection::Bearish,
    base_confidence: 65.0,
    boost_positive: 0.7,
    boost_negative: 1.5,
    boost_neutral: 1.0,
};

pub const BULLISH_ENGULFING: PatternSpec = PatternSpec {
    name: "bullish_engulfing",
    kind: PatternKind::Reversal,
    direction: PatternDirection::Bullish,
    base_confidence: 70.0,
    boost_positive: 1.5,
    boost_negative: 0.6,
    boost_neutral: 1.0,
};

pub const BEARISH_ENGULFING: PatternSpec = PatternSpec {
    name: "bearish_engulfing",
    kind: PatternKind::Reversal,
    direction: PatternDirection::Bearish,
    base_confidence: 70.0,
    boost_positive: 0.6,
    boost_negative: 1.5,
    boost_neutral: 1.0,
};

pub const DOJI: PatternSpec = PatternSpec {
    name: "doji",
    kind: PatternKind::Reversal,
    direction: PatternDirection::Neutral,
    base_confidence: 60.0,
    boost_positive: 1.2,
    boost_negative: 1.2,
    boost_neutral: 1.0,
};

pub const THREE_WHITE_SOLDIERS: PatternSpec = PatternSpec {
    name: "three_white_soldiers",
    kind: PatternKind::Continuation,
    direction: PatternDirection::Bullish,
    base_confidence: 75.0,
    boost_positive: 1.6,
    boost_negative: 0.5,
    boost_neutral: 1.0,
};

pub const THREE_BLACK_CROWS: PatternSpec = PatternSpec {
    name: "three_black_crows",
    kind: PatternKind::Continuation,
    direction: PatternDirection::Bearish,
    base_confidence: 75.0,
    boost_positive: 0.5,
    boost_negative: 1.6,
    boost_neutral: 1.0,
};

pub const GAP_UP: PatternSpec = PatternSpec {
    name: "gap_up",
    kind: PatternKind::Momentum,
    direction: PatternDirection::Bullish,
    base_confidence: 70.0,
    boost_positive: 1.7,
    boost_negative: 0.4,
    boost_neutral: 1.0,
};

pub const GAP_DOWN: PatternSpec = PatternSpec {
    name: "gap_down",
    kind: PatternKind::Momentum,
    direction: PatternDirection::Bearish,
    base_confidence: 70.0,
    boost_positive: 0.4,
    boost_negative: 1.7,
    boost_neutral: 1.0,
};

pub const VOLUME_SURGE: PatternSpec = PatternSpec {
    name: "volume_surge",
    kind: PatternKind::Momentum,
    direction: PatternDirection::Neutral,
    base_confidence: 65.0,
    boost_positive: 1.4,
    boost_negative: 1.4,
    boost_neutral: 1.0,
};

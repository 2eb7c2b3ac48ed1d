//! Technical indicators computed over OHLCV history.
//!
//! Pure functions over `&[Bar]`. Each returns `None` when the series is
//! too short for the requested period rather than guessing.

use serde::{Deserialize, Serialize};

use crate::domain::bar::Bar;

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Price trend relative to the moving averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Sideways,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Snapshot of every indicator the signal generator consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    pub macd: Option<Macd>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub ema_9: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub trend: Trend,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    pub last_close: f64,
}

impl IndicatorSnapshot {
    pub fn compute(bars: &[Bar]) -> Option<Self> {
        let last = bars.last()?;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let sma_20 = sma(&closes, 20);
        let sma_50 = sma(&closes, 50);
        Some(Self {
            rsi: rsi(&closes, RSI_PERIOD),
            macd: macd(&closes),
            sma_20,
            sma_50,
            ema_9: ema(&closes, 9),
            volume_ratio: volume_ratio(bars, 20),
            trend: trend(last.close, sma_20, sma_50),
            support: rolling_low(bars, 20),
            resistance: rolling_high(bars, 20),
            last_close: last.close,
        })
    }
}

/// Simple moving average of the final `period` values.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let tail = &values[values.len() - period..];
    Some(tail.iter().sum::<f64>() / period as f64)
}

/// Exponential moving average seeded with the SMA of the first period.
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    for v in &values[period..] {
        current = v * k + current * (1.0 - k);
    }
    Some(current)
}

/// Wilder RSI: SMA seed for the first period, smoothed thereafter.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() < period + 1 {
        return None;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for w in closes[..period + 1].windows(2) {
        let delta = w[1] - w[0];
        if delta > 0.0 {
            gains += delta;
        } else {
            losses -= delta;
        }
    }
    let mut avg_gain = gains / period as f64;
    let mut avg_loss = losses / period as f64;

    for w in closes[period..].windows(2) {
        let delta = w[1] - w[0];
        let (gain, loss) = if delta > 0.0 { (delta, 0.0) } else { (0.0, -delta) };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// MACD(12, 26, 9). The signal line is the EMA of the MACD series itself,
/// so the input needs slow + signal periods of history.
pub fn macd(closes: &[f64]) -> Option<Macd> {
    if closes.len() < MACD_SLOW + MACD_SIGNAL {
        return None;
    }

    let series: Vec<f64> = (MACD_SLOW..=closes.len())
        .filter_map(|end| {
            let window = &closes[..end];
            match (ema(window, MACD_FAST), ema(window, MACD_SLOW)) {
                (Some(fast), Some(slow)) => Some(fast - slow),
                _ => None,
            }
        })
        .collect();

    let line = *series.last()?;
    let signal = ema(&series, MACD_SIGNAL)?;
    Some(Macd { line, signal, histogram: line - signal })
}

/// Last bar's volume relative to the average of the preceding `period` bars.
pub fn volume_ratio(bars: &[Bar], period: usize) -> Option<f64> {
    if bars.len() < period + 1 {
        return None;
    }
    let window = &bars[bars.len() - period - 1..bars.len() - 1];
    let avg = window.iter().map(|b| b.volume).sum::<f64>() / period as f64;
    if avg <= 0.0 {
        return None;
    }
    Some(bars[bars.len() - 1].volume / avg)
}

pub fn rolling_low(bars: &[Bar], period: usize) -> Option<f64> {
    if bars.is_empty() {
        return None;
    }
    let start = bars.len().saturating_sub(period);
    bars[start..].iter().map(|b| b.low).min_by(|a, b| a.total_cmp(b))
}

pub fn rolling_high(bars: &[Bar], period: usize) -> Option<f64> {
    if bars.is_empty() {
        return None;
    }
    let start = bars.len().saturating_sub(period);
    bars[start..].iter().map(|b| b.high).max_by(|a, b| a.total_cmp(b))
}

/// Classify trend from the close against both moving averages.
pub fn trend(close: f64, sma_20: Option<f64>, sma_50: Option<f64>) -> Trend {
    match (sma_20, sma_50) {
        (Some(fast), Some(slow)) => {
            if close > fast && fast > slow {
                Trend::Up
            } else if close < fast && fast < slow {
                Trend::Down
            } else {
                Trend::Sideways
            }
        }
        (Some(fast), None) => {
            if close > fast {
                Trend::Up
            } else if close < fast {
                Trend::Down
            } else {
                Trend::Sideways
            }
        }
        _ => Trend::Sideways,
    }
}

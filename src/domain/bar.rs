//! OHLCV bars, quotes and the market session clock.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// One OHLCV candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Last traded price for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// Trading session buckets of the exchange day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketSession {
    PreMarket,
    Regular,
    AfterHours,
    Closed,
}

impl MarketSession {
    /// Classify a UTC instant given the exchange offset from UTC in hours.
    ///
    /// Session boundaries use the standard US equity clock:
    /// pre-market 04:00-09:30, regular 09:30-16:00, after-hours 16:00-20:00,
    /// all exchange-local. Weekends are always `Closed`.
    pub fn at(now: DateTime<Utc>, utc_offset_hours: i64) -> Self {
        let local = now + Duration::hours(utc_offset_hours);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return MarketSession::Closed;
        }

        let minutes = local.hour() as u32 * 60 + local.minute();
        match minutes {
            m if (240..570).contains(&m) => MarketSession::PreMarket,
            m if (570..960).contains(&m) => MarketSession::Regular,
            m if (960..1200).contains(&m) => MarketSession::AfterHours,
            _ => MarketSession::Closed,
        }
    }

    pub fn is_tradable(&self) -> bool {
        matches!(self, MarketSession::PreMarket | MarketSession::Regular | MarketSession::AfterHours)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketSession::PreMarket => "pre_market",
            MarketSession::Regular => "regular",
            MarketSession::AfterHours => "after_hours",
            MarketSession::Closed => "closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: Utc::now(),
            open,
            high,
            low,
            close,
            volume: 1_000.0,
        }
    }

    #[test]
    fn test_bar_geometry() {
        let b = bar(10.0, 12.0, 9.0, 11.0);
        assert_eq!(b.body(), 1.0);
        assert_eq!(b.range(), 3.0);
        assert_eq!(b.upper_shadow(), 1.0);
        assert_eq!(b.lower_shadow(), 1.0);
        assert!(b.is_bullish());
        assert!(!b.is_bearish());
    }

    #[test]
    fn test_session_regular_hours() {
        // Wednesday 2025-06-11 14:00 UTC = 10:00 exchange-local at -4
        let t = Utc.with_ymd_and_hms(2025, 6, 11, 14, 0, 0).unwrap();
        assert_eq!(MarketSession::at(t, -4), MarketSession::Regular);
    }

    #[test]
    fn test_session_pre_market() {
        // 08:15 local
        let t = Utc.with_ymd_and_hms(2025, 6, 11, 12, 15, 0).unwrap();
        assert_eq!(MarketSession::at(t, -4), MarketSession::PreMarket);
    }

    #[test]
    fn test_session_after_hours() {
        // 17:30 local
        let t = Utc.with_ymd_and_hms(2025, 6, 11, 21, 30, 0).unwrap();
        assert_eq!(MarketSession::at(t, -4), MarketSession::AfterHours);
    }

    #[test]
    fn test_session_weekend_closed() {
        // Saturday midday
        let t = Utc.with_ymd_and_hms(2025, 6, 14, 15, 0, 0).unwrap();
        assert_eq!(MarketSession::at(t, -4), MarketSession::Closed);
    }

    #[test]
    fn test_session_overnight_closed() {
        // 02:00 local
        let t = Utc.with_ymd_and_hms(2025, 6, 11, 6, 0, 0).unwrap();
        assert_eq!(MarketSession::at(t, -4), MarketSession::Closed);
        assert!(!MarketSession::Closed.is_tradable());
    }

    #[test]
    fn test_session_open_boundary() {
        // 09:30 local is the first regular minute
        let t = Utc.with_ymd_and_hms(2025, 6, 11, 13, 30, 0).unwrap();
        assert_eq!(MarketSession::at(t, -4), MarketSession::Regular);
    }
}

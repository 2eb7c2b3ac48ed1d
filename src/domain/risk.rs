//! Admission-control limits applied before any order is placed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::bar::MarketSession;

/// Structured reason an order was refused. These are expected outcomes,
/// not failures, and are logged rather than propagated.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum RiskRejection {
    #[error("Maximum open positions reached ({0})")]
    MaxPositionsReached(usize),

    #[error("Position already open for {0}")]
    DuplicateSymbol(String),

    #[error("Daily loss {loss_pct:.2}% breached limit {limit_pct:.2}%")]
    DailyLossLimit { loss_pct: f64, limit_pct: f64 },

    #[error("Price {price:.2} outside tradable band [{min:.2}, {max:.2}]")]
    PriceOutOfBand { price: f64, min: f64, max: f64 },

    #[error("Market is closed")]
    MarketClosed,

    #[error("Insufficient buying power: need {needed:.2}, have {available:.2}")]
    InsufficientBuyingPower { needed: f64, available: f64 },
}

/// Static risk limits, built from config once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLimits {
    pub max_open_positions: usize,
    pub max_daily_loss_pct: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Per-trade cap on buying power in pre-market, percent.
    pub pre_market_cap_pct: f64,
    /// Per-trade cap on buying power in regular/after hours, percent.
    pub regular_cap_pct: f64,
    /// Close positions held longer than this many minutes. Zero disables.
    pub max_holding_minutes: i64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_open_positions: 5,
            max_daily_loss_pct: 5.0,
            min_price: 1.0,
            max_price: 10_000.0,
            pre_market_cap_pct: 10.0,
            regular_cap_pct: 20.0,
            max_holding_minutes: 0,
        }
    }
}

impl RiskLimits {
    pub fn check_open_positions(&self, open: usize) -> Result<(), RiskRejection> {
        if open >= self.max_open_positions {
            Err(RiskRejection::MaxPositionsReached(self.max_open_positions))
        } else {
            Ok(())
        }
    }

    pub fn check_price_band(&self, price: f64) -> Result<(), RiskRejection> {
        if price < self.min_price || price > self.max_price {
            Err(RiskRejection::PriceOutOfBand {
                price,
                min: self.min_price,
                max: self.max_price,
            })
        } else {
            Ok(())
        }
    }

    pub fn check_daily_loss(&self, realized_loss_pct: f64) -> Result<(), RiskRejection> {
        if realized_loss_pct >= self.max_daily_loss_pct {
            Err(RiskRejection::DailyLossLimit {
                loss_pct: realized_loss_pct,
                limit_pct: self.max_daily_loss_pct,
            })
        } else {
            Ok(())
        }
    }

    /// Session-dependent cap on the fraction of buying power a single
    /// trade may consume, in percent.
    pub fn session_cap_pct(&self, session: MarketSession) -> f64 {
        match session {
            MarketSession::PreMarket => self.pre_market_cap_pct,
            _ => self.regular_cap_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_position_limit() {
        let limits = RiskLimits::default();
        assert!(limits.check_open_positions(4).is_ok());
        assert!(matches!(
            limits.check_open_positions(5),
            Err(RiskRejection::MaxPositionsReached(5))
        ));
    }

    #[test]
    fn test_price_band() {
        let limits = RiskLimits::default();
        assert!(limits.check_price_band(50.0).is_ok());
        assert!(limits.check_price_band(0.5).is_err());
        assert!(limits.check_price_band(20_000.0).is_err());
    }

    #[test]
    fn test_daily_loss_limit() {
        let limits = RiskLimits::default();
        assert!(limits.check_daily_loss(3.0).is_ok());
        assert!(limits.check_daily_loss(5.0).is_err());
        assert!(limits.check_daily_loss(7.5).is_err());
    }

    #[test]
    fn test_session_caps() {
        let limits = RiskLimits::default();
        assert_eq!(limits.session_cap_pct(MarketSession::PreMarket), 10.0);
        assert_eq!(limits.session_cap_pct(MarketSession::Regular), 20.0);
        assert_eq!(limits.session_cap_pct(MarketSession::AfterHours), 20.0);
    }
}

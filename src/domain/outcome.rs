//! Closed-trade outcomes and performance window math.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::news::CatalystType;
use crate::domain::position::{ExitReason, Side, Trade};
use crate::domain::signal::{CatalystStrength, ComponentScores, Signal};

/// Everything needed to evaluate a signal after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub trade_id: String,
    pub signal_id: String,
    pub symbol: String,
    pub side: Side,
    pub components: ComponentScores,
    pub confidence: f64,
    pub catalyst_type: CatalystType,
    pub catalyst_strength: CatalystStrength,
    pub pattern: Option<String>,
    pub exit_reason: ExitReason,
    pub realized_pnl: f64,
    pub holding_minutes: i64,
    pub closed_at: DateTime<Utc>,
}

impl OutcomeRecord {
    /// Build from a closed trade and its originating signal.
    /// Returns None while the trade still lacks an exit fill.
    pub fn from_closed(trade: &Trade, signal: &Signal) -> Option<Self> {
        let realized_pnl = trade.realized_pnl()?;
        let exit_reason = trade.exit_reason?;
        let closed_at = trade.closed_at?;
        Some(Self {
            trade_id: trade.id.clone(),
            signal_id: signal.id.clone(),
            symbol: trade.symbol.clone(),
            side: trade.side,
            components: signal.components,
            confidence: signal.confidence,
            catalyst_type: signal.catalyst_type,
            catalyst_strength: signal.catalyst_strength,
            pattern: signal.pattern.clone(),
            exit_reason,
            realized_pnl,
            holding_minutes: trade.holding_minutes(closed_at),
            closed_at,
        })
    }

    pub fn is_win(&self) -> bool {
        self.realized_pnl > 0.0
    }
}

/// Aggregate statistics over a set of outcomes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_pnl: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub avg_holding_minutes: f64,
    pub by_catalyst: HashMap<String, CatalystBreakdown>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalystBreakdown {
    pub trades: usize,
    pub wins: usize,
    pub total_pnl: f64,
}

impl PerformanceSummary {
    pub fn from_outcomes(outcomes: &[OutcomeRecord]) -> Self {
        if outcomes.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            trades: outcomes.len(),
            best_trade: f64::NEG_INFINITY,
            worst_trade: f64::INFINITY,
            ..Default::default()
        };

        let mut holding_total = 0i64;
        for o in outcomes {
            if o.is_win() {
                summary.wins += 1;
            } else {
                summary.losses += 1;
            }
            summary.total_pnl += o.realized_pnl;
            summary.best_trade = summary.best_trade.max(o.realized_pnl);
            summary.worst_trade = summary.worst_trade.min(o.realized_pnl);
            holding_total += o.holding_minutes;

            let entry = summary
                .by_catalyst
                .entry(o.catalyst_type.as_str().to_string())
                .or_default();
            entry.trades += 1;
            if o.is_win() {
                entry.wins += 1;
            }
            entry.total_pnl += o.realized_pnl;
        }

        summary.win_rate = summary.wins as f64 / summary.trades as f64;
        summary.avg_pnl = summary.total_pnl / summary.trades as f64;
        summary.avg_holding_minutes = holding_total as f64 / summary.trades as f64;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn outcome(pnl: f64, catalyst: CatalystType, minutes: i64) -> OutcomeRecord {
        OutcomeRecord {
            trade_id: "t".into(),
            signal_id: "s".into(),
            symbol: "AAPL".into(),
            side: Side::Long,
            components: ComponentScores {
                catalyst: 70.0,
                pattern: 60.0,
                indicator: 55.0,
                volume: 50.0,
            },
            confidence: 65.0,
            catalyst_type: catalyst,
            catalyst_strength: CatalystStrength::Strong,
            pattern: Some("hammer".into()),
            exit_reason: ExitReason::Target2,
            realized_pnl: pnl,
            holding_minutes: minutes,
            closed_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_summary() {
        let s = PerformanceSummary::from_outcomes(&[]);
        assert_eq!(s.trades, 0);
        assert_eq!(s.total_pnl, 0.0);
    }

    #[test]
    fn test_summary_math() {
        let outcomes = vec![
            outcome(100.0, CatalystType::EarningsBeat, 60),
            outcome(-40.0, CatalystType::EarningsBeat, 30),
            outcome(25.0, CatalystType::FdaApproval, 90),
        ];
        let s = PerformanceSummary::from_outcomes(&outcomes);

        assert_eq!(s.trades, 3);
        assert_eq!(s.wins, 2);
        assert_eq!(s.losses, 1);
        assert_relative_eq!(s.win_rate, 2.0 / 3.0);
        assert_relative_eq!(s.total_pnl, 85.0);
        assert_relative_eq!(s.best_trade, 100.0);
        assert_relative_eq!(s.worst_trade, -40.0);
        assert_relative_eq!(s.avg_holding_minutes, 60.0);

        let earnings = &s.by_catalyst["earnings_beat"];
        assert_eq!(earnings.trades, 2);
        assert_eq!(earnings.wins, 1);
        assert_relative_eq!(earnings.total_pnl, 60.0);
    }
}

//! Outcome collection: turns stored outcomes into performance windows.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::domain::outcome::{OutcomeRecord, PerformanceSummary};
use crate::storage::{Store, StoreError};

/// Read-side companion to the execution engine. Outcome records are
/// written at close time; this answers questions about them.
#[derive(Clone)]
pub struct OutcomeCollector {
    store: Arc<dyn Store>,
}

impl OutcomeCollector {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn outcomes_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<OutcomeRecord>, StoreError> {
        self.store.outcomes_since(since).await
    }

    pub async fn performance_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<PerformanceSummary, StoreError> {
        let outcomes = self.store.outcomes_since(since).await?;
        Ok(PerformanceSummary::from_outcomes(&outcomes))
    }

    /// Performance over the current session day.
    pub async fn today(&self) -> Result<PerformanceSummary, StoreError> {
        self.performance_since(Utc::now() - Duration::hours(24)).await
    }

    /// Trailing window used by the periodic review log line.
    pub async fn trailing_days(&self, days: i64) -> Result<PerformanceSummary, StoreError> {
        self.performance_since(Utc::now() - Duration::days(days)).await
    }

    pub async fn log_review(&self, days: i64) -> Result<(), StoreError> {
        let summary = self.trailing_days(days).await?;
        if summary.trades == 0 {
            tracing::info!(days, "no closed trades in review window");
            return Ok(());
        }
        tracing::info!(
            days,
            trades = summary.trades,
            win_rate = format!("{:.1}%", summary.win_rate * 100.0),
            total_pnl = format!("{:.2}", summary.total_pnl),
            avg_holding_minutes = format!("{:.0}", summary.avg_holding_minutes),
            "performance review"
        );
        for (catalyst, breakdown) in &summary.by_catalyst {
            tracing::info!(
                catalyst = %catalyst,
                trades = breakdown.trades,
                wins = breakdown.wins,
                pnl = format!("{:.2}", breakdown.total_pnl),
                "catalyst breakdown"
            );
        }
        Ok(())
    }
}

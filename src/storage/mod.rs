//! Storage Layer - explicit persistence seam for signals, trades,
//! cycles and outcomes.
//!
//! The pipeline is constructed with exactly one `Store` implementation;
//! there is no implicit fallback. `MemoryStore` backs tests and paper
//! runs, `snapshot` adds JSON crash recovery for open trades.

pub mod snapshot;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::cycle::Cycle;
use crate::domain::outcome::OutcomeRecord;
use crate::domain::position::Trade;
use crate::domain::signal::Signal;

pub use snapshot::TradeSnapshot;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn save_signal(&self, signal: &Signal) -> Result<(), StoreError>;
    async fn signal(&self, id: &str) -> Result<Option<Signal>, StoreError>;

    async fn upsert_trade(&self, trade: &Trade) -> Result<(), StoreError>;
    async fn trades(&self) -> Result<Vec<Trade>, StoreError>;

    async fn save_cycle(&self, cycle: &Cycle) -> Result<(), StoreError>;
    async fn recent_cycles(&self, limit: usize) -> Result<Vec<Cycle>, StoreError>;

    async fn record_outcome(&self, outcome: &OutcomeRecord) -> Result<(), StoreError>;
    async fn outcomes_since(&self, since: DateTime<Utc>) -> Result<Vec<OutcomeRecord>, StoreError>;
}

/// In-memory store. Cheap clones share the same underlying maps.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    signals: Arc<RwLock<HashMap<String, Signal>>>,
    trades: Arc<RwLock<HashMap<String, Trade>>>,
    cycles: Arc<RwLock<Vec<Cycle>>>,
    outcomes: Arc<RwLock<Vec<OutcomeRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn save_signal(&self, signal: &Signal) -> Result<(), StoreError> {
        self.signals.write().await.insert(signal.id.clone(), signal.clone());
        Ok(())
    }

    async fn signal(&self, id: &str) -> Result<Option<Signal>, StoreError> {
        Ok(self.signals.read().await.get(id).cloned())
    }

    async fn upsert_trade(&self, trade: &Trade) -> Result<(), StoreError> {
        self.trades.write().await.insert(trade.id.clone(), trade.clone());
        Ok(())
    }

    async fn trades(&self) -> Result<Vec<Trade>, StoreError> {
        Ok(self.trades.read().await.values().cloned().collect())
    }

    async fn save_cycle(&self, cycle: &Cycle) -> Result<(), StoreError> {
        let mut cycles = self.cycles.write().await;
        if let Some(existing) = cycles.iter_mut().find(|c| c.id == cycle.id) {
            *existing = cycle.clone();
        } else {
            cycles.push(cycle.clone());
        }
        Ok(())
    }

    async fn recent_cycles(&self, limit: usize) -> Result<Vec<Cycle>, StoreError> {
        let cycles = self.cycles.read().await;
        let start = cycles.len().saturating_sub(limit);
        Ok(cycles[start..].to_vec())
    }

    async fn record_outcome(&self, outcome: &OutcomeRecord) -> Result<(), StoreError> {
        self.outcomes.write().await.push(outcome.clone());
        Ok(())
    }

    async fn outcomes_since(&self, since: DateTime<Utc>) -> Result<Vec<OutcomeRecord>, StoreError> {
        Ok(self
            .outcomes
            .read()
            .await
            .iter()
            .filter(|o| o.closed_at >= since)
            .cloned()
            .collect())
    }
}

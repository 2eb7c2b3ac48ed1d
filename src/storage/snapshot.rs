//! JSON snapshot of open trades for crash recovery.
//!
//! Written after every entry and exit; loaded once at startup so a
//! restarted engine keeps monitoring positions it already holds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::position::Trade;
use crate::storage::StoreError;

pub const SNAPSHOT_FILE: &str = "open_trades.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSnapshot {
    pub open_trades: Vec<Trade>,
    pub saved_at: DateTime<Utc>,
}

impl TradeSnapshot {
    pub fn new(open_trades: Vec<Trade>) -> Self {
        Self { open_trades, saved_at: Utc::now() }
    }

    /// Missing file means a fresh start, not an error.
    pub fn load(path: &Path) -> Result<Option<Self>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let snapshot: Self = serde_json::from_str(&content)?;
        Ok(Some(snapshot))
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::Side;
    use tempfile::TempDir;

    fn trade(id: &str) -> Trade {
        let mut t = Trade::new(
            id.into(), "s-1".into(), "AAPL".into(),
            Side::Long, 10.0, 100.0, 98.0, 103.0, 106.0,
        )
        .unwrap();
        t.mark_open(100.0).unwrap();
        t
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SNAPSHOT_FILE);

        let snapshot = TradeSnapshot::new(vec![trade("t-1"), trade("t-2")]);
        snapshot.save(&path).unwrap();

        let loaded = TradeSnapshot::load(&path).unwrap().unwrap();
        assert_eq!(loaded.open_trades.len(), 2);
        assert_eq!(loaded.open_trades[0].id, "t-1");
        assert!(loaded.open_trades[0].is_open());
    }

    #[test]
    fn test_missing_file_is_fresh_start() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SNAPSHOT_FILE);
        assert!(TradeSnapshot::load(&path).unwrap().is_none());
    }

    #[test]
    fn test_save_creates_parent_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(SNAPSHOT_FILE);
        TradeSnapshot::new(vec![]).save(&path).unwrap();
        assert!(path.exists());
    }
}

//! Small TTL cache for scan results.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::scanner::Candidate;

/// Scan results keyed by an arbitrary tag (session name in practice),
/// expiring after a fixed TTL. Clones share the same map.
#[derive(Debug, Clone)]
pub struct ScanCache {
    entries: Arc<RwLock<HashMap<String, (Instant, Vec<Candidate>)>>>,
    ttl: Duration,
}

impl ScanCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())), ttl }
    }

    pub async fn get(&self, key: &str) -> Option<Vec<Candidate>> {
        let entries = self.entries.read().await;
        let (stored_at, candidates) = entries.get(key)?;
        if stored_at.elapsed() >= self.ttl {
            return None;
        }
        Some(candidates.clone())
    }

    pub async fn put(&self, key: &str, candidates: Vec<Candidate>) {
        self.entries.write().await.insert(key.to_string(), (Instant::now(), candidates));
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

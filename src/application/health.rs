//! Dependency health loop: pings market data, news and broker on an
//! interval and keeps the latest status per dependency.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::ports::broker::BrokerPort;
use crate::ports::market_data::MarketDataPort;
use crate::ports::news::NewsFeedPort;

#[derive(Debug, Clone)]
pub struct DependencyHealth {
    pub healthy: bool,
    pub last_checked: DateTime<Utc>,
    pub detail: Option<String>,
}

pub struct HealthMonitor {
    market_data: Arc<dyn MarketDataPort>,
    news: Arc<dyn NewsFeedPort>,
    broker: Arc<dyn BrokerPort>,
    interval: Duration,
    is_running: Arc<RwLock<bool>>,
    statuses: Arc<RwLock<HashMap<&'static str, DependencyHealth>>>,
}

impl Clone for HealthMonitor {
    fn clone(&self) -> Self {
        Self {
            market_data: self.market_data.clone(),
            news: self.news.clone(),
            broker: self.broker.clone(),
            interval: self.interval,
            is_running: self.is_running.clone(),
            statuses: self.statuses.clone(),
        }
    }
}

impl HealthMonitor {
    pub fn new(
        market_data: Arc<dyn MarketDataPort>,
        news: Arc<dyn NewsFeedPort>,
        broker: Arc<dyn BrokerPort>,
    ) -> Self {
        Self {
            market_data,
            news,
            broker,
            interval: Duration::from_secs(30),
            is_running: Arc::new(RwLock::new(false)),
            statuses: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn run(&self) {
        {
            let mut running = self.is_running.write().await;
            if *running {
                tracing::warn!("health monitor already running");
                return;
            }
            *running = true;
        }
        tracing::info!(interval_secs = self.interval.as_secs(), "health monitor started");

        while *self.is_running.read().await {
            self.tick().await;
            tokio::time::sleep(self.interval).await;
        }
        tracing::info!("health monitor stopped");
    }

    pub async fn stop(&self) {
        *self.is_running.write().await = false;
    }

    pub async fn tick(&self) {
        let market = self.market_data.health_check().await.map_err(|e| e.to_string());
        let news = self.news.health_check().await.map_err(|e| e.to_string());
        let broker = self.broker.health_check().await.map_err(|e| e.to_string());

        let mut statuses = self.statuses.write().await;
        for (name, result) in [("market_data", market), ("news", news), ("broker", broker)] {
            let health = DependencyHealth {
                healthy: result.is_ok(),
                last_checked: Utc::now(),
                detail: result.err(),
            };
            if !health.healthy {
                tracing::warn!(
                    dependency = name,
                    detail = health.detail.as_deref().unwrap_or(""),
                    "dependency unhealthy"
                );
            }
            statuses.insert(name, health);
        }
    }

    pub async fn snapshot(&self) -> HashMap<&'static str, DependencyHealth> {
        self.statuses.read().await.clone()
    }

    pub async fn all_healthy(&self) -> bool {
        let statuses = self.statuses.read().await;
        !statuses.is_empty() && statuses.values().all(|h| h.healthy)
    }
}

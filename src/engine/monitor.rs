//! Position monitor: polls quotes for open trades and enforces exits.
//!
//! Checks run in priority order: stop loss first, then target 2, then the
//! target-1 touch (bookkeeping only), then the time stop. Quote lookups get
//! one retry because quotes are idempotent; order placement never does.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::domain::position::{ExitReason, Side, Trade};
use crate::engine::execution::{ExecutionEngine, ExecutionError};
use crate::ports::market_data::MarketDataPort;

const QUOTE_RETRY_DELAY_MS: u64 = 250;

pub struct PositionMonitor {
    engine: ExecutionEngine,
    market_data: Arc<dyn MarketDataPort>,
    interval: Duration,
    is_running: Arc<RwLock<bool>>,
}

impl Clone for PositionMonitor {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            market_data: self.market_data.clone(),
            interval: self.interval,
            is_running: self.is_running.clone(),
        }
    }
}

impl PositionMonitor {
    pub fn new(engine: ExecutionEngine, market_data: Arc<dyn MarketDataPort>) -> Self {
        Self {
            engine,
            market_data,
            interval: Duration::from_secs(30),
            is_running: Arc::new(RwLock::new(false)),
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
                tracing::warn!("position monitor already running");
                return;
            }
            *running = true;
        }
        tracing::info!(interval_secs = self.interval.as_secs(), "position monitor started");

        while *self.is_running.read().await {
            if let Err(e) = self.tick().await {
                tracing::error!(error = %e, "monitor tick failed");
            }
            tokio::time::sleep(self.interval).await;
        }
        tracing::info!("position monitor stopped");
    }

    pub async fn stop(&self) {
        *self.is_running.write().await = false;
    }

    /// One pass over all open trades.
    pub async fn tick(&self) -> Result<(), ExecutionError> {
        let trades = self.engine.open_trades().await;
        for trade in trades {
            if let Err(e) = self.check_trade(&trade).await {
                tracing::error!(symbol = %trade.symbol, error = %e, "trade check failed");
            }
        }
        Ok(())
    }

    async fn check_trade(&self, trade: &Trade) -> Result<(), ExecutionError> {
        let price = match self.quote_with_retry(&trade.symbol).await {
            Some(p) => p,
            None => {
                tracing::warn!(symbol = %trade.symbol, "quote unavailable, holding position");
                return Ok(());
            }
        };

        let marked = match self.engine.mark_trade(&trade.symbol, price).await {
            Some(t) => t,
            // Closed by a concurrent tick between listing and marking
            None => return Ok(()),
        };

        if stop_hit(&marked, price) {
            tracing::warn!(symbol = %marked.symbol, price, stop = marked.stop_loss, "stop loss hit");
            self.engine.close_trade(&marked.symbol, ExitReason::StopLoss, price).await?;
            return Ok(());
        }

        if target_hit(&marked, marked.target_2, price) {
            tracing::info!(symbol = %marked.symbol, price, target = marked.target_2, "target 2 hit");
            self.engine.close_trade(&marked.symbol, ExitReason::Target2, price).await?;
            return Ok(());
        }

        if !marked.target_1_hit && target_hit(&marked, marked.target_1, price) {
            if self.engine.mark_target_1(&marked.symbol).await {
                tracing::info!(
                    symbol = %marked.symbol,
                    price,
                    target = marked.target_1,
                    "target 1 touched, tightening watch"
                );
            }
        }

        let max_minutes = self.engine.limits().max_holding_minutes;
        if max_minutes > 0 && marked.holding_minutes(chrono::Utc::now()) >= max_minutes {
            tracing::info!(symbol = %marked.symbol, max_minutes, "time stop reached");
            self.engine.close_trade(&marked.symbol, ExitReason::TimeStop, price).await?;
        }

        Ok(())
    }

    async fn quote_with_retry(&self, symbol: &str) -> Option<f64> {
        match self.market_data.last_quote(symbol).await {
            Ok(q) => return Some(q.price),
            Err(e) => {
                tracing::debug!(symbol, error = %e, "quote failed, retrying once");
            }
        }
        tokio::time::sleep(Duration::from_millis(QUOTE_RETRY_DELAY_MS)).await;
        self.market_data.last_quote(symbol).await.ok().map(|q| q.price)
    }
}

fn stop_hit(trade: &Trade, price: f64) -> bool {
    match trade.side {
        Side::Long => price <= trade.stop_loss,
        Side::Short => price >= trade.stop_loss,
    }
}

fn target_hit(trade: &Trade, target: f64, price: f64) -> bool {
    match trade.side {
        Side::Long => price >= target,
        Side::Short => price <= target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::MarketSession;
    use crate::domain::news::{CatalystType, Sentiment};
    use crate::domain::position::PositionStatus;
    use crate::domain::risk::RiskLimits;
    use crate::domain::signal::{CatalystStrength, ComponentScores, Signal, SignalType};
    use crate::engine::execution::EngineConfig;
    use crate::ports::mocks::{MockBroker, MockMarketData};
    use crate::storage::{MemoryStore, Store};
    use chrono::Utc;

    fn buy_signal(symbol: &str, entry: f64) -> Signal {
        Signal {
            id: format!("sig-{}", symbol.to_lowercase()),
            symbol: symbol.into(),
            signal_type: SignalType::Buy,
            confidence: 75.0,
            catalyst_strength: CatalystStrength::Strong,
            components: ComponentScores { catalyst: 80.0, pattern: 70.0, indicator: 60.0, volume: 70.0 },
            catalyst_type: CatalystType::EarningsBeat,
            catalyst_sentiment: Sentiment::Positive,
            pattern: None,
            entry_price: entry,
            stop_loss: entry * 0.98,
            target_1: entry * 1.03,
            target_2: entry * 1.06,
            position_pct: 100.0,
            risk_reward_ratio: 1.5,
            key_factors: vec![],
            generated_at: Utc::now(),
        }
    }

    async fn open_position(market: &MockMarketData) -> (PositionMonitor, ExecutionEngine) {
        let store = Arc::new(MemoryStore::new());
        let engine = ExecutionEngine::new(
            Arc::new(MockBroker::new()),
            store.clone() as Arc<dyn Store>,
            EngineConfig::default(),
        );
        let signal = buy_signal("AAPL", 100.0);
        store.save_signal(&signal).await.unwrap();
        engine.execute_signal(&signal, MarketSession::Regular).await.unwrap();

        let monitor = PositionMonitor::new(engine.clone(), Arc::new(market.clone()));
        (monitor, engine)
    }

    #[tokio::test]
    async fn test_stop_loss_closes_position() {
        let market = MockMarketData::new().with_quote("AAPL", 97.0);
        let (monitor, engine) = open_position(&market).await;

        monitor.tick().await.unwrap();

        assert_eq!(engine.open_count().await, 0);
        assert!(engine.daily_realized_pnl().await < 0.0);
    }

    #[tokio::test]
    async fn test_target_2_closes_position() {
        let market = MockMarketData::new().with_quote("AAPL", 106.5);
        let (monitor, engine) = open_position(&market).await;

        monitor.tick().await.unwrap();
        assert_eq!(engine.open_count().await, 0);
        assert!(engine.daily_realized_pnl().await > 0.0);
    }

    #[tokio::test]
    async fn test_target_1_marks_without_closing() {
        let market = MockMarketData::new().with_quote("AAPL", 103.5);
        let (monitor, engine) = open_position(&market).await;

        monitor.tick().await.unwrap();

        let trades = engine.open_trades().await;
        assert_eq!(trades.len(), 1);
        assert!(trades[0].target_1_hit);

        // A second tick at the same price does not re-mark or close
        monitor.tick().await.unwrap();
        assert_eq!(engine.open_count().await, 1);
    }

    #[tokio::test]
    async fn test_quiet_price_leaves_position_alone() {
        let market = MockMarketData::new().with_quote("AAPL", 101.0);
        let (monitor, engine) = open_position(&market).await;

        monitor.tick().await.unwrap();

        let trades = engine.open_trades().await;
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].status, PositionStatus::Open);
        assert_eq!(trades[0].last_price, 101.0);
        assert_eq!(trades[0].high_water_mark, 101.0);
    }

    #[tokio::test]
    async fn test_missing_quote_holds_position() {
        // No quote configured at all: both attempts fail
        let market = MockMarketData::new();
        let (monitor, engine) = open_position(&market).await;

        monitor.tick().await.unwrap();
        assert_eq!(engine.open_count().await, 1);
    }

    #[tokio::test]
    async fn test_time_stop_closes_stale_position() {
        use crate::domain::position::{Side, Trade};
        use crate::storage::snapshot::{TradeSnapshot, SNAPSHOT_FILE};

        // Recover a trade opened two hours ago from a snapshot
        let dir = tempfile::TempDir::new().unwrap();
        let mut trade = Trade::new(
            "trade-1".into(), "sig-aapl".into(), "AAPL".into(),
            Side::Long, 10.0, 100.0, 98.0, 103.0, 106.0,
        )
        .unwrap();
        trade.mark_open(100.0).unwrap();
        trade.opened_at = Utc::now() - chrono::Duration::hours(2);
        TradeSnapshot::new(vec![trade]).save(&dir.path().join(SNAPSHOT_FILE)).unwrap();

        let mut limits = RiskLimits::default();
        limits.max_holding_minutes = 60;
        let store = Arc::new(MemoryStore::new());
        store.save_signal(&buy_signal("AAPL", 100.0)).await.unwrap();
        let engine = ExecutionEngine::new(
            Arc::new(MockBroker::new()),
            store as Arc<dyn Store>,
            EngineConfig { limits, snapshot_dir: Some(dir.path().to_path_buf()) },
        );
        assert_eq!(engine.recover().await.unwrap(), 1);

        let market = MockMarketData::new().with_quote("AAPL", 100.5);
        let monitor = PositionMonitor::new(engine.clone(), Arc::new(market));
        monitor.tick().await.unwrap();

        assert_eq!(engine.open_count().await, 0);
    }

    #[tokio::test]
    async fn test_time_stop_disabled_by_default() {
        let market = MockMarketData::new().with_quote("AAPL", 100.5);
        let (monitor, engine) = open_position(&market).await;

        monitor.tick().await.unwrap();
        assert_eq!(engine.open_count().await, 1);
        assert_eq!(engine.limits().max_holding_minutes, 0);
    }

    #[tokio::test]
    async fn test_run_and_stop() {
        let market = MockMarketData::new().with_quote("AAPL", 100.5);
        let (monitor, _engine) = open_position(&market).await;
        let monitor = Arc::new(monitor.with_interval(Duration::from_millis(10)));

        let runner = Arc::clone(&monitor);
        let handle = tokio::spawn(async move { runner.run().await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        monitor.stop().await;
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor should stop")
            .unwrap();
    }
}

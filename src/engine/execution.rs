//! Order execution with admission control and structured rejections.
//!
//! Entry flow: risk checks, session-capped sizing, a single order
//! submission (never retried), then bookkeeping and snapshot persistence.
//! A risk rejection is an expected outcome and is reported as data, not
//! as an error.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::domain::bar::MarketSession;
use crate::domain::outcome::OutcomeRecord;
use crate::domain::position::{ExitReason, Side, Trade, TradeError};
use crate::domain::risk::{RiskLimits, RiskRejection};
use crate::domain::signal::Signal;
use crate::ports::broker::{BrokerError, BrokerPort, OrderRequest};
use crate::storage::snapshot::{TradeSnapshot, SNAPSHOT_FILE};
use crate::storage::{Store, StoreError};

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("Trade state error: {0}")]
    Trade(#[from] TradeError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Unknown trade: {0}")]
    UnknownTrade(String),
}

/// What happened to a signal handed to the engine.
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    Entered(Trade),
    Rejected(RiskRejection),
    /// Hold signals and other non-actionable input.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub limits: RiskLimits,
    /// Where the open-trade snapshot is written. None disables persistence.
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { limits: RiskLimits::default(), snapshot_dir: None }
    }
}

/// The execution engine. Clones share all state, so one instance can be
/// handed to the orchestrator and another to the monitor loop.
pub struct ExecutionEngine {
    broker: Arc<dyn BrokerPort>,
    store: Arc<dyn Store>,
    config: EngineConfig,
    open_trades: Arc<RwLock<HashMap<String, Trade>>>,
    daily_realized_pnl: Arc<RwLock<f64>>,
    trade_lock: Arc<Mutex<()>>,
    next_trade_seq: Arc<RwLock<u64>>,
}

impl ExecutionEngine {
    pub fn new(broker: Arc<dyn BrokerPort>, store: Arc<dyn Store>, config: EngineConfig) -> Self {
        Self {
            broker,
            store,
            config,
            open_trades: Arc::new(RwLock::new(HashMap::new())),
            daily_realized_pnl: Arc::new(RwLock::new(0.0)),
            trade_lock: Arc::new(Mutex::new(())),
            next_trade_seq: Arc::new(RwLock::new(1)),
        }
    }

    /// Recover open trades from the snapshot written by a previous run.
    pub async fn recover(&self) -> Result<usize, ExecutionError> {
        let Some(path) = self.snapshot_path() else { return Ok(0) };
        let Some(snapshot) = TradeSnapshot::load(&path)? else { return Ok(0) };

        let mut open = self.open_trades.write().await;
        for trade in snapshot.open_trades {
            if trade.is_open() {
                tracing::info!(
                    symbol = %trade.symbol,
                    entry = trade.entry_price,
                    "recovered open trade"
                );
                open.insert(trade.symbol.clone(), trade);
            }
        }
        Ok(open.len())
    }

    /// Try to enter a position for an actionable signal.
    pub async fn execute_signal(
        &self,
        signal: &Signal,
        session: MarketSession,
    ) -> Result<ExecutionResult, ExecutionError> {
        if !signal.is_actionable() {
            return Ok(ExecutionResult::Skipped);
        }
        let Some(side) = Side::from_signal(signal.signal_type) else {
            return Ok(ExecutionResult::Skipped);
        };

        // Serializes entries so concurrent cycles cannot double-spend limits
        let _guard = self.trade_lock.lock().await;

        if let Err(rejection) = self.admit(signal, session).await? {
            tracing::warn!(symbol = %signal.symbol, %rejection, "signal rejected");
            return Ok(ExecutionResult::Rejected(rejection));
        }

        let account = self.broker.account().await?;
        let cap_pct = self.config.limits.session_cap_pct(session);
        let pct = signal.position_pct.min(cap_pct) / 100.0;
        let budget = account.buying_power * pct;
        let quantity = (budget / signal.entry_price).floor().max(1.0);

        let needed = quantity * signal.entry_price;
        if needed > account.buying_power {
            let rejection = RiskRejection::InsufficientBuyingPower {
                needed,
                available: account.buying_power,
            };
            tracing::warn!(symbol = %signal.symbol, %rejection, "signal rejected");
            return Ok(ExecutionResult::Rejected(rejection));
        }

        // Pre-market requires an extended-hours limit order
        let request = if session == MarketSession::PreMarket {
            OrderRequest::extended_limit(&signal.symbol, side, quantity, signal.entry_price)
        } else {
            OrderRequest::market(&signal.symbol, side, quantity)
        };

        // Order submission is never retried: a timeout is ambiguous
        let ack = self.broker.submit_order(&request).await?;

        let trade_id = self.next_trade_id().await;
        let mut trade = Trade::new(
            trade_id,
            signal.id.clone(),
            signal.symbol.clone(),
            side,
            quantity,
            signal.entry_price,
            signal.stop_loss,
            signal.target_1,
            signal.target_2,
        )?;
        trade.mark_open(ack.filled_price.unwrap_or(signal.entry_price))?;

        tracing::info!(
            symbol = %trade.symbol,
            side = ?trade.side,
            quantity = trade.quantity,
            entry = trade.entry_price,
            order_id = %ack.order_id,
            "position opened"
        );

        self.open_trades.write().await.insert(trade.symbol.clone(), trade.clone());
        self.store.upsert_trade(&trade).await?;
        self.persist_snapshot().await?;

        Ok(ExecutionResult::Entered(trade))
    }

    /// Close an open trade at the given price. Idempotent: a trade already
    /// closing or closed is left alone.
    pub async fn close_trade(
        &self,
        symbol: &str,
        reason: ExitReason,
        exit_price: f64,
    ) -> Result<Option<OutcomeRecord>, ExecutionError> {
        let _guard = self.trade_lock.lock().await;

        let mut trade = {
            let open = self.open_trades.read().await;
            open.get(symbol)
                .cloned()
                .ok_or_else(|| ExecutionError::UnknownTrade(symbol.to_string()))?
        };

        if trade.begin_close(reason).is_err() {
            tracing::debug!(symbol, "close already in flight");
            return Ok(None);
        }

        let request = OrderRequest::market(symbol, opposite(trade.side), trade.quantity);
        let ack = self.broker.submit_order(&request).await?;
        trade.finalize_close(ack.filled_price.unwrap_or(exit_price))?;

        let pnl = trade.realized_pnl().unwrap_or(0.0);
        *self.daily_realized_pnl.write().await += pnl;

        tracing::info!(
            symbol,
            reason = ?reason,
            pnl = format!("{:.2}", pnl),
            "position closed"
        );

        self.open_trades.write().await.remove(symbol);
        self.store.upsert_trade(&trade).await?;
        self.persist_snapshot().await?;

        let outcome = match self.store.signal(&trade.signal_id).await? {
            Some(signal) => OutcomeRecord::from_closed(&trade, &signal),
            None => None,
        };
        if let Some(ref record) = outcome {
            self.store.record_outcome(record).await?;
        }
        Ok(outcome)
    }

    /// Flatten every open position at its last mark. Used at day end and
    /// on shutdown.
    pub async fn close_all(&self, reason: ExitReason) -> Result<usize, ExecutionError> {
        let trades = self.open_trades().await;
        let mut closed = 0;
        for trade in trades {
            self.close_trade(&trade.symbol, reason, trade.last_price).await?;
            closed += 1;
        }
        Ok(closed)
    }

    /// Update the mark price of an open trade, returning the refreshed copy.
    pub async fn mark_trade(&self, symbol: &str, price: f64) -> Option<Trade> {
        let mut open = self.open_trades.write().await;
        let trade = open.get_mut(symbol)?;
        trade.mark_price(price);
        Some(trade.clone())
    }

    /// Record that target 1 has been touched; fires at most once per trade.
    pub async fn mark_target_1(&self, symbol: &str) -> bool {
        let mut open = self.open_trades.write().await;
        match open.get_mut(symbol) {
            Some(trade) if !trade.target_1_hit => {
                trade.target_1_hit = true;
                true
            }
            _ => false,
        }
    }

    pub async fn open_trades(&self) -> Vec<Trade> {
        self.open_trades.read().await.values().cloned().collect()
    }

    pub async fn open_count(&self) -> usize {
        self.open_trades.read().await.len()
    }

    pub async fn daily_realized_pnl(&self) -> f64 {
        *self.daily_realized_pnl.read().await
    }

    /// Reset daily counters at the start of a trading day.
    pub async fn reset_daily(&self) {
        *self.daily_realized_pnl.write().await = 0.0;
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.config.limits
    }

    async fn admit(
        &self,
        signal: &Signal,
        session: MarketSession,
    ) -> Result<Result<(), RiskRejection>, ExecutionError> {
        if !session.is_tradable() {
            return Ok(Err(RiskRejection::MarketClosed));
        }

        let open = self.open_trades.read().await;
        if let Err(r) = self.config.limits.check_open_positions(open.len()) {
            return Ok(Err(r));
        }
        if open.contains_key(&signal.symbol) {
            return Ok(Err(RiskRejection::DuplicateSymbol(signal.symbol.clone())));
        }
        drop(open);

        if let Err(r) = self.config.limits.check_price_band(signal.entry_price) {
            return Ok(Err(r));
        }

        let account = self.broker.account().await?;
        let realized = *self.daily_realized_pnl.read().await;
        if realized < 0.0 && account.equity > 0.0 {
            let loss_pct = -realized / account.equity * 100.0;
            if let Err(r) = self.config.limits.check_daily_loss(loss_pct) {
                return Ok(Err(r));
            }
        }

        Ok(Ok(()))
    }

    async fn next_trade_id(&self) -> String {
        let mut seq = self.next_trade_seq.write().await;
        let id = format!("trade-{}", *seq);
        *seq += 1;
        id
    }

    fn snapshot_path(&self) -> Option<PathBuf> {
        self.config.snapshot_dir.as_ref().map(|d| d.join(SNAPSHOT_FILE))
    }

    async fn persist_snapshot(&self) -> Result<(), ExecutionError> {
        let Some(path) = self.snapshot_path() else { return Ok(()) };
        let open = self.open_trades.read().await.values().cloned().collect();
        TradeSnapshot::new(open).save(&path)?;
        Ok(())
    }
}

impl Clone for ExecutionEngine {
    fn clone(&self) -> Self {
        Self {
            broker: Arc::clone(&self.broker),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            open_trades: Arc::clone(&self.open_trades),
            daily_realized_pnl: Arc::clone(&self.daily_realized_pnl),
            trade_lock: Arc::clone(&self.trade_lock),
            next_trade_seq: Arc::clone(&self.next_trade_seq),
        }
    }
}

fn opposite(side: Side) -> Side {
    match side {
        Side::Long => Side::Short,
        Side::Short => Side::Long,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::news::{CatalystType, Sentiment};
    use crate::domain::signal::{CatalystStrength, ComponentScores, SignalType};
    use crate::ports::mocks::MockBroker;
    use crate::storage::MemoryStore;
    use chrono::Utc;

    fn signal(symbol: &str, signal_type: SignalType, entry: f64) -> Signal {
        Signal {
            id: format!("sig-{}", symbol.to_lowercase()),
            symbol: symbol.into(),
            signal_type,
            confidence: 75.0,
            catalyst_strength: CatalystStrength::Strong,
            components: ComponentScores { catalyst: 80.0, pattern: 70.0, indicator: 60.0, volume: 70.0 },
            catalyst_type: CatalystType::EarningsBeat,
            catalyst_sentiment: Sentiment::Positive,
            pattern: Some("bullish_engulfing".into()),
            entry_price: entry,
            stop_loss: entry * 0.99,
            target_1: entry * 1.015,
            target_2: entry * 1.03,
            position_pct: 100.0,
            risk_reward_ratio: 1.5,
            key_factors: vec![],
            generated_at: Utc::now(),
        }
    }

    fn engine_with(broker: MockBroker) -> (ExecutionEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = ExecutionEngine::new(
            Arc::new(broker),
            store.clone() as Arc<dyn Store>,
            EngineConfig::default(),
        );
        (engine, store)
    }

    async fn enter(engine: &ExecutionEngine, store: &MemoryStore, s: &Signal) -> ExecutionResult {
        store.save_signal(s).await.unwrap();
        engine.execute_signal(s, MarketSession::Regular).await.unwrap()
    }

    #[tokio::test]
    async fn test_hold_is_skipped() {
        let (engine, store) = engine_with(MockBroker::new());
        let s = signal("AAPL", SignalType::Hold, 100.0);
        let result = enter(&engine, &store, &s).await;
        assert!(matches!(result, ExecutionResult::Skipped));
        assert_eq!(engine.open_count().await, 0);
    }

    #[tokio::test]
    async fn test_entry_sizes_by_session_cap() {
        let broker = MockBroker::new().with_buying_power(100_000.0);
        let (engine, store) = engine_with(broker.clone());
        let s = signal("AAPL", SignalType::Buy, 100.0);

        let result = enter(&engine, &store, &s).await;
        let ExecutionResult::Entered(trade) = result else { panic!("expected entry") };

        // 100% requested, capped at 20% regular: 20_000 / 100 = 200 shares
        assert_eq!(trade.quantity, 200.0);
        assert!(trade.is_open());
        assert_eq!(broker.submitted_orders().len(), 1);
    }

    #[tokio::test]
    async fn test_pre_market_uses_extended_limit_and_tighter_cap() {
        let broker = MockBroker::new().with_buying_power(100_000.0);
        let store = Arc::new(MemoryStore::new());
        let engine = ExecutionEngine::new(
            Arc::new(broker.clone()),
            store.clone() as Arc<dyn Store>,
            EngineConfig::default(),
        );
        let s = signal("AAPL", SignalType::Buy, 100.0);
        store.save_signal(&s).await.unwrap();

        let result = engine.execute_signal(&s, MarketSession::PreMarket).await.unwrap();
        let ExecutionResult::Entered(trade) = result else { panic!("expected entry") };

        // 10% pre-market cap: 10_000 / 100 = 100 shares
        assert_eq!(trade.quantity, 100.0);
        let order = &broker.submitted_orders()[0];
        assert!(order.extended_hours);
        assert_eq!(order.limit_price, Some(100.0));
    }

    #[tokio::test]
    async fn test_duplicate_symbol_rejected() {
        let (engine, store) = engine_with(MockBroker::new());
        let s = signal("AAPL", SignalType::Buy, 100.0);

        enter(&engine, &store, &s).await;
        let result = enter(&engine, &store, &s).await;
        assert!(matches!(
            result,
            ExecutionResult::Rejected(RiskRejection::DuplicateSymbol(_))
        ));
        assert_eq!(engine.open_count().await, 1);
    }

    #[tokio::test]
    async fn test_max_positions_rejected() {
        let (engine, store) = engine_with(MockBroker::new());
        for sym in ["A", "B", "C", "D", "E"] {
            let s = signal(sym, SignalType::Buy, 100.0);
            let result = enter(&engine, &store, &s).await;
            assert!(matches!(result, ExecutionResult::Entered(_)));
        }

        let s = signal("F", SignalType::Buy, 100.0);
        let result = enter(&engine, &store, &s).await;
        assert!(matches!(
            result,
            ExecutionResult::Rejected(RiskRejection::MaxPositionsReached(5))
        ));
    }

    #[tokio::test]
    async fn test_price_band_rejected() {
        let (engine, store) = engine_with(MockBroker::new());
        let s = signal("PENNY", SignalType::Buy, 0.50);
        let result = enter(&engine, &store, &s).await;
        assert!(matches!(
            result,
            ExecutionResult::Rejected(RiskRejection::PriceOutOfBand { .. })
        ));
    }

    #[tokio::test]
    async fn test_closed_market_rejected() {
        let (engine, store) = engine_with(MockBroker::new());
        let s = signal("AAPL", SignalType::Buy, 100.0);
        store.save_signal(&s).await.unwrap();
        let result = engine.execute_signal(&s, MarketSession::Closed).await.unwrap();
        assert!(matches!(
            result,
            ExecutionResult::Rejected(RiskRejection::MarketClosed)
        ));
    }

    #[tokio::test]
    async fn test_close_records_outcome_and_daily_pnl() {
        let (engine, store) = engine_with(MockBroker::new());
        let s = signal("AAPL", SignalType::Buy, 100.0);
        enter(&engine, &store, &s).await;

        let outcome = engine.close_trade("AAPL", ExitReason::Target2, 103.0).await.unwrap();
        let outcome = outcome.expect("outcome recorded");

        assert_eq!(outcome.exit_reason, ExitReason::Target2);
        assert_eq!(outcome.realized_pnl, 200.0 * 3.0);
        assert_eq!(engine.open_count().await, 0);
        assert_eq!(engine.daily_realized_pnl().await, 600.0);
    }

    #[tokio::test]
    async fn test_close_unknown_trade_errors() {
        let (engine, _store) = engine_with(MockBroker::new());
        let result = engine.close_trade("GHOST", ExitReason::Manual, 10.0).await;
        assert!(matches!(result, Err(ExecutionError::UnknownTrade(_))));
    }

    #[tokio::test]
    async fn test_daily_loss_limit_blocks_entries() {
        let broker = MockBroker::new().with_buying_power(10_000.0);
        let (engine, store) = engine_with(broker);

        // Enter and close at a heavy loss: 20 shares, -6% of 10k equity
        let s = signal("AAPL", SignalType::Buy, 100.0);
        enter(&engine, &store, &s).await;
        engine.close_trade("AAPL", ExitReason::StopLoss, 70.0).await.unwrap();

        let s2 = signal("MSFT", SignalType::Buy, 100.0);
        let result = enter(&engine, &store, &s2).await;
        assert!(matches!(
            result,
            ExecutionResult::Rejected(RiskRejection::DailyLossLimit { .. })
        ));

        // Reset clears the gate
        engine.reset_daily().await;
        let result = enter(&engine, &store, &s2).await;
        assert!(matches!(result, ExecutionResult::Entered(_)));
    }

    #[tokio::test]
    async fn test_snapshot_recovery() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = EngineConfig {
            limits: RiskLimits::default(),
            snapshot_dir: Some(dir.path().to_path_buf()),
        };
        let store = Arc::new(MemoryStore::new());
        let engine = ExecutionEngine::new(
            Arc::new(MockBroker::new()),
            store.clone() as Arc<dyn Store>,
            config.clone(),
        );

        let s = signal("AAPL", SignalType::Buy, 100.0);
        store.save_signal(&s).await.unwrap();
        engine.execute_signal(&s, MarketSession::Regular).await.unwrap();

        // A fresh engine picks the open trade back up
        let recovered = ExecutionEngine::new(
            Arc::new(MockBroker::new()),
            store as Arc<dyn Store>,
            config,
        );
        assert_eq!(recovered.recover().await.unwrap(), 1);
        assert_eq!(recovered.open_trades().await[0].symbol, "AAPL");
    }
}

//! Pipeline Integration Tests
//!
//! End-to-end flows through the real components wired together:
//! 1. Orchestrator cycle -> trade entry -> monitor exit -> recorded outcome
//! 2. Stop-loss path through the monitor
//! 3. End-of-day flatten
//!
//! All tests are deterministic (no real network calls) and use the
//! recording mocks for the three ports.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use catalyst_pipeline::application::{Orchestrator, OrchestratorConfig};
use catalyst_pipeline::catalyst::{CatalystScorer, ScorerConfig};
use catalyst_pipeline::domain::bar::{Bar, MarketSession};
use catalyst_pipeline::domain::cycle::{CycleMode, CycleStatus};
use catalyst_pipeline::domain::news::NewsItem;
use catalyst_pipeline::domain::position::ExitReason;
use catalyst_pipeline::engine::{EngineConfig, ExecutionEngine, OutcomeCollector, PositionMonitor};
use catalyst_pipeline::patterns::detector::{DetectorConfig, PatternDetector};
use catalyst_pipeline::ports::mocks::{MockBroker, MockMarketData, MockNewsFeed};
use catalyst_pipeline::scanner::{Scanner, ScannerConfig};
use catalyst_pipeline::storage::{MemoryStore, Store};
use catalyst_pipeline::strategy::{GeneratorConfig, SignalGenerator};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Wednesday 14:00 UTC = 10:00 exchange-local at -4, regular hours.
fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 11, 14, 0, 0).unwrap()
}

fn news_item(symbol: &str, headline: &str, now: DateTime<Utc>) -> NewsItem {
    NewsItem {
        symbol: symbol.into(),
        headline: headline.into(),
        source: "wire".into(),
        published_at: now - Duration::minutes(45),
        is_breaking: false,
        session: MarketSession::Regular,
    }
}

/// Zig-zag bars with an upward drift and a heavy final candle: RSI sits
/// in the middle band while the last bar prints a volume surge.
fn drifting_bars(count: usize, now: DateTime<Utc>) -> Vec<Bar> {
    let mut close = 50.0;
    (0..count)
        .map(|i| {
            let open = close;
            close = open + if i % 2 == 0 { 0.15 } else { -0.10 };
            Bar {
                timestamp: now - Duration::minutes((count - i) as i64 * 5),
                open,
                high: open.max(close) + 0.05,
                low: open.min(close) - 0.05,
                close,
                volume: if i == count - 1 { 3_000_000.0 } else { 1_000_000.0 },
            }
        })
        .collect()
}

struct Pipeline {
    orchestrator: Orchestrator,
    monitor: PositionMonitor,
    engine: ExecutionEngine,
    outcomes: OutcomeCollector,
    market: MockMarketData,
    broker: MockBroker,
}

fn pipeline(universe: &[&str], market: MockMarketData, news: MockNewsFeed) -> Pipeline {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let broker = MockBroker::new();
    let engine = ExecutionEngine::new(
        Arc::new(broker.clone()),
        store.clone(),
        EngineConfig::default(),
    );
    let orchestrator = Orchestrator::new(
        Arc::new(news),
        CatalystScorer::new(ScorerConfig::default()),
        Scanner::new(ScannerConfig::default(), Arc::new(market.clone())),
        PatternDetector::new(DetectorConfig::default()),
        SignalGenerator::new(GeneratorConfig::default()),
        engine.clone(),
        store.clone(),
        OrchestratorConfig {
            universe: universe.iter().map(|s| s.to_string()).collect(),
            ..OrchestratorConfig::default()
        },
    );
    let monitor = PositionMonitor::new(engine.clone(), Arc::new(market.clone()));
    let outcomes = OutcomeCollector::new(store);

    Pipeline { orchestrator, monitor, engine, outcomes, market, broker }
}

fn catalyst_news(now: DateTime<Utc>) -> MockNewsFeed {
    MockNewsFeed::new().with_items(
        "NVDA",
        vec![
            news_item("NVDA", "NVDA earnings beat estimates, raises guidance", now),
            news_item("NVDA", "Analyst upgrade follows blowout quarterly results", now),
        ],
    )
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_cycle_entry_target_exit_and_outcome() {
    let now = fixed_now();
    let market = MockMarketData::new().with_bars("NVDA", drifting_bars(60, now));
    let p = pipeline(&["NVDA"], market, catalyst_news(now));

    let cycle = p.orchestrator.run_cycle_at(CycleMode::Normal, now).await.unwrap();
    assert_eq!(cycle.status, CycleStatus::Completed);
    assert_eq!(cycle.trades_executed, 1);

    let trade = p.engine.open_trades().await.pop().expect("one open trade");
    assert_eq!(trade.symbol, "NVDA");
    assert!(trade.target_2 > trade.entry_price);

    // Price rips through target 2; the monitor closes the position.
    p.market.set_quote("NVDA", trade.target_2 + 1.0);
    p.monitor.tick().await.unwrap();

    assert_eq!(p.engine.open_count().await, 0);
    // Entry order plus the closing order
    assert_eq!(p.broker.submitted_orders().len(), 2);

    let summary = p.outcomes.today().await.unwrap();
    assert_eq!(summary.trades, 1);
    assert_eq!(summary.wins, 1);
    assert!(summary.total_pnl > 0.0);
    assert!(p.engine.daily_realized_pnl().await > 0.0);
}

#[tokio::test]
async fn test_monitor_stop_loss_path() {
    let now = fixed_now();
    let market = MockMarketData::new().with_bars("NVDA", drifting_bars(60, now));
    let p = pipeline(&["NVDA"], market, catalyst_news(now));

    p.orchestrator.run_cycle_at(CycleMode::Normal, now).await.unwrap();
    let trade = p.engine.open_trades().await.pop().expect("one open trade");

    // Quote between stop and entry leaves the position alone
    p.market.set_quote("NVDA", trade.stop_loss + 0.10);
    p.monitor.tick().await.unwrap();
    assert_eq!(p.engine.open_count().await, 1);

    // Breaching the stop closes it at a loss
    p.market.set_quote("NVDA", trade.stop_loss - 0.10);
    p.monitor.tick().await.unwrap();
    assert_eq!(p.engine.open_count().await, 0);

    let outcomes = p.outcomes.outcomes_since(now - Duration::hours(1)).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].exit_reason, ExitReason::StopLoss);
    assert!(outcomes[0].realized_pnl < 0.0);
    assert!(p.engine.daily_realized_pnl().await < 0.0);
}

#[tokio::test]
async fn test_end_of_day_flattens_open_positions() {
    let now = fixed_now();
    let market = MockMarketData::new().with_bars("NVDA", drifting_bars(60, now));
    let p = pipeline(&["NVDA"], market, catalyst_news(now));

    p.orchestrator.run_cycle_at(CycleMode::Normal, now).await.unwrap();
    assert_eq!(p.engine.open_count().await, 1);

    p.orchestrator.end_of_day().await;

    assert_eq!(p.engine.open_count().await, 0);
    let outcomes = p.outcomes.outcomes_since(now - Duration::hours(1)).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].exit_reason, ExitReason::CycleEnd);
}

#[tokio::test]
async fn test_duplicate_symbol_not_reentered_next_cycle() {
    let now = fixed_now();
    let market = MockMarketData::new().with_bars("NVDA", drifting_bars(60, now));
    let p = pipeline(&["NVDA"], market, catalyst_news(now));

    let first = p.orchestrator.run_cycle_at(CycleMode::Normal, now).await.unwrap();
    assert_eq!(first.trades_executed, 1);

    // Second pass sees the same catalyst but already holds the symbol
    let second = p
        .orchestrator
        .run_cycle_at(CycleMode::Normal, now + Duration::minutes(30))
        .await
        .unwrap();
    assert_eq!(second.status, CycleStatus::Completed);
    assert_eq!(second.trades_executed, 0);
    assert_eq!(p.engine.open_count().await, 1);
    assert_eq!(p.broker.submitted_orders().len(), 1);
}

//! Workflow orchestrator: one `run_cycle` drives the five pipeline stages
//! in order, recording counters and wall-clock timing per stage.
//!
//! A stage error marks the cycle Failed with the stage and cause captured;
//! the counters of stages that already ran are preserved. At most one
//! cycle runs at a time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::catalyst::CatalystScorer;
use crate::domain::bar::MarketSession;
use crate::domain::cycle::{Cycle, CycleMode, Stage};
use crate::domain::news::CatalystSummary;
use crate::domain::position::ExitReason;
use crate::domain::signal::Signal;
use crate::engine::{ExecutionEngine, ExecutionResult};
use crate::patterns::{PatternDetection, PatternDetector};
use crate::ports::news::NewsFeedPort;
use crate::scanner::{Candidate, ScanCache, Scanner};
use crate::storage::Store;
use crate::strategy::SignalGenerator;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("A cycle is already running")]
    CycleAlreadyRunning,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub universe: Vec<String>,
    /// News lookback per symbol, hours.
    pub news_window_hours: i64,
    /// Exchange offset from UTC, hours. Eastern is -4 in summer.
    pub utc_offset_hours: i64,
    /// How long scan results are reused across cycles, per session.
    pub scan_cache_ttl_seconds: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            universe: crate::scanner::DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect(),
            news_window_hours: 24,
            utc_offset_hours: -4,
            scan_cache_ttl_seconds: 300,
        }
    }
}

pub struct Orchestrator {
    news: Arc<dyn NewsFeedPort>,
    scorer: Arc<CatalystScorer>,
    scanner: Arc<Scanner>,
    detector: Arc<PatternDetector>,
    generator: Arc<SignalGenerator>,
    engine: ExecutionEngine,
    store: Arc<dyn Store>,
    config: OrchestratorConfig,
    scan_cache: ScanCache,
    cycle_running: Arc<RwLock<bool>>,
    cycle_seq: Arc<RwLock<u64>>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        news: Arc<dyn NewsFeedPort>,
        scorer: CatalystScorer,
        scanner: Scanner,
        detector: PatternDetector,
        generator: SignalGenerator,
        engine: ExecutionEngine,
        store: Arc<dyn Store>,
        config: OrchestratorConfig,
    ) -> Self {
        let scan_cache = ScanCache::new(std::time::Duration::from_secs(config.scan_cache_ttl_seconds));
        Self {
            news,
            scorer: Arc::new(scorer),
            scanner: Arc::new(scanner),
            detector: Arc::new(detector),
            generator: Arc::new(generator),
            engine,
            store,
            config,
            scan_cache,
            cycle_running: Arc::new(RwLock::new(false)),
            cycle_seq: Arc::new(RwLock::new(1)),
        }
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    pub async fn run_cycle(&self, mode: CycleMode) -> Result<Cycle, OrchestratorError> {
        self.run_cycle_at(mode, Utc::now()).await
    }

    /// Run one full pipeline pass as of `now`. Exposed separately so the
    /// session clock can be pinned in tests.
    pub async fn run_cycle_at(
        &self,
        mode: CycleMode,
        now: DateTime<Utc>,
    ) -> Result<Cycle, OrchestratorError> {
        {
            let mut running = self.cycle_running.write().await;
            if *running {
                return Err(OrchestratorError::CycleAlreadyRunning);
            }
            *running = true;
        }

        let cycle = self.run_stages(mode, now).await;
        *self.cycle_running.write().await = false;
        Ok(cycle)
    }

    /// Flatten all open positions at the end of the trading day.
    pub async fn end_of_day(&self) {
        match self.engine.close_all(ExitReason::CycleEnd).await {
            Ok(0) => {}
            Ok(n) => tracing::info!(closed = n, "end of day flatten"),
            Err(e) => tracing::error!(error = %e, "end of day flatten failed"),
        }
    }

    /// Reset daily accounting at the start of a trading day.
    pub async fn start_of_day(&self) {
        self.engine.reset_daily().await;
        tracing::info!("daily counters reset");
    }

    async fn run_stages(&self, mode: CycleMode, now: DateTime<Utc>) -> Cycle {
        let id = self.next_cycle_id().await;
        let mut cycle = Cycle::start(id, mode);
        let session = MarketSession::at(now, self.config.utc_offset_hours);

        tracing::info!(
            cycle = %cycle.id,
            mode = ?mode,
            session = session.as_str(),
            "cycle started"
        );
        self.save_cycle(&cycle).await;

        // Stage 1: catalysts
        let started = Instant::now();
        let catalysts = match self.collect_catalysts(now).await {
            Ok(c) => c,
            Err(cause) => return self.fail(cycle, Stage::Catalysts, cause).await,
        };
        cycle.record_stage(Stage::Catalysts, catalysts.len(), elapsed_ms(started));

        // Stage 2: scan. Results are reused across cycles within the TTL,
        // keyed by session.
        let started = Instant::now();
        let candidates = match self.scan_cache.get(session.as_str()).await {
            Some(cached) => {
                tracing::debug!(cycle = %cycle.id, candidates = cached.len(), "scan served from cache");
                cached
            }
            None => match self.scanner.scan(&catalysts).await {
                Ok(c) => {
                    self.scan_cache.put(session.as_str(), c.clone()).await;
                    c
                }
                Err(e) => return self.fail(cycle, Stage::Scan, e.to_string()).await,
            },
        };
        cycle.record_stage(Stage::Scan, candidates.len(), elapsed_ms(started));

        // Stage 3: patterns
        let started = Instant::now();
        let detected = self.detect_patterns(&candidates, session);
        let pattern_count: usize = detected.iter().map(|(_, p)| p.len()).sum();
        cycle.record_stage(Stage::Patterns, pattern_count, elapsed_ms(started));

        // Stage 4: signals
        let started = Instant::now();
        let signals = match self.generate_signals(&detected, session).await {
            Ok(s) => s,
            Err(cause) => return self.fail(cycle, Stage::Signals, cause).await,
        };
        cycle.record_stage(Stage::Signals, signals.len(), elapsed_ms(started));

        // Stage 5: execute. Light cycles observe without trading.
        if mode == CycleMode::Light {
            tracing::info!(cycle = %cycle.id, "light cycle, skipping execution");
        } else {
            let started = Instant::now();
            let entered = match self.execute_signals(&signals, session).await {
                Ok(n) => n,
                Err(cause) => return self.fail(cycle, Stage::Execute, cause).await,
            };
            cycle.record_stage(Stage::Execute, entered, elapsed_ms(started));
        }

        cycle.complete();
        tracing::info!(
            cycle = %cycle.id,
            catalysts = cycle.catalysts_found,
            candidates = cycle.candidates_selected,
            patterns = cycle.patterns_detected,
            signals = cycle.signals_generated,
            trades = cycle.trades_executed,
            "cycle completed"
        );
        self.save_cycle(&cycle).await;
        cycle
    }

    async fn collect_catalysts(
        &self,
        now: DateTime<Utc>,
    ) -> Result<HashMap<String, CatalystSummary>, String> {
        let mut summaries = HashMap::new();
        let mut fetch_errors = 0usize;

        for symbol in &self.config.universe {
            let items = match self.news.recent_news(symbol, self.config.news_window_hours).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "news fetch failed");
                    fetch_errors += 1;
                    continue;
                }
            };
            let summary = self.scorer.score(symbol, &items, now);
            if !summary.is_quiet() {
                summaries.insert(symbol.clone(), summary);
            }
        }

        if fetch_errors > 0 && fetch_errors == self.config.universe.len() {
            return Err("news feed unavailable for every symbol".to_string());
        }
        Ok(summaries)
    }

    fn detect_patterns(
        &self,
        candidates: &[Candidate],
        session: MarketSession,
    ) -> Vec<(Candidate, Vec<PatternDetection>)> {
        candidates
            .iter()
            .map(|c| {
                let patterns = self.detector.detect(&c.bars, &c.catalyst, session);
                (c.clone(), patterns)
            })
            .collect()
    }

    async fn generate_signals(
        &self,
        detected: &[(Candidate, Vec<PatternDetection>)],
        session: MarketSession,
    ) -> Result<Vec<Signal>, String> {
        let mut signals = Vec::new();
        for (candidate, patterns) in detected {
            let signal = self.generator.generate(
                &candidate.symbol,
                &candidate.catalyst,
                patterns,
                &candidate.indicators,
                session,
            );
            if let Err(e) = self.store.save_signal(&signal).await {
                return Err(format!("failed to persist signal: {}", e));
            }
            if signal.is_actionable() {
                signals.push(signal);
            }
        }
        Ok(signals)
    }

    async fn execute_signals(
        &self,
        signals: &[Signal],
        session: MarketSession,
    ) -> Result<usize, String> {
        let mut entered = 0usize;
        for signal in signals {
            match self.engine.execute_signal(signal, session).await {
                Ok(ExecutionResult::Entered(_)) => entered += 1,
                Ok(ExecutionResult::Rejected(_)) | Ok(ExecutionResult::Skipped) => {}
                Err(e) => return Err(e.to_string()),
            }
        }
        Ok(entered)
    }

    async fn fail(&self, mut cycle: Cycle, stage: Stage, cause: String) -> Cycle {
        tracing::error!(cycle = %cycle.id, stage = stage.as_str(), cause = %cause, "cycle failed");
        cycle.fail(stage, cause);
        self.save_cycle(&cycle).await;
        cycle
    }

    async fn save_cycle(&self, cycle: &Cycle) {
        if let Err(e) = self.store.save_cycle(cycle).await {
            tracing::error!(cycle = %cycle.id, error = %e, "cycle persistence failed");
        }
    }

    async fn next_cycle_id(&self) -> String {
        let mut seq = self.cycle_seq.write().await;
        let id = format!("cycle-{}", *seq);
        *seq += 1;
        id
    }
}

impl Clone for Orchestrator {
    fn clone(&self) -> Self {
        Self {
            news: Arc::clone(&self.news),
            scorer: Arc::clone(&self.scorer),
            scanner: Arc::clone(&self.scanner),
            detector: Arc::clone(&self.detector),
            generator: Arc::clone(&self.generator),
            engine: self.engine.clone(),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            scan_cache: self.scan_cache.clone(),
            cycle_running: Arc::clone(&self.cycle_running),
            cycle_seq: Arc::clone(&self.cycle_seq),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

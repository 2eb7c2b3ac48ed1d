//! Session scheduler: fires pipeline cycles on a per-session cadence.
//!
//! Three profiles, independently enabled: pre-market runs aggressive
//! cycles every 5 minutes, regular hours normal cycles every 30, after
//! hours light cycles every 60. Day boundaries reset daily accounting
//! and flatten anything still open when the market closes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::application::orchestrator::{Orchestrator, OrchestratorError};
use crate::domain::bar::MarketSession;
use crate::domain::cycle::CycleMode;

#[derive(Debug, Clone)]
pub struct SessionProfile {
    pub enabled: bool,
    pub interval_minutes: u64,
    pub mode: CycleMode,
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub pre_market: SessionProfile,
    pub regular: SessionProfile,
    pub after_hours: SessionProfile,
    /// Exchange offset from UTC, hours.
    pub utc_offset_hours: i64,
    /// How often the scheduler re-evaluates the clock.
    pub poll_seconds: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            pre_market: SessionProfile {
                enabled: true,
                interval_minutes: 5,
                mode: CycleMode::Aggressive,
            },
            regular: SessionProfile {
                enabled: true,
                interval_minutes: 30,
                mode: CycleMode::Normal,
            },
            after_hours: SessionProfile {
                enabled: true,
                interval_minutes: 60,
                mode: CycleMode::Light,
            },
            utc_offset_hours: -4,
            poll_seconds: 15,
        }
    }
}

pub struct Scheduler {
    orchestrator: Orchestrator,
    config: ScheduleConfig,
    is_running: Arc<RwLock<bool>>,
    last_fired: Arc<RwLock<HashMap<MarketSession, Instant>>>,
    last_session: Arc<RwLock<MarketSession>>,
}

impl Clone for Scheduler {
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
            config: self.config.clone(),
            is_running: self.is_running.clone(),
            last_fired: self.last_fired.clone(),
            last_session: self.last_session.clone(),
        }
    }
}

impl Scheduler {
    pub fn new(orchestrator: Orchestrator, config: ScheduleConfig) -> Self {
        Self {
            orchestrator,
            config,
            is_running: Arc::new(RwLock::new(false)),
            last_fired: Arc::new(RwLock::new(HashMap::new())),
            last_session: Arc::new(RwLock::new(MarketSession::Closed)),
        }
    }

    pub async fn run(&self) {
        {
            let mut running = self.is_running.write().await;
            if *running {
                tracing::warn!("scheduler already running");
                return;
            }
            *running = true;
        }
        tracing::info!(poll_seconds = self.config.poll_seconds, "scheduler started");

        while *self.is_running.read().await {
            self.tick(Utc::now()).await;
            tokio::time::sleep(Duration::from_secs(self.config.poll_seconds)).await;
        }
        tracing::info!("scheduler stopped");
    }

    pub async fn stop(&self) {
        *self.is_running.write().await = false;
    }

    /// One scheduling decision as of `now`. Public so the clock can be
    /// pinned in tests.
    pub async fn tick(&self, now: DateTime<Utc>) {
        let session = MarketSession::at(now, self.config.utc_offset_hours);
        self.handle_transition(session).await;

        let Some(profile) = self.profile_for(session) else {
            return;
        };
        if !profile.enabled {
            return;
        }
        if !self.due(session, profile.interval_minutes).await {
            return;
        }

        match self.orchestrator.run_cycle_at(profile.mode, now).await {
            Ok(cycle) => {
                tracing::debug!(cycle = %cycle.id, session = session.as_str(), "scheduled cycle done");
            }
            Err(OrchestratorError::CycleAlreadyRunning) => {
                tracing::debug!(session = session.as_str(), "cycle still in flight, skipping");
            }
        }
    }

    async fn handle_transition(&self, session: MarketSession) {
        let mut last = self.last_session.write().await;
        if *last == session {
            return;
        }
        let previous = *last;
        *last = session;
        drop(last);

        tracing::info!(from = previous.as_str(), to = session.as_str(), "session change");

        if previous == MarketSession::Closed && session == MarketSession::PreMarket {
            self.orchestrator.start_of_day().await;
        }
        if previous.is_tradable() && session == MarketSession::Closed {
            self.orchestrator.end_of_day().await;
        }
    }

    fn profile_for(&self, session: MarketSession) -> Option<&SessionProfile> {
        match session {
            MarketSession::PreMarket => Some(&self.config.pre_market),
            MarketSession::Regular => Some(&self.config.regular),
            MarketSession::AfterHours => Some(&self.config.after_hours),
            MarketSession::Closed => None,
        }
    }

    async fn due(&self, session: MarketSession, interval_minutes: u64) -> bool {
        let mut fired = self.last_fired.write().await;
        let interval = Duration::from_secs(interval_minutes * 60);
        match fired.get(&session) {
            Some(at) if at.elapsed() < interval => false,
            _ => {
                fired.insert(session, Instant::now());
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalyst::{CatalystScorer, ScorerConfig};
    use crate::engine::{EngineConfig, ExecutionEngine};
    use crate::patterns::{DetectorConfig, PatternDetector};
    use crate::ports::mocks::{MockBroker, MockMarketData, MockNewsFeed};
    use crate::scanner::{Scanner, ScannerConfig};
    use crate::storage::{MemoryStore, Store};
    use crate::strategy::{GeneratorConfig, SignalGenerator};
    use chrono::TimeZone;

    fn scheduler() -> (Scheduler, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = ExecutionEngine::new(
            Arc::new(MockBroker::new()),
            store.clone() as Arc<dyn Store>,
            EngineConfig::default(),
        );
        let orchestrator = Orchestrator::new(
            Arc::new(MockNewsFeed::new()),
            CatalystScorer::new(ScorerConfig::default()),
            Scanner::new(ScannerConfig::default(), Arc::new(MockMarketData::new())),
            PatternDetector::new(DetectorConfig::default()),
            SignalGenerator::new(GeneratorConfig::default()),
            engine,
            store.clone() as Arc<dyn Store>,
            crate::application::orchestrator::OrchestratorConfig {
                universe: vec!["AAPL".to_string()],
                ..Default::default()
            },
        );
        (Scheduler::new(orchestrator, ScheduleConfig::default()), store)
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        // Wednesday 2025-06-11, exchange offset -4
        Utc.with_ymd_and_hms(2025, 6, 11, hour, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn test_regular_session_fires_cycle() {
        let (scheduler, store) = scheduler();
        scheduler.tick(at(14, 0)).await; // 10:00 local, regular

        let cycles = store.recent_cycles(10).await.unwrap();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].mode, CycleMode::Normal);
    }

    #[tokio::test]
    async fn test_interval_throttles_repeat_ticks() {
        let (scheduler, store) = scheduler();
        scheduler.tick(at(14, 0)).await;
        scheduler.tick(at(14, 1)).await;
        scheduler.tick(at(14, 2)).await;

        // 30 minute regular interval, so only the first tick fires
        assert_eq!(store.recent_cycles(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_closed_market_fires_nothing() {
        let (scheduler, store) = scheduler();
        scheduler.tick(at(6, 0)).await; // 02:00 local
        assert!(store.recent_cycles(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pre_market_runs_aggressive() {
        let (scheduler, store) = scheduler();
        scheduler.tick(at(12, 0)).await; // 08:00 local, pre-market

        let cycles = store.recent_cycles(10).await.unwrap();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].mode, CycleMode::Aggressive);
    }

    #[tokio::test]
    async fn test_after_hours_runs_light() {
        let (scheduler, store) = scheduler();
        scheduler.tick(at(21, 0)).await; // 17:00 local, after hours

        let cycles = store.recent_cycles(10).await.unwrap();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].mode, CycleMode::Light);
    }

    #[tokio::test]
    async fn test_disabled_profile_is_skipped() {
        let (mut scheduler, store) = {
            let (s, store) = scheduler();
            (s, store)
        };
        scheduler.config.regular.enabled = false;

        scheduler.tick(at(14, 0)).await;
        assert!(store.recent_cycles(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_transitions_tracked() {
        let (scheduler, _store) = scheduler();
        scheduler.tick(at(6, 0)).await; // closed
        scheduler.tick(at(12, 0)).await; // pre-market: start_of_day runs
        scheduler.tick(at(14, 0)).await; // regular

        assert_eq!(*scheduler.last_session.read().await, MarketSession::Regular);
    }
}

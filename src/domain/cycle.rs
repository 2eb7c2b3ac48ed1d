//! Workflow cycle records: one record per end-to-end pipeline pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How aggressively a cycle trades, tied to the market session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleMode {
    Aggressive,
    Normal,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Running,
    Completed,
    Failed,
}

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Catalysts,
    Scan,
    Patterns,
    Signals,
    Execute,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Catalysts => "catalysts",
            Stage::Scan => "scan",
            Stage::Patterns => "patterns",
            Stage::Signals => "signals",
            Stage::Execute => "execute",
        }
    }
}

/// Per-stage result counters plus wall-clock duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub items: usize,
    pub duration_ms: u64,
}

/// One pipeline pass. Counters only ever grow; a failed stage leaves the
/// records of earlier stages intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cycle {
    pub id: String,
    pub mode: CycleMode,
    pub status: CycleStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stages: Vec<StageRecord>,
    pub catalysts_found: usize,
    pub candidates_selected: usize,
    pub patterns_detected: usize,
    pub signals_generated: usize,
    pub trades_executed: usize,
    pub failed_stage: Option<Stage>,
    pub failure: Option<String>,
}

impl Cycle {
    pub fn start(id: String, mode: CycleMode) -> Self {
        Self {
            id,
            mode,
            status: CycleStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            stages: Vec::new(),
            catalysts_found: 0,
            candidates_selected: 0,
            patterns_detected: 0,
            signals_generated: 0,
            trades_executed: 0,
            failed_stage: None,
            failure: None,
        }
    }

    pub fn record_stage(&mut self, stage: Stage, items: usize, duration_ms: u64) {
        match stage {
            Stage::Catalysts => self.catalysts_found = items,
            Stage::Scan => self.candidates_selected = items,
            Stage::Patterns => self.patterns_detected = items,
            Stage::Signals => self.signals_generated = items,
            Stage::Execute => self.trades_executed = items,
        }
        self.stages.push(StageRecord { stage, items, duration_ms });
    }

    pub fn complete(&mut self) {
        self.status = CycleStatus::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self, stage: Stage, cause: String) {
        self.status = CycleStatus::Failed;
        self.failed_stage = Some(stage);
        self.failure = Some(cause);
        self.finished_at = Some(Utc::now());
    }

    pub fn is_running(&self) -> bool {
        self.status == CycleStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_stage_recording() {
        let mut c = Cycle::start("c-1".into(), CycleMode::Normal);
        assert!(c.is_running());

        c.record_stage(Stage::Catalysts, 12, 40);
        c.record_stage(Stage::Scan, 5, 10);
        assert_eq!(c.catalysts_found, 12);
        assert_eq!(c.candidates_selected, 5);
        assert_eq!(c.stages.len(), 2);

        c.complete();
        assert_eq!(c.status, CycleStatus::Completed);
        assert!(c.finished_at.is_some());
    }

    #[test]
    fn test_failed_cycle_keeps_earlier_stages() {
        let mut c = Cycle::start("c-2".into(), CycleMode::Aggressive);
        c.record_stage(Stage::Catalysts, 8, 30);
        c.fail(Stage::Scan, "market data unavailable".into());

        assert_eq!(c.status, CycleStatus::Failed);
        assert_eq!(c.failed_stage, Some(Stage::Scan));
        assert_eq!(c.catalysts_found, 8);
        assert!(!c.is_running());
    }
}

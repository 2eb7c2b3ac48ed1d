pub mod health;
pub mod orchestrator;
pub mod scheduler;

pub use health::{DependencyHealth, HealthMonitor};
pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorError};
pub use scheduler::{ScheduleConfig, Scheduler, SessionProfile};

#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod quiz_attempt;
pub mod rewards;

pub use nexus_core::Clock;

pub use app_services::AppServices;
pub use config::{AppConfig, ConfigOverrides, WritePolicy};
pub use dashboard::{DashboardOverview, DashboardService};
pub use error::{AppServicesError, ConfigError, QuizServiceError, RewardServiceError};
pub use quiz_attempt::{AdvanceOutcome, QuizAttemptService, StepOutcome};
pub use rewards::{RewardService, RewardSink};

//! Shared error types for the services crate.

use thiserror::Error;

use nexus_core::attempt::AttemptError;
use nexus_core::model::{ProfileError, QuizId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `QuizAttemptService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("quiz {0} not found")]
    NotFound(QuizId),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `RewardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RewardServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while resolving `AppConfig`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid database url: {0:?}")]
    InvalidDatabaseUrl(String),
    #[error("invalid profile id: {0:?}")]
    InvalidProfileId(String),
    #[error("invalid write policy {0:?} (expected `optimistic` or `confirmed`)")]
    InvalidWritePolicy(String),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

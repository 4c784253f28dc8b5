use std::sync::Arc;

use nexus_core::model::{Profile, ProfileId};
use storage::repository::{ProfileRepository, Storage};

use crate::config::AppConfig;
use crate::dashboard::DashboardService;
use crate::error::AppServicesError;
use crate::quiz_attempt::QuizAttemptService;
use crate::rewards::RewardService;

const DEFAULT_PROFILE_NAME: &str = "Student";

/// Assembles app-facing services for one learner profile.
#[derive(Clone)]
pub struct AppServices {
    profile_id: ProfileId,
    storage: Storage,
    quiz_attempts: Arc<QuizAttemptService>,
    rewards: Arc<RewardService>,
    dashboard: Arc<DashboardService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or default profile
    /// setup fails.
    pub async fn new_sqlite(config: &AppConfig) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.database_url).await?;
        Self::from_storage(storage, config).await
    }

    /// Build services over in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the default profile cannot be created.
    pub async fn in_memory(config: &AppConfig) -> Result<Self, AppServicesError> {
        Self::from_storage(Storage::in_memory(), config).await
    }

    /// # Errors
    ///
    /// Returns `AppServicesError` if the default profile cannot be created.
    pub async fn from_storage(
        storage: Storage,
        config: &AppConfig,
    ) -> Result<Self, AppServicesError> {
        let profile_id = config.profile_id;
        ensure_profile(storage.profiles.as_ref(), profile_id).await?;

        let rewards = Arc::new(RewardService::new(
            profile_id,
            Arc::clone(&storage.profiles),
        ));
        let quiz_attempts = Arc::new(
            QuizAttemptService::new(Arc::clone(&storage.quizzes), rewards.clone())
                .with_policy(config.write_policy),
        );
        let dashboard = Arc::new(DashboardService::new(
            profile_id,
            Arc::clone(&storage.quizzes),
            Arc::clone(&storage.profiles),
        ));

        Ok(Self {
            profile_id,
            storage,
            quiz_attempts,
            rewards,
            dashboard,
        })
    }

    #[must_use]
    pub fn profile_id(&self) -> ProfileId {
        self.profile_id
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn quiz_attempts(&self) -> Arc<QuizAttemptService> {
        Arc::clone(&self.quiz_attempts)
    }

    #[must_use]
    pub fn rewards(&self) -> Arc<RewardService> {
        Arc::clone(&self.rewards)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }
}

async fn ensure_profile(
    profiles: &dyn ProfileRepository,
    id: ProfileId,
) -> Result<(), AppServicesError> {
    if profiles.get_profile(id).await?.is_some() {
        return Ok(());
    }
    let profile = Profile::new(id, DEFAULT_PROFILE_NAME)?;
    profiles.upsert_profile(&profile).await?;
    log::info!("created profile {id}");
    Ok(())
}

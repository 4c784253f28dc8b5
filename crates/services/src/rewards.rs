use std::sync::Arc;

use async_trait::async_trait;

use nexus_core::model::{LevelProgress, ProfileId};
use storage::repository::{ProfileRepository, StorageError};

use crate::error::RewardServiceError;

/// Receiver for points earned by completing an assessment.
///
/// The attempt flow never consumes a return value; failures are the sink's
/// concern.
#[async_trait]
pub trait RewardSink: Send + Sync {
    async fn award(&self, amount: u32, reason: &str);
}

/// Points ledger for a single learner profile.
pub struct RewardService {
    profile_id: ProfileId,
    profiles: Arc<dyn ProfileRepository>,
}

impl RewardService {
    #[must_use]
    pub fn new(profile_id: ProfileId, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self {
            profile_id,
            profiles,
        }
    }

    #[must_use]
    pub fn profile_id(&self) -> ProfileId {
        self.profile_id
    }

    /// Add points to the profile and return the new total.
    ///
    /// Zero amounts are skipped and report `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `RewardServiceError::Storage` if the profile is missing or the
    /// write fails.
    pub async fn try_award(
        &self,
        amount: u32,
        reason: &str,
    ) -> Result<Option<u64>, RewardServiceError> {
        if amount == 0 {
            return Ok(None);
        }
        let total = self.profiles.add_points(self.profile_id, amount).await?;
        log::info!(
            "awarded {amount} points to profile {} ({reason}); total {total}",
            self.profile_id
        );
        Ok(Some(total))
    }

    /// Current level of the profile.
    ///
    /// # Errors
    ///
    /// Returns `RewardServiceError::Storage` if the profile cannot be read or
    /// does not exist.
    pub async fn level(&self) -> Result<LevelProgress, RewardServiceError> {
        let profile = self
            .profiles
            .get_profile(self.profile_id)
            .await?
            .ok_or(StorageError::NotFound)?;
        Ok(profile.level())
    }
}

#[async_trait]
impl RewardSink for RewardService {
    async fn award(&self, amount: u32, reason: &str) {
        if let Err(err) = self.try_award(amount, reason).await {
            log::warn!(
                "failed to award {amount} points to profile {}: {err}",
                self.profile_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::model::Profile;
    use storage::repository::InMemoryRepository;

    async fn service_with_profile() -> (RewardService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        repo.upsert_profile(&Profile::new(ProfileId::new(1), "Student").unwrap())
            .await
            .unwrap();
        (
            RewardService::new(ProfileId::new(1), Arc::new(repo.clone())),
            repo,
        )
    }

    #[tokio::test]
    async fn award_accumulates_and_levels_up() {
        let (service, _repo) = service_with_profile().await;
        assert_eq!(service.try_award(250, "Assessment Mastered: 100%").await.unwrap(), Some(250));
        assert_eq!(service.try_award(250, "Assessment Mastered: 100%").await.unwrap(), Some(500));

        let level = service.level().await.unwrap();
        assert_eq!(level.level, 2);
        assert_eq!(level.points_into_level, 0);
    }

    #[tokio::test]
    async fn zero_award_is_ignored() {
        let (service, repo) = service_with_profile().await;
        assert_eq!(service.try_award(0, "Assessment Mastered: 0%").await.unwrap(), None);
        let profile = repo.get_profile(ProfileId::new(1)).await.unwrap().unwrap();
        assert_eq!(profile.points(), 0);
    }

    #[tokio::test]
    async fn sink_swallows_missing_profile() {
        let repo = InMemoryRepository::new();
        let service = RewardService::new(ProfileId::new(9), Arc::new(repo));
        service.award(10, "Assessment Mastered: 4%").await;
        assert!(matches!(
            service.try_award(10, "x").await,
            Err(RewardServiceError::Storage(StorageError::NotFound))
        ));
    }
}

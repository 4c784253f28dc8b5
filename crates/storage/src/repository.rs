use async_trait::async_trait;
use nexus_core::model::{Profile, ProfileId, ProgressPatch, Quiz, QuizId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for quizzes and their attempt progress.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Store a newly generated quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a quiz with the same id exists.
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError>;

    /// Fetch a quiz by ID.
    ///
    /// # Errors
    ///
    /// Returns storage errors; a missing quiz is `Ok(None)`.
    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError>;

    /// List quizzes, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if rows cannot be read or decoded.
    async fn list_quizzes(&self, limit: u32) -> Result<Vec<Quiz>, StorageError>;

    /// Every stored quiz, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if rows cannot be read or decoded.
    async fn all_quizzes(&self) -> Result<Vec<Quiz>, StorageError>;

    /// Update only the progress fields present in `patch`.
    ///
    /// Completion, score and answers in one patch land together or not at all.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz is missing, or
    /// `StorageError::Conflict` if the patch targets a completed quiz.
    async fn apply_progress(&self, id: QuizId, patch: &ProgressPatch) -> Result<(), StorageError>;
}

/// Repository contract for learner profiles and their points.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Persist or update a profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns storage errors; a missing profile is `Ok(None)`.
    async fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>, StorageError>;

    /// Add `amount` points and return the new total.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the profile is missing.
    async fn add_points(&self, id: ProfileId, amount: u32) -> Result<u64, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    quizzes: Arc<Mutex<HashMap<QuizId, Quiz>>>,
    profiles: Arc<Mutex<HashMap<ProfileId, Profile>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let mut guard = self.quizzes.lock().map_err(poisoned)?;
        if guard.contains_key(&quiz.id()) {
            return Err(StorageError::Conflict);
        }
        guard.insert(quiz.id(), quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let guard = self.quizzes.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<Quiz>, StorageError> {
        let mut all = self.all_quizzes().await?;
        all.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(all)
    }

    async fn all_quizzes(&self) -> Result<Vec<Quiz>, StorageError> {
        let guard = self.quizzes.lock().map_err(poisoned)?;
        let mut all: Vec<Quiz> = guard.values().cloned().collect();
        all.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(all)
    }

    async fn apply_progress(&self, id: QuizId, patch: &ProgressPatch) -> Result<(), StorageError> {
        let mut guard = self.quizzes.lock().map_err(poisoned)?;
        let quiz = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        if quiz.is_completed() {
            return Err(StorageError::Conflict);
        }
        quiz.apply_patch(patch)
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let mut guard = self.profiles.lock().map_err(poisoned)?;
        guard.insert(profile.id(), profile.clone());
        Ok(())
    }

    async fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>, StorageError> {
        let guard = self.profiles.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn add_points(&self, id: ProfileId, amount: u32) -> Result<u64, StorageError> {
        let mut guard = self.profiles.lock().map_err(poisoned)?;
        let profile = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        profile.add_points(amount);
        Ok(profile.points())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let profiles: Arc<dyn ProfileRepository> = Arc::new(repo);
        Self { quizzes, profiles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use nexus_core::model::{Answer, QuizQuestion};
    use nexus_core::time::fixed_now;

    fn build_quiz(id: u64, question_count: usize) -> Quiz {
        let questions = (0..question_count)
            .map(|i| {
                QuizQuestion::new(
                    format!("Q{i}"),
                    vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    i % 4,
                    "",
                    None,
                )
                .unwrap()
            })
            .collect();
        Quiz::new(
            QuizId::new(id),
            format!("Quiz {id}"),
            None,
            questions,
            NaiveDate::from_ymd_opt(2023, 11, 21).unwrap(),
            fixed_now() + Duration::minutes(i64::try_from(id).unwrap()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn patch_updates_only_named_fields() {
        let repo = InMemoryRepository::new();
        repo.insert_quiz(&build_quiz(1, 2)).await.unwrap();

        repo.apply_progress(
            QuizId::new(1),
            &ProgressPatch::answers(vec![Answer::Selected(3), Answer::Unanswered]),
        )
        .await
        .unwrap();
        repo.apply_progress(QuizId::new(1), &ProgressPatch::index(1))
            .await
            .unwrap();

        let quiz = repo.get_quiz(QuizId::new(1)).await.unwrap().unwrap();
        assert_eq!(quiz.current_index(), 1);
        assert_eq!(quiz.user_answers()[0], Answer::Selected(3));
        assert!(!quiz.is_completed());
    }

    #[tokio::test]
    async fn completed_quiz_rejects_further_patches() {
        let repo = InMemoryRepository::new();
        repo.insert_quiz(&build_quiz(1, 1)).await.unwrap();
        repo.apply_progress(
            QuizId::new(1),
            &ProgressPatch::completed(100.0, vec![Answer::Selected(0)]),
        )
        .await
        .unwrap();

        let err = repo
            .apply_progress(QuizId::new(1), &ProgressPatch::index(0))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn missing_quiz_is_not_found() {
        let repo = InMemoryRepository::new();
        assert!(repo.get_quiz(QuizId::new(9)).await.unwrap().is_none());
        let err = repo
            .apply_progress(QuizId::new(9), &ProgressPatch::index(0))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn duplicate_insert_conflicts() {
        let repo = InMemoryRepository::new();
        repo.insert_quiz(&build_quiz(1, 1)).await.unwrap();
        assert!(matches!(
            repo.insert_quiz(&build_quiz(1, 1)).await,
            Err(StorageError::Conflict)
        ));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_limited() {
        let repo = InMemoryRepository::new();
        for id in 1..=3 {
            repo.insert_quiz(&build_quiz(id, 1)).await.unwrap();
        }
        let ids: Vec<_> = repo
            .list_quizzes(2)
            .await
            .unwrap()
            .iter()
            .map(Quiz::id)
            .collect();
        assert_eq!(ids, vec![QuizId::new(3), QuizId::new(2)]);
        assert_eq!(repo.all_quizzes().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn points_accumulate() {
        let repo = InMemoryRepository::new();
        repo.upsert_profile(&Profile::new(ProfileId::new(1), "Ada").unwrap())
            .await
            .unwrap();
        assert_eq!(repo.add_points(ProfileId::new(1), 125).await.unwrap(), 125);
        assert_eq!(repo.add_points(ProfileId::new(1), 50).await.unwrap(), 175);
        assert!(matches!(
            repo.add_points(ProfileId::new(2), 1).await,
            Err(StorageError::NotFound)
        ));
    }
}

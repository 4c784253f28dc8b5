use std::sync::Arc;

use nexus_core::attempt::{Advance, QuizAttempt};
use nexus_core::model::{ProgressPatch, Quiz, QuizId};
use storage::repository::QuizRepository;

use crate::config::WritePolicy;
use crate::error::QuizServiceError;
use crate::rewards::RewardSink;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of recording an answer.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub patch: ProgressPatch,
    /// `false` only under `WritePolicy::Optimistic` when the write failed.
    pub persisted: bool,
}

/// Result of pressing "next".
///
/// A refused advance writes nothing and reports `persisted: true`.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceOutcome {
    pub advance: Advance,
    pub persisted: bool,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Drives a `QuizAttempt` and writes every transition through the repository.
pub struct QuizAttemptService {
    quizzes: Arc<dyn QuizRepository>,
    rewards: Arc<dyn RewardSink>,
    policy: WritePolicy,
}

impl QuizAttemptService {
    #[must_use]
    pub fn new(quizzes: Arc<dyn QuizRepository>, rewards: Arc<dyn RewardSink>) -> Self {
        Self {
            quizzes,
            rewards,
            policy: WritePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Load a quiz and resume its attempt where it was left.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` if the quiz does not exist, or a
    /// storage error if it cannot be read.
    pub async fn open(&self, id: QuizId) -> Result<QuizAttempt, QuizServiceError> {
        let quiz = self
            .quizzes
            .get_quiz(id)
            .await?
            .ok_or(QuizServiceError::NotFound(id))?;
        log::debug!(
            "opened quiz {id} at question {} (completed: {})",
            quiz.current_index(),
            quiz.is_completed()
        );
        Ok(QuizAttempt::resume(quiz))
    }

    /// Record `option_index` as the answer to the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Attempt` when the selection is not allowed,
    /// and `QuizServiceError::Storage` when a confirmed write fails (the
    /// attempt is left unchanged).
    pub async fn select_answer(
        &self,
        attempt: &mut QuizAttempt,
        question_index: usize,
        option_index: usize,
    ) -> Result<StepOutcome, QuizServiceError> {
        let original = attempt.clone();
        let patch = attempt.select_answer(question_index, option_index)?;
        log::debug!(
            "quiz {}: question {question_index} answered with option {option_index}",
            attempt.quiz_id()
        );
        let persisted = self.write(attempt, original, &patch).await?;
        Ok(StepOutcome { patch, persisted })
    }

    /// Move to the next question, or complete the quiz on the last one.
    ///
    /// On completion the reward is handed to the `RewardSink` once the
    /// transition has been kept.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Attempt` if the attempt is already completed,
    /// and `QuizServiceError::Storage` when a confirmed write fails (the
    /// attempt is left unchanged and nothing is awarded).
    pub async fn advance(&self, attempt: &mut QuizAttempt) -> Result<AdvanceOutcome, QuizServiceError> {
        let original = attempt.clone();
        let advance = attempt.advance()?;

        let persisted = match advance.patch() {
            Some(patch) => self.write(attempt, original, patch).await?,
            None => {
                log::debug!("quiz {}: advance refused, no answer", attempt.quiz_id());
                true
            }
        };

        if let Advance::Completed { score, reward, .. } = &advance {
            log::info!("quiz {} completed with score {score:.1}%", attempt.quiz_id());
            if reward.amount > 0 {
                self.rewards.award(reward.amount, &reward.reason).await;
            }
        }

        Ok(AdvanceOutcome { advance, persisted })
    }

    /// Leave the attempt. Progress was written on every transition, so
    /// nothing is written here.
    #[must_use]
    pub fn suspend(&self, attempt: QuizAttempt) -> Quiz {
        log::debug!(
            "quiz {} suspended at question {}",
            attempt.quiz_id(),
            attempt.current_index()
        );
        attempt.suspend()
    }

    async fn write(
        &self,
        attempt: &mut QuizAttempt,
        original: QuizAttempt,
        patch: &ProgressPatch,
    ) -> Result<bool, QuizServiceError> {
        match self.quizzes.apply_progress(attempt.quiz_id(), patch).await {
            Ok(()) => Ok(true),
            Err(err) => match self.policy {
                WritePolicy::Optimistic => {
                    log::warn!(
                        "quiz {}: failed to persist progress, keeping local state: {err}",
                        attempt.quiz_id()
                    );
                    Ok(false)
                }
                WritePolicy::Confirmed => {
                    *attempt = original;
                    Err(err.into())
                }
            },
        }
    }
}

use thiserror::Error;

use crate::model::{Answer, ProgressPatch, Quiz, QuizError, QuizId, score_answers};

/// Points awarded per percentage point of the final score.
pub const POINTS_PER_PERCENT: f64 = 2.5;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Transitions the attempt refuses to perform.
///
/// Advancing without an answer is not an error; see [`Advance::Refused`].
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("attempt is completed and read-only")]
    Completed,

    #[error("question {got} is not the current question ({expected})")]
    NotCurrentQuestion { expected: usize, got: usize },

    #[error("option {option} is outside 0..{options}")]
    OptionOutOfRange { option: usize, options: usize },

    #[error(transparent)]
    Quiz(#[from] QuizError),
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttemptState {
    InProgress { current_index: usize },
    Completed { score: f64 },
}

/// Points owed to the learner for finishing an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reward {
    pub amount: u32,
    pub reason: String,
}

impl Reward {
    #[must_use]
    pub fn for_score(score: f64) -> Self {
        let clamped = score.clamp(0.0, 100.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (amount, percent) = (
            (clamped * POINTS_PER_PERCENT).round() as u32,
            clamped.round() as u32,
        );
        Self {
            amount,
            reason: format!("Assessment Mastered: {percent}%"),
        }
    }
}

/// Outcome of [`QuizAttempt::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The current question has no answer yet; nothing changed.
    Refused,
    /// Moved to `current_index`; `patch` carries the new index.
    Moved {
        current_index: usize,
        patch: ProgressPatch,
    },
    /// Last question answered; `patch` carries completion, score and answers together.
    Completed {
        score: f64,
        patch: ProgressPatch,
        reward: Reward,
    },
}

impl Advance {
    #[must_use]
    pub fn patch(&self) -> Option<&ProgressPatch> {
        match self {
            Advance::Refused => None,
            Advance::Moved { patch, .. } | Advance::Completed { patch, .. } => Some(patch),
        }
    }
}

/// Read-only view of one question after completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionReview {
    pub selected: Answer,
    pub correct_answer: usize,
    pub is_correct: bool,
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// A single learner working through a quiz, one question at a time.
///
/// Every accepted transition is applied to the owned [`Quiz`] and returned as a
/// [`ProgressPatch`] for the caller to persist. The attempt never performs I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizAttempt {
    quiz: Quiz,
}

impl QuizAttempt {
    /// Open (or reopen) an attempt from the quiz's persisted progress.
    ///
    /// A completed quiz opens directly in [`AttemptState::Completed`].
    #[must_use]
    pub fn resume(quiz: Quiz) -> Self {
        Self { quiz }
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz.id()
    }

    #[must_use]
    pub fn state(&self) -> AttemptState {
        match (self.quiz.is_completed(), self.quiz.score()) {
            (true, Some(score)) => AttemptState::Completed { score },
            _ => AttemptState::InProgress {
                current_index: self.quiz.current_index(),
            },
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.quiz.is_completed()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.quiz.current_index()
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        self.quiz.user_answers()
    }

    /// Whether `advance` would be accepted right now.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        !self.is_completed() && self.answers()[self.current_index()].is_answered()
    }

    /// Record `option_index` for the current question, replacing any earlier selection.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if the attempt is completed, `question_index` is
    /// not the current question, or the option does not exist.
    pub fn select_answer(
        &mut self,
        question_index: usize,
        option_index: usize,
    ) -> Result<ProgressPatch, AttemptError> {
        if self.is_completed() {
            return Err(AttemptError::Completed);
        }
        let current = self.current_index();
        if question_index != current {
            return Err(AttemptError::NotCurrentQuestion {
                expected: current,
                got: question_index,
            });
        }
        let options = self.quiz.questions()[current].options().len();
        if option_index >= options {
            return Err(AttemptError::OptionOutOfRange {
                option: option_index,
                options,
            });
        }

        let mut answers = self.answers().to_vec();
        answers[current] = Answer::Selected(option_index);
        let patch = ProgressPatch::answers(answers);
        self.quiz.apply_patch(&patch)?;
        Ok(patch)
    }

    /// Move past the current question, completing the attempt on the last one.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::Completed` if the attempt is already completed.
    pub fn advance(&mut self) -> Result<Advance, AttemptError> {
        if self.is_completed() {
            return Err(AttemptError::Completed);
        }
        if !self.can_advance() {
            return Ok(Advance::Refused);
        }

        let current = self.current_index();
        if current + 1 < self.quiz.question_count() {
            let patch = ProgressPatch::index(current + 1);
            self.quiz.apply_patch(&patch)?;
            return Ok(Advance::Moved {
                current_index: current + 1,
                patch,
            });
        }

        let answers = self.answers().to_vec();
        let score = score_answers(self.quiz.questions(), &answers);
        let patch = ProgressPatch::completed(score, answers);
        self.quiz.apply_patch(&patch)?;
        Ok(Advance::Completed {
            score,
            patch,
            reward: Reward::for_score(score),
        })
    }

    /// Stop interacting without touching any progress field.
    #[must_use]
    pub fn suspend(self) -> Quiz {
        self.quiz
    }

    /// Per-question review, available once the attempt is completed.
    #[must_use]
    pub fn review(&self) -> Option<Vec<QuestionReview>> {
        if !self.is_completed() {
            return None;
        }
        Some(
            self.quiz
                .questions()
                .iter()
                .zip(self.answers())
                .map(|(q, a)| QuestionReview {
                    selected: *a,
                    correct_answer: q.correct_answer(),
                    is_correct: q.is_correct(*a),
                })
                .collect(),
        )
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

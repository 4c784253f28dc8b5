use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, QuizId};

/// Every generated question carries exactly this many options.
pub const OPTIONS_PER_QUESTION: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("expected exactly four options, got {0}")]
    InvalidOptionCount(usize),

    #[error("correct answer {index} is outside 0..{options}")]
    CorrectAnswerOutOfRange { index: usize, options: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("quiz must contain at least one question")]
    NoQuestions,

    #[error("question {index} is invalid: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },

    #[error("expected {expected} answers, got {actual}")]
    AnswerCountMismatch { expected: usize, actual: usize },

    #[error("answer {option} for question {question} is out of range")]
    AnswerOutOfRange { question: usize, option: usize },

    #[error("invalid stored answer value: {0}")]
    InvalidAnswerEncoding(i64),

    #[error("current index {index} is outside 0..{len}")]
    CurrentIndexOutOfRange { index: usize, len: usize },

    #[error("completed quiz has no score")]
    MissingScore,

    #[error("quiz has a score but is not completed")]
    UnexpectedScore,

    #[error("score must be within 0..=100, got {0}")]
    InvalidScore(f64),

    #[error("quiz is already completed")]
    AlreadyCompleted,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Clinical area a generated question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionCategory {
    Clinical,
    Dosage,
    Mechanism,
    Interaction,
}

/// A single multiple-choice question.
///
/// Serialized with the field names the question generator emits
/// (`correctAnswer`), so stored JSON and generated JSON share one shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    question: String,
    options: Vec<String>,
    correct_answer: usize,
    #[serde(default)]
    explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<QuestionCategory>,
}

impl QuizQuestion {
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, the option count is not
    /// four, or the correct answer does not index into the options.
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
        explanation: impl Into<String>,
        category: Option<QuestionCategory>,
    ) -> Result<Self, QuestionError> {
        let question = Self {
            question: question.into(),
            options,
            correct_answer,
            explanation: explanation.into(),
            category,
        };
        question.validate()?;
        Ok(question)
    }

    /// Re-check invariants on a question obtained through deserialization.
    ///
    /// # Errors
    ///
    /// Same conditions as [`QuizQuestion::new`].
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.question.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(QuestionError::InvalidOptionCount(self.options.len()));
        }
        if self.correct_answer >= self.options.len() {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                index: self.correct_answer,
                options: self.options.len(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn category(&self) -> Option<QuestionCategory> {
        self.category
    }

    #[must_use]
    pub fn is_correct(&self, answer: Answer) -> bool {
        answer.selected() == Some(self.correct_answer)
    }
}

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

/// A user's selection for one question.
///
/// Stored as an integer: `-1` for unanswered, otherwise the option index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Answer {
    #[default]
    Unanswered,
    Selected(usize),
}

impl Answer {
    /// Storage sentinel for "no option selected yet".
    pub const UNANSWERED: i64 = -1;

    #[must_use]
    pub fn selected(self) -> Option<usize> {
        match self {
            Answer::Unanswered => None,
            Answer::Selected(i) => Some(i),
        }
    }

    #[must_use]
    pub fn is_answered(self) -> bool {
        matches!(self, Answer::Selected(_))
    }

    /// Decode the stored integer form.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidAnswerEncoding` for negatives other than `-1`.
    pub fn from_raw(raw: i64) -> Result<Self, QuizError> {
        match raw {
            Self::UNANSWERED => Ok(Answer::Unanswered),
            v if v >= 0 => usize::try_from(v)
                .map(Answer::Selected)
                .map_err(|_| QuizError::InvalidAnswerEncoding(v)),
            v => Err(QuizError::InvalidAnswerEncoding(v)),
        }
    }

    #[must_use]
    pub fn to_raw(self) -> i64 {
        match self {
            Answer::Unanswered => Self::UNANSWERED,
            Answer::Selected(i) => i64::try_from(i).unwrap_or(i64::MAX),
        }
    }
}

impl TryFrom<i64> for Answer {
    type Error = QuizError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::from_raw(raw)
    }
}

impl From<Answer> for i64 {
    fn from(answer: Answer) -> Self {
        answer.to_raw()
    }
}

//
// ─── PROGRESS PATCH ────────────────────────────────────────────────────────────
//

/// Score recorded when an attempt completes. `completed` and `score` only ever
/// travel together through this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion {
    pub score: f64,
}

/// Partial update of a quiz's progress fields.
///
/// `None` fields are left unchanged by whoever applies the patch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressPatch {
    pub current_index: Option<usize>,
    pub user_answers: Option<Vec<Answer>>,
    pub completion: Option<Completion>,
}

impl ProgressPatch {
    #[must_use]
    pub fn answers(answers: Vec<Answer>) -> Self {
        Self {
            user_answers: Some(answers),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn index(current_index: usize) -> Self {
        Self {
            current_index: Some(current_index),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn completed(score: f64, answers: Vec<Answer>) -> Self {
        Self {
            current_index: None,
            user_answers: Some(answers),
            completion: Some(Completion { score }),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current_index.is_none() && self.user_answers.is_none() && self.completion.is_none()
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Progress fields as read back from storage; absent values take fresh-quiz defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersistedProgress {
    pub completed: bool,
    pub score: Option<f64>,
    pub user_answers: Option<Vec<Answer>>,
    pub current_index: Option<usize>,
}

/// Percentage of correct answers, `100 * correct / len`.
#[must_use]
pub fn score_answers(questions: &[QuizQuestion], answers: &[Answer]) -> f64 {
    if questions.is_empty() {
        return 0.0;
    }
    let correct = questions
        .iter()
        .zip(answers)
        .filter(|(q, a)| q.is_correct(**a))
        .count();

    #[allow(clippy::cast_precision_loss)]
    let pct = 100.0 * correct as f64 / questions.len() as f64;
    pct
}

/// An ordered set of questions plus the single attempt's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    id: QuizId,
    title: String,
    course_id: Option<CourseId>,
    questions: Vec<QuizQuestion>,
    deadline: NaiveDate,
    completed: bool,
    score: Option<f64>,
    user_answers: Vec<Answer>,
    current_index: usize,
    created_at: DateTime<Utc>,
}

impl Quiz {
    /// Create a fresh, unattempted quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the title is blank, there are no questions, or
    /// any question is malformed.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        course_id: Option<CourseId>,
        questions: Vec<QuizQuestion>,
        deadline: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        Self::from_persisted(
            id,
            title,
            course_id,
            questions,
            deadline,
            created_at,
            PersistedProgress::default(),
        )
    }

    /// Rehydrate a quiz from storage, restoring progress defaults.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` when the stored progress violates quiz invariants.
    pub fn from_persisted(
        id: QuizId,
        title: impl Into<String>,
        course_id: Option<CourseId>,
        questions: Vec<QuizQuestion>,
        deadline: NaiveDate,
        created_at: DateTime<Utc>,
        progress: PersistedProgress,
    ) -> Result<Self, QuizError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        for (index, q) in questions.iter().enumerate() {
            q.validate()
                .map_err(|source| QuizError::InvalidQuestion { index, source })?;
        }

        let user_answers = progress
            .user_answers
            .unwrap_or_else(|| vec![Answer::Unanswered; questions.len()]);
        check_answers(&questions, &user_answers)?;

        let current_index = progress.current_index.unwrap_or(0);
        check_index(current_index, questions.len())?;

        match (progress.completed, progress.score) {
            (true, None) => return Err(QuizError::MissingScore),
            (false, Some(_)) => return Err(QuizError::UnexpectedScore),
            (true, Some(score)) => check_score(score)?,
            (false, None) => {}
        }

        Ok(Self {
            id,
            title,
            course_id,
            questions,
            deadline,
            completed: progress.completed,
            score: progress.score,
            user_answers,
            current_index,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn course_id(&self) -> Option<CourseId> {
        self.course_id
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn deadline(&self) -> NaiveDate {
        self.deadline
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    #[must_use]
    pub fn user_answers(&self) -> &[Answer] {
        &self.user_answers
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Pending quiz whose deadline falls on `date`.
    #[must_use]
    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        !self.completed && self.deadline == date
    }

    /// Apply a progress patch, validating the whole patch before mutating.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AlreadyCompleted` for any patch against a completed
    /// quiz, or a validation error if the patch would break an invariant.
    pub fn apply_patch(&mut self, patch: &ProgressPatch) -> Result<(), QuizError> {
        if self.completed {
            return Err(QuizError::AlreadyCompleted);
        }
        if let Some(index) = patch.current_index {
            check_index(index, self.questions.len())?;
        }
        if let Some(answers) = &patch.user_answers {
            check_answers(&self.questions, answers)?;
        }
        if let Some(completion) = patch.completion {
            check_score(completion.score)?;
        }

        if let Some(index) = patch.current_index {
            self.current_index = index;
        }
        if let Some(answers) = &patch.user_answers {
            self.user_answers.clone_from(answers);
        }
        if let Some(completion) = patch.completion {
            self.completed = true;
            self.score = Some(completion.score);
        }
        Ok(())
    }
}

fn check_index(index: usize, len: usize) -> Result<(), QuizError> {
    if index >= len {
        return Err(QuizError::CurrentIndexOutOfRange { index, len });
    }
    Ok(())
}

fn check_score(score: f64) -> Result<(), QuizError> {
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err(QuizError::InvalidScore(score));
    }
    Ok(())
}

fn check_answers(questions: &[QuizQuestion], answers: &[Answer]) -> Result<(), QuizError> {
    if answers.len() != questions.len() {
        return Err(QuizError::AnswerCountMismatch {
            expected: questions.len(),
            actual: answers.len(),
        });
    }
    for (question, (q, a)) in questions.iter().zip(answers).enumerate() {
        if let Answer::Selected(option) = *a {
            if option >= q.options().len() {
                return Err(QuizError::AnswerOutOfRange { question, option });
            }
        }
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

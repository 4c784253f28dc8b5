mod ids;
mod material;
mod profile;
mod quiz;

pub use ids::{CourseId, EventId, MaterialId, ParseIdError, ProfileId, QuizId};

pub use material::{Material, MaterialKind, StudyEvent};
pub use profile::{LevelProgress, POINTS_PER_LEVEL, Profile, ProfileError};
pub use quiz::{
    Answer, Completion, OPTIONS_PER_QUESTION, PersistedProgress, ProgressPatch, QuestionCategory,
    QuestionError, Quiz, QuizError, QuizQuestion, score_answers,
};

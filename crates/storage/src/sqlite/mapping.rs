use nexus_core::model::{
    Answer, CourseId, PersistedProgress, Profile, ProfileId, Quiz, QuizId, QuizQuestion,
};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn encode_questions(questions: &[QuizQuestion]) -> Result<String, StorageError> {
    serde_json::to_string(questions).map_err(ser)
}

pub(crate) fn encode_answers(answers: &[Answer]) -> Result<String, StorageError> {
    serde_json::to_string(answers).map_err(ser)
}

pub(crate) fn encode_index(index: usize) -> Result<i64, StorageError> {
    i64::try_from(index).map_err(|_| StorageError::Serialization("current_index overflow".into()))
}

pub(crate) fn map_quiz_row(row: &sqlx::sqlite::SqliteRow) -> Result<Quiz, StorageError> {
    let id = QuizId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?);
    let course_id = row
        .try_get::<Option<i64>, _>("course_id")
        .map_err(ser)?
        .map(|v| i64_to_u64("course_id", v).map(CourseId::new))
        .transpose()?;

    let questions_json: String = row.try_get("questions").map_err(ser)?;
    let questions: Vec<QuizQuestion> = serde_json::from_str(&questions_json).map_err(ser)?;

    let user_answers = row
        .try_get::<Option<String>, _>("user_answers")
        .map_err(ser)?
        .map(|json| serde_json::from_str::<Vec<Answer>>(&json).map_err(ser))
        .transpose()?;

    let current_index = row
        .try_get::<Option<i64>, _>("current_index")
        .map_err(ser)?
        .map(|v| {
            usize::try_from(v)
                .map_err(|_| StorageError::Serialization(format!("invalid current_index: {v}")))
        })
        .transpose()?;

    let progress = PersistedProgress {
        completed: row.try_get("completed").map_err(ser)?,
        score: row.try_get("score").map_err(ser)?,
        user_answers,
        current_index,
    };

    Quiz::from_persisted(
        id,
        row.try_get::<String, _>("title").map_err(ser)?,
        course_id,
        questions,
        row.try_get("deadline").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
        progress,
    )
    .map_err(ser)
}

pub(crate) fn map_profile_row(row: &sqlx::sqlite::SqliteRow) -> Result<Profile, StorageError> {
    let id = ProfileId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?);
    let points = i64_to_u64("points", row.try_get("points").map_err(ser)?)?;
    Profile::from_persisted(id, row.try_get::<String, _>("name").map_err(ser)?, points)
        .map_err(ser)
}

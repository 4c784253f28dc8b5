use nexus_core::model::{ProgressPatch, Quiz, QuizId};

use super::SqliteRepository;
use super::mapping::{
    conn, encode_answers, encode_index, encode_questions, id_i64, map_quiz_row, ser,
};
use crate::repository::{QuizRepository, StorageError};

const QUIZ_COLUMNS: &str = "id, title, course_id, questions, deadline, completed, score, \
                            user_answers, current_index, created_at";

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let id = id_i64("id", quiz.id().value())?;
        let course_id = quiz
            .course_id()
            .map(|c| id_i64("course_id", c.value()))
            .transpose()?;

        let res = sqlx::query(
            r"
                INSERT INTO quizzes (
                    id, title, course_id, questions, deadline, completed, score,
                    user_answers, current_index, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(id)
        .bind(quiz.title())
        .bind(course_id)
        .bind(encode_questions(quiz.questions())?)
        .bind(quiz.deadline())
        .bind(quiz.is_completed())
        .bind(quiz.score())
        .bind(encode_answers(quiz.user_answers())?)
        .bind(encode_index(quiz.current_index())?)
        .bind(quiz.created_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_i64("id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_quiz_row).transpose()
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<Quiz>, StorageError> {
        let sql = format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes ORDER BY created_at DESC, id DESC LIMIT ?1"
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_quiz_row(&row)?);
        }
        Ok(out)
    }

    async fn all_quizzes(&self) -> Result<Vec<Quiz>, StorageError> {
        let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;
        rows.iter().map(map_quiz_row).collect()
    }

    async fn apply_progress(&self, id: QuizId, patch: &ProgressPatch) -> Result<(), StorageError> {
        let id = id_i64("id", id.value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        // Validate against the stored quiz so storage never holds a state the
        // domain would reject.
        let sql = format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;
        let mut quiz = map_quiz_row(&row)?;
        if quiz.is_completed() {
            return Err(StorageError::Conflict);
        }
        quiz.apply_patch(patch).map_err(ser)?;

        let answers = patch
            .user_answers
            .as_deref()
            .map(encode_answers)
            .transpose()?;
        let index = patch.current_index.map(encode_index).transpose()?;
        let score = patch.completion.map(|c| c.score);

        sqlx::query(
            r"
                UPDATE quizzes SET
                    current_index = COALESCE(?1, current_index),
                    user_answers = COALESCE(?2, user_answers),
                    score = COALESCE(?3, score),
                    completed = CASE WHEN ?3 IS NULL THEN completed ELSE 1 END
                WHERE id = ?4
            ",
        )
        .bind(index)
        .bind(answers)
        .bind(score)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}

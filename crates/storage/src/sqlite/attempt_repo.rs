use sphere_core::model::{QuizAttempt, QuizId};

use super::SqliteRepository;
use super::mapping::{conn, map_attempt_row, quiz_id_to_i64};
use crate::repository::{AttemptRepository, AttemptRow, AttemptRowId, StorageError};

fn insert_error(e: sqlx::Error) -> StorageError {
    match e.as_database_error() {
        Some(db) if db.is_foreign_key_violation() => StorageError::NotFound,
        _ => conn(e),
    }
}

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<AttemptRowId, StorageError> {
        let result = attempt.result();

        let res = sqlx::query(
            r"
                INSERT INTO quiz_attempts (
                    quiz_id, session_id, started_at, completed_at,
                    correct_count, total_questions, elapsed_secs, passed
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(quiz_id_to_i64(attempt.quiz_id())?)
        .bind(attempt.session_id().as_uuid())
        .bind(attempt.started_at())
        .bind(attempt.completed_at())
        .bind(i64::from(result.correct_count))
        .bind(i64::from(result.total_questions))
        .bind(i64::from(result.elapsed_secs))
        .bind(i64::from(result.passed))
        .execute(&self.pool)
        .await
        .map_err(insert_error)?;

        Ok(res.last_insert_rowid())
    }

    async fn get_attempt(&self, id: AttemptRowId) -> Result<QuizAttempt, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, quiz_id, session_id, started_at, completed_at,
                       correct_count, total_questions, elapsed_secs, passed
                FROM quiz_attempts
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_attempt_row(&row).map(|row| row.attempt)
    }

    async fn list_attempts(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, quiz_id, session_id, started_at, completed_at,
                       correct_count, total_questions, elapsed_secs, passed
                FROM quiz_attempts
                WHERE quiz_id = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(quiz_id_to_i64(quiz_id)?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_attempt_row).collect()
    }
}

use sphere_core::model::{Question, Quiz, QuizId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};

use super::SqliteRepository;
use super::mapping::{
    conn, map_question_row, options_to_json, quiz_id_from_i64, quiz_id_to_i64, ser,
};
use crate::repository::{NewQuizRecord, QuizRepository, StorageError};

async fn insert_questions(
    tx: &mut SqliteConnection,
    quiz_id: i64,
    questions: &[Question],
) -> Result<(), StorageError> {
    for (position, question) in questions.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| StorageError::Serialization("position overflow".into()))?;
        sqlx::query(
            r"
            INSERT INTO quiz_questions (quiz_id, position, text, options, correct_option)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(quiz_id)
        .bind(position)
        .bind(question.text())
        .bind(options_to_json(question)?)
        .bind(question.correct_option())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
    }
    Ok(())
}

async fn load_questions(pool: &SqlitePool, quiz_id: i64) -> Result<Vec<Question>, StorageError> {
    let rows = sqlx::query(
        r"
        SELECT text, options, correct_option
        FROM quiz_questions
        WHERE quiz_id = ?1
        ORDER BY position ASC
        ",
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await
    .map_err(conn)?;

    rows.iter().map(map_question_row).collect()
}

async fn quiz_from_row(pool: &SqlitePool, row: &SqliteRow) -> Result<Quiz, StorageError> {
    let raw_id: i64 = row.try_get("id").map_err(ser)?;
    let questions = load_questions(pool, raw_id).await?;

    Quiz::new(
        quiz_id_from_i64(raw_id)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        questions,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

async fn commit(tx: Transaction<'_, Sqlite>) -> Result<(), StorageError> {
    tx.commit().await.map_err(conn)
}

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn insert_new_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
            INSERT INTO quizzes (title, description, created_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(quiz.created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        let raw_id = res.last_insert_rowid();
        insert_questions(&mut tx, raw_id, &quiz.questions).await?;
        commit(tx).await?;

        quiz_id_from_i64(raw_id)
    }

    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let raw_id = quiz_id_to_i64(quiz.id())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO quizzes (id, title, description, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description
            ",
        )
        .bind(raw_id)
        .bind(quiz.title())
        .bind(quiz.description())
        .bind(quiz.created_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        // The bank is replaced wholesale so positions stay dense.
        sqlx::query("DELETE FROM quiz_questions WHERE quiz_id = ?1")
            .bind(raw_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        insert_questions(&mut tx, raw_id, quiz.questions()).await?;

        commit(tx).await
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, created_at
            FROM quizzes WHERE id = ?1
            ",
        )
        .bind(quiz_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => quiz_from_row(&self.pool, &row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<Quiz>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, created_at
            FROM quizzes
            ORDER BY id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut quizzes = Vec::with_capacity(rows.len());
        for row in &rows {
            quizzes.push(quiz_from_row(&self.pool, row).await?);
        }
        Ok(quizzes)
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM quizzes WHERE id = ?1")
            .bind(quiz_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

use sphere_core::model::{
    Question, QuizAttempt, QuizId, QuizResult, SessionId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use sqlx::types::Uuid;

use crate::repository::{AttemptRow, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn quiz_id_to_i64(id: QuizId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("quiz_id overflow".into()))
}

pub(crate) fn quiz_id_from_i64(v: i64) -> Result<QuizId, StorageError> {
    u64::try_from(v)
        .map(QuizId::new)
        .map_err(|_| StorageError::Serialization("quiz_id sign overflow".into()))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn options_to_json(question: &Question) -> Result<String, StorageError> {
    serde_json::to_string(question.options()).map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let text: String = row.try_get("text").map_err(ser)?;
    let options_json: String = row.try_get("options").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options_json).map_err(ser)?;
    let correct_option: String = row.try_get("correct_option").map_err(ser)?;

    Question::new(text, options, correct_option).map_err(ser)
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<AttemptRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let quiz_id = quiz_id_from_i64(row.try_get::<i64, _>("quiz_id").map_err(ser)?)?;
    let session_id = SessionId::from_uuid(row.try_get::<Uuid, _>("session_id").map_err(ser)?);
    let started_at = row.try_get("started_at").map_err(ser)?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;

    let result = QuizResult {
        correct_count: u32_from_i64(
            "correct_count",
            row.try_get::<i64, _>("correct_count").map_err(ser)?,
        )?,
        total_questions: u32_from_i64(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        elapsed_secs: u32_from_i64(
            "elapsed_secs",
            row.try_get::<i64, _>("elapsed_secs").map_err(ser)?,
        )?,
        passed: row.try_get::<i64, _>("passed").map_err(ser)? != 0,
    };

    let attempt =
        QuizAttempt::from_persisted(quiz_id, session_id, started_at, completed_at, result)
            .map_err(ser)?;
    Ok(AttemptRow::new(id, attempt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_id_conversions_reject_overflow() {
        assert!(quiz_id_to_i64(QuizId::new(u64::MAX)).is_err());
        assert!(quiz_id_from_i64(-1).is_err());
        assert_eq!(quiz_id_from_i64(5).unwrap(), QuizId::new(5));
    }

    #[test]
    fn options_serialize_as_json_array() {
        let q = Question::new("Q", ["a", "b \"quoted\""], "a").unwrap();
        assert_eq!(options_to_json(&q).unwrap(), r#"["a","b \"quoted\""]"#);
    }
}

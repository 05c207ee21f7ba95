use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use sphere_core::model::{QuizAttempt, QuizId, SessionId};
use storage::repository::{AttemptRepository, AttemptRow, AttemptRowId};

use crate::error::SessionError;

/// How many attempts `best_attempt` looks back over.
const BEST_ATTEMPT_WINDOW: u32 = 500;

/// Presentation-agnostic list item for a finished attempt.
///
/// No pre-formatted strings; callers format times and percentages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptListItem {
    pub id: AttemptRowId,
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,

    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
    pub elapsed_secs: u32,
    pub passed: bool,
}

impl AttemptListItem {
    #[must_use]
    pub fn from_attempt(id: AttemptRowId, attempt: &QuizAttempt) -> Self {
        let result = attempt.result();
        Self {
            id,
            session_id: attempt.session_id(),
            started_at: attempt.started_at(),
            completed_at: attempt.completed_at(),
            correct: result.correct_count,
            total: result.total_questions,
            percentage: result.percentage(),
            elapsed_secs: result.elapsed_secs,
            passed: result.passed,
        }
    }

    fn from_row(row: &AttemptRow) -> Self {
        Self::from_attempt(row.id, &row.attempt)
    }
}

/// Read side of the attempt store.
#[derive(Clone)]
pub struct AttemptHistoryService {
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptHistoryService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { attempts }
    }

    /// Most recent attempts for a quiz, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_recent(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<AttemptListItem>, SessionError> {
        let rows = self.attempts.list_attempts(quiz_id, limit).await?;
        Ok(rows.iter().map(AttemptListItem::from_row).collect())
    }

    /// Highest-scoring attempt; ties go to the faster, then the earlier one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn best_attempt(
        &self,
        quiz_id: QuizId,
    ) -> Result<Option<AttemptListItem>, SessionError> {
        let rows = self
            .attempts
            .list_attempts(quiz_id, BEST_ATTEMPT_WINDOW)
            .await?;

        Ok(rows
            .iter()
            .map(AttemptListItem::from_row)
            .min_by(|a, b| {
                b.percentage
                    .cmp(&a.percentage)
                    .then(a.elapsed_secs.cmp(&b.elapsed_secs))
                    .then(a.completed_at.cmp(&b.completed_at))
            }))
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuizId, SessionId};

/// Minimum share of correct answers, in percent, for an attempt to pass.
pub const PASS_THRESHOLD_PERCENT: u32 = 60;

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

/// Score of a finished quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub correct_count: u32,
    pub total_questions: u32,
    pub elapsed_secs: u32,
    pub passed: bool,
}

impl QuizResult {
    /// Builds a result, deriving `passed` from the fixed threshold.
    #[must_use]
    pub fn new(correct_count: u32, total_questions: u32, elapsed_secs: u32) -> Self {
        Self {
            correct_count,
            total_questions,
            elapsed_secs,
            passed: passes(correct_count, total_questions),
        }
    }

    /// Score rounded to the nearest whole percent.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        let scaled = u64::from(self.correct_count) * 100 + u64::from(self.total_questions) / 2;
        u32::try_from(scaled / u64::from(self.total_questions)).unwrap_or(u32::MAX)
    }
}

fn passes(correct: u32, total: u32) -> bool {
    total > 0 && u64::from(correct) * 100 >= u64::from(total) * u64::from(PASS_THRESHOLD_PERCENT)
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizAttemptError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("attempt has no questions")]
    NoQuestions,

    #[error("correct answers ({correct}) exceed total questions ({total})")]
    CountMismatch { correct: u32, total: u32 },

    #[error("stored pass flag does not match the score")]
    PassedMismatch,
}

/// Historical record of one finished quiz session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    quiz_id: QuizId,
    session_id: SessionId,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    result: QuizResult,
}

impl QuizAttempt {
    /// Records a finished session.
    ///
    /// # Errors
    ///
    /// Returns `QuizAttemptError` if the time range or counts are inconsistent.
    pub fn new(
        quiz_id: QuizId,
        session_id: SessionId,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        result: QuizResult,
    ) -> Result<Self, QuizAttemptError> {
        Self::from_persisted(quiz_id, session_id, started_at, completed_at, result)
    }

    /// Rehydrate an attempt from storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizAttemptError::PassedMismatch` if the stored flag disagrees
    /// with the threshold, plus the checks done by [`QuizAttempt::new`].
    pub fn from_persisted(
        quiz_id: QuizId,
        session_id: SessionId,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        result: QuizResult,
    ) -> Result<Self, QuizAttemptError> {
        if completed_at < started_at {
            return Err(QuizAttemptError::InvalidTimeRange);
        }
        if result.total_questions == 0 {
            return Err(QuizAttemptError::NoQuestions);
        }
        if result.correct_count > result.total_questions {
            return Err(QuizAttemptError::CountMismatch {
                correct: result.correct_count,
                total: result.total_questions,
            });
        }
        if result.passed != passes(result.correct_count, result.total_questions) {
            return Err(QuizAttemptError::PassedMismatch);
        }

        Ok(Self {
            quiz_id,
            session_id,
            started_at,
            completed_at,
            result,
        })
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn result(&self) -> QuizResult {
        self.result
    }
}

//! Shared error types for the services crate.

use thiserror::Error;

use sphere_core::InvalidQuizError;
use sphere_core::model::{QuizAttemptError, QuizError, QuizId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("quiz {0} not found")]
    NotFound(QuizId),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz {0} not found")]
    QuizNotFound(QuizId),
    #[error(transparent)]
    InvalidQuiz(#[from] InvalidQuizError),
    #[error(transparent)]
    Attempt(#[from] QuizAttemptError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

use thiserror::Error;

use crate::model::{QuestionError, QuizAttemptError, QuizError};
use crate::session::{InvalidQuizError, SettingsError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Attempt(#[from] QuizAttemptError),
    #[error(transparent)]
    InvalidQuiz(#[from] InvalidQuizError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

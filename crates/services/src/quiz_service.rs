use std::sync::Arc;

use sphere_core::model::{QuestionDraft, Quiz, QuizDraft, QuizId};
use storage::repository::{NewQuizRecord, QuizRepository, StorageError};

use crate::Clock;
use crate::error::QuizServiceError;

/// Partial update of a quiz. `None` leaves the field untouched.
///
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub questions: Option<Vec<QuestionDraft>>,
}

/// Orchestrates quiz bank creation and persistence.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(clock: Clock, quizzes: Arc<dyn QuizRepository>) -> Self {
        Self { clock, quizzes }
    }

    /// Validate a draft and persist it as a new quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` for validation failures.
    /// Returns `QuizServiceError::Storage` if persistence fails.
    pub async fn create_quiz(&self, draft: QuizDraft) -> Result<QuizId, QuizServiceError> {
        let validated = draft.validate(self.clock.now())?;
        let quiz_id = self
            .quizzes
            .insert_new_quiz(NewQuizRecord::from_validated(&validated))
            .await?;
        log::debug!(
            "created quiz {quiz_id} with {} questions",
            validated.questions.len()
        );
        Ok(quiz_id)
    }

    /// List quizzes ordered by ID, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn list_quizzes(&self, limit: u32) -> Result<Vec<Quiz>, QuizServiceError> {
        Ok(self.quizzes.list_quizzes(limit).await?)
    }

    /// Fetch a quiz by ID.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` when the quiz does not exist.
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn get_quiz(&self, quiz_id: QuizId) -> Result<Quiz, QuizServiceError> {
        self.quizzes
            .get_quiz(quiz_id)
            .await?
            .ok_or(QuizServiceError::NotFound(quiz_id))
    }

    /// Apply a partial update, keeping the quiz id and creation time.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` when the quiz does not exist.
    /// Returns `QuizServiceError::Quiz` if the changed fields are invalid.
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn update_quiz(
        &self,
        quiz_id: QuizId,
        update: QuizUpdate,
    ) -> Result<Quiz, QuizServiceError> {
        let quiz = self.get_quiz(quiz_id).await?;
        let updated = quiz.with_changes(update.title, update.description, update.questions)?;
        self.quizzes.upsert_quiz(&updated).await?;
        Ok(updated)
    }

    /// Remove a quiz together with its attempt history.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` when the quiz does not exist.
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn delete_quiz(&self, quiz_id: QuizId) -> Result<(), QuizServiceError> {
        match self.quizzes.delete_quiz(quiz_id).await {
            Ok(()) => {
                log::debug!("deleted quiz {quiz_id}");
                Ok(())
            }
            Err(StorageError::NotFound) => Err(QuizServiceError::NotFound(quiz_id)),
            Err(e) => Err(e.into()),
        }
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sphere_core::model::{Question, Quiz, QuizAttempt, QuizId, ValidatedQuiz};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Row identifier of a persisted attempt.
pub type AttemptRowId = i64;

/// Insert shape for a quiz whose id is assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuizRecord {
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

impl NewQuizRecord {
    #[must_use]
    pub fn from_validated(quiz: &ValidatedQuiz) -> Self {
        Self {
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            questions: quiz.questions.clone(),
            created_at: quiz.created_at,
        }
    }

    fn into_quiz(self, id: QuizId) -> Quiz {
        ValidatedQuiz {
            title: self.title,
            description: self.description,
            questions: self.questions,
            created_at: self.created_at,
        }
        .assign_id(id)
    }
}

/// A stored attempt together with its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRow {
    pub id: AttemptRowId,
    pub attempt: QuizAttempt,
}

impl AttemptRow {
    #[must_use]
    pub fn new(id: AttemptRowId, attempt: QuizAttempt) -> Self {
        Self { id, attempt }
    }
}

/// Quiz bank contract.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist a new quiz and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn insert_new_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError>;

    /// Persist or replace a quiz, including its whole question bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError>;

    /// Fetch a quiz by ID, `None` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend or mapping failures.
    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError>;

    /// List quizzes ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend or mapping failures.
    async fn list_quizzes(&self, limit: u32) -> Result<Vec<Quiz>, StorageError>;

    /// Delete a quiz together with its questions and attempts.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no such quiz exists.
    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError>;
}

/// Sink and history for finished attempts.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Append a finished attempt and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored, including when
    /// its quiz no longer exists.
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<AttemptRowId, StorageError>;

    /// Fetch one attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_attempt(&self, id: AttemptRowId) -> Result<QuizAttempt, StorageError>;

    /// Most recent attempts for a quiz, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend or mapping failures.
    async fn list_attempts(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    quizzes: Arc<Mutex<BTreeMap<QuizId, Quiz>>>,
    attempts: Arc<Mutex<Vec<AttemptRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn limit_usize(limit: u32) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn insert_new_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError> {
        let mut guard = self.quizzes.lock().map_err(poisoned)?;
        let next = guard.keys().next_back().map_or(1, |id| id.value() + 1);
        let id = QuizId::new(next);
        guard.insert(id, quiz.into_quiz(id));
        Ok(id)
    }

    async fn upsert_quiz(&self, quiz: &Quiz) -> Result<(), StorageError> {
        let mut guard = self.quizzes.lock().map_err(poisoned)?;
        guard.insert(quiz.id(), quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let guard = self.quizzes.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_quizzes(&self, limit: u32) -> Result<Vec<Quiz>, StorageError> {
        let guard = self.quizzes.lock().map_err(poisoned)?;
        Ok(guard.values().take(limit_usize(limit)).cloned().collect())
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        {
            let mut guard = self.quizzes.lock().map_err(poisoned)?;
            guard.remove(&id).ok_or(StorageError::NotFound)?;
        }
        let mut attempts = self.attempts.lock().map_err(poisoned)?;
        attempts.retain(|row| row.attempt.quiz_id() != id);
        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<AttemptRowId, StorageError> {
        if !self
            .quizzes
            .lock()
            .map_err(poisoned)?
            .contains_key(&attempt.quiz_id())
        {
            return Err(StorageError::NotFound);
        }

        let mut guard = self.attempts.lock().map_err(poisoned)?;
        let id = guard.last().map_or(1, |row| row.id + 1);
        guard.push(AttemptRow::new(id, attempt.clone()));
        Ok(id)
    }

    async fn get_attempt(&self, id: AttemptRowId) -> Result<QuizAttempt, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.attempt.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_attempts(
        &self,
        quiz_id: QuizId,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let guard = self.attempts.lock().map_err(poisoned)?;
        let mut rows: Vec<AttemptRow> = guard
            .iter()
            .filter(|row| row.attempt.quiz_id() == quiz_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.attempt
                .completed_at()
                .cmp(&a.attempt.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(limit_usize(limit));
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self { quizzes, attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sphere_core::model::{QuestionDraft, QuizDraft, QuizResult, SessionId};
    use sphere_core::time::fixed_now;

    fn new_quiz(title: &str, questions: usize) -> NewQuizRecord {
        let validated = QuizDraft {
            title: title.into(),
            description: None,
            questions: (0..questions)
                .map(|i| QuestionDraft::new(format!("Q{i}"), ["a", "b"], "a"))
                .collect(),
        }
        .validate(fixed_now())
        .unwrap();
        NewQuizRecord::from_validated(&validated)
    }

    fn attempt(quiz_id: QuizId, offset_secs: i64, correct: u32) -> QuizAttempt {
        let started = fixed_now() + Duration::seconds(offset_secs);
        QuizAttempt::new(
            quiz_id,
            SessionId::generate(),
            started,
            started + Duration::seconds(60),
            QuizResult::new(correct, 5, 60),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn assigns_sequential_quiz_ids() {
        let repo = InMemoryRepository::new();
        let first = repo.insert_new_quiz(new_quiz("One", 2)).await.unwrap();
        let second = repo.insert_new_quiz(new_quiz("Two", 3)).await.unwrap();
        assert_eq!(first, QuizId::new(1));
        assert_eq!(second, QuizId::new(2));

        let listed = repo.list_quizzes(10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].question_count(), 3);
        assert_eq!(repo.list_quizzes(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_quiz_and_attempts() {
        let repo = InMemoryRepository::new();
        let id = repo.insert_new_quiz(new_quiz("Gone", 5)).await.unwrap();
        repo.append_attempt(&attempt(id, 0, 3)).await.unwrap();

        repo.delete_quiz(id).await.unwrap();
        assert!(repo.get_quiz(id).await.unwrap().is_none());
        assert!(repo.list_attempts(id, 10).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_quiz(id).await.unwrap_err(),
            StorageError::NotFound
        ));
    }

    #[tokio::test]
    async fn attempts_list_newest_first() {
        let repo = InMemoryRepository::new();
        let id = repo.insert_new_quiz(new_quiz("History", 5)).await.unwrap();
        let old = repo.append_attempt(&attempt(id, 0, 1)).await.unwrap();
        let new = repo.append_attempt(&attempt(id, 600, 4)).await.unwrap();

        let rows = repo.list_attempts(id, 10).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![new, old]);
        assert_eq!(repo.get_attempt(old).await.unwrap().result().correct_count, 1);
    }

    #[tokio::test]
    async fn attempt_for_unknown_quiz_is_rejected() {
        let repo = InMemoryRepository::new();
        let err = repo
            .append_attempt(&attempt(QuizId::new(99), 0, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }
}

use std::sync::Arc;

use sphere_core::SessionSettings;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::quiz_service::QuizService;
use crate::sessions::{AttemptHistoryService, QuizSessionService, Sampling};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    quizzes: Arc<QuizService>,
    sessions: Arc<QuizSessionService>,
    history: Arc<AttemptHistoryService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        sampling: Sampling,
        settings: SessionSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, sampling, settings))
    }

    /// Build services over in-memory repositories.
    #[must_use]
    pub fn in_memory(clock: Clock, sampling: Sampling) -> Self {
        Self::from_storage(
            &Storage::in_memory(),
            clock,
            sampling,
            SessionSettings::standard(),
        )
    }

    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        sampling: Sampling,
        settings: SessionSettings,
    ) -> Self {
        let quizzes = Arc::new(QuizService::new(clock, Arc::clone(&storage.quizzes)));
        let sessions = Arc::new(
            QuizSessionService::new(
                clock,
                Arc::clone(&storage.quizzes),
                Arc::clone(&storage.attempts),
            )
            .with_settings(settings)
            .with_sampling(sampling),
        );
        let history = Arc::new(AttemptHistoryService::new(Arc::clone(&storage.attempts)));

        Self {
            quizzes,
            sessions,
            history,
        }
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn history(&self) -> Arc<AttemptHistoryService> {
        Arc::clone(&self.history)
    }
}

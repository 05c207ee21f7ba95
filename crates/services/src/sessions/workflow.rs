use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::task::JoinHandle;

use sphere_core::model::{QuizAttempt, QuizId, QuizResult};
use sphere_core::{QuizSession, SessionSettings};
use storage::repository::{AttemptRepository, AttemptRowId, QuizRepository};

use super::reporter::ResultReporter;
use super::sampling::Sampling;
use crate::Clock;
use crate::error::SessionError;

/// A running attempt plus the bookkeeping the core session does not carry.
#[derive(Debug)]
pub struct ActiveSession {
    session: QuizSession,
    rng: StdRng,
    started_at: DateTime<Utc>,
    reported: bool,
}

impl ActiveSession {
    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut QuizSession {
        &mut self.session
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether this attempt has already been handed to the reporter.
    #[must_use]
    pub fn is_reported(&self) -> bool {
        self.reported
    }
}

/// Result of finishing an attempt.
///
/// `report` is `None` when the attempt had already been reported.
#[derive(Debug)]
pub struct FinishedAttempt {
    pub result: QuizResult,
    pub report: Option<JoinHandle<Option<AttemptRowId>>>,
}

/// Orchestrates quiz attempts: start, retry and finish with reporting.
#[derive(Clone)]
pub struct QuizSessionService {
    clock: Clock,
    settings: SessionSettings,
    sampling: Sampling,
    quizzes: Arc<dyn QuizRepository>,
    reporter: ResultReporter,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            settings: SessionSettings::standard(),
            sampling: Sampling::Entropy,
            quizzes,
            reporter: ResultReporter::new(attempts),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Load a quiz and start an attempt on it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuizNotFound` if the quiz does not exist,
    /// `SessionError::InvalidQuiz` if it has no questions, and
    /// `SessionError::Storage` on repository failures.
    pub async fn start_session(&self, quiz_id: QuizId) -> Result<ActiveSession, SessionError> {
        let quiz = self
            .quizzes
            .get_quiz(quiz_id)
            .await?
            .ok_or(SessionError::QuizNotFound(quiz_id))?;

        let mut rng = self.sampling.rng();
        let session = QuizSession::start(quiz, self.settings, &mut rng)?;

        Ok(ActiveSession {
            session,
            rng,
            started_at: self.clock.now(),
            reported: false,
        })
    }

    /// Start over with a fresh sample of the quiz as it is stored now, so
    /// edits and deletions since the last attempt take effect.
    ///
    /// An unreported finished attempt is dropped, not reported. On error
    /// `active` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::QuizNotFound` if the quiz was deleted,
    /// `SessionError::InvalidQuiz` if it no longer has questions, and
    /// `SessionError::Storage` on repository failures.
    pub async fn restart_session(&self, active: &mut ActiveSession) -> Result<(), SessionError> {
        let quiz_id = active.session.quiz().id();
        let quiz = self
            .quizzes
            .get_quiz(quiz_id)
            .await?
            .ok_or(SessionError::QuizNotFound(quiz_id))?;

        active.session = QuizSession::start(quiz, *active.session.settings(), &mut active.rng)?;
        active.started_at = self.clock.now();
        active.reported = false;
        Ok(())
    }

    /// Finish the attempt and report it once.
    ///
    /// The result is returned straight away; storing it happens on a
    /// spawned task. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Attempt` if the attempt record cannot be built.
    pub fn finish_session(
        &self,
        active: &mut ActiveSession,
    ) -> Result<FinishedAttempt, SessionError> {
        let result = active.session.finish();
        if active.reported {
            return Ok(FinishedAttempt {
                result,
                report: None,
            });
        }

        let completed_at = self.clock.now().max(active.started_at);
        let attempt = QuizAttempt::new(
            active.session.quiz().id(),
            active.session.id(),
            active.started_at,
            completed_at,
            result,
        )?;
        active.reported = true;

        Ok(FinishedAttempt {
            result,
            report: Some(self.reporter.report(attempt)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sphere_core::model::{QuestionDraft, QuizDraft};
    use sphere_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, NewQuizRecord};

    async fn setup(questions: usize) -> (InMemoryRepository, QuizSessionService, QuizId) {
        let repo = InMemoryRepository::new();
        let validated = QuizDraft {
            title: "Workflow".into(),
            description: None,
            questions: (0..questions)
                .map(|i| QuestionDraft::new(format!("Q{i}"), ["right", "wrong"], "right"))
                .collect(),
        }
        .validate(fixed_now())
        .unwrap();
        let quiz_id = repo
            .insert_new_quiz(NewQuizRecord::from_validated(&validated))
            .await
            .unwrap();

        let service = QuizSessionService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
        .with_sampling(Sampling::Seeded(11));
        (repo, service, quiz_id)
    }

    #[tokio::test]
    async fn start_samples_configured_question_count() {
        let (_repo, service, quiz_id) = setup(8).await;
        let active = service.start_session(quiz_id).await.unwrap();
        assert_eq!(active.session().sampled_questions().len(), 5);
        assert_eq!(active.started_at(), fixed_now());
    }

    #[tokio::test]
    async fn start_rejects_missing_and_empty_quizzes() {
        let (repo, service, _) = setup(0).await;
        let empty = repo.list_quizzes(1).await.unwrap()[0].id();

        assert!(matches!(
            service.start_session(empty).await.unwrap_err(),
            SessionError::InvalidQuiz(_)
        ));
        assert!(matches!(
            service.start_session(QuizId::new(77)).await.unwrap_err(),
            SessionError::QuizNotFound(_)
        ));
    }

    #[tokio::test]
    async fn finish_reports_once() {
        let (repo, service, quiz_id) = setup(5).await;
        let mut active = service.start_session(quiz_id).await.unwrap();
        active.session_mut().answer("right");

        let finished = service.finish_session(&mut active).unwrap();
        assert_eq!(finished.result.correct_count, 1);
        let row = finished.report.expect("first finish reports").await.unwrap();
        assert!(row.is_some());

        let again = service.finish_session(&mut active).unwrap();
        assert!(again.report.is_none());
        assert_eq!(again.result, finished.result);
        assert_eq!(repo.list_attempts(quiz_id, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn restart_allows_another_report() {
        let (repo, service, quiz_id) = setup(6).await;
        let mut active = service.start_session(quiz_id).await.unwrap();
        let first_id = active.session().id();

        let first = service.finish_session(&mut active).unwrap();
        first.report.unwrap().await.unwrap();

        service.restart_session(&mut active).await.unwrap();
        assert!(!active.is_reported());
        assert_ne!(active.session().id(), first_id);
        assert!(!active.session().is_finished());

        let second = service.finish_session(&mut active).unwrap();
        second.report.unwrap().await.unwrap();
        assert_eq!(repo.list_attempts(quiz_id, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn restart_after_delete_is_not_found() {
        let (repo, service, quiz_id) = setup(5).await;
        let mut active = service.start_session(quiz_id).await.unwrap();
        service.finish_session(&mut active).unwrap();
        let first_id = active.session().id();

        repo.delete_quiz(quiz_id).await.unwrap();

        assert!(matches!(
            service.restart_session(&mut active).await.unwrap_err(),
            SessionError::QuizNotFound(id) if id == quiz_id
        ));
        assert!(active.is_reported());
        assert!(active.session().is_finished());
        assert_eq!(active.session().id(), first_id);
    }

    #[tokio::test]
    async fn restart_samples_the_stored_quiz() {
        let (repo, service, quiz_id) = setup(5).await;
        let mut active = service.start_session(quiz_id).await.unwrap();
        service.finish_session(&mut active).unwrap();

        let edited = QuizDraft {
            title: "Workflow v2".into(),
            description: None,
            questions: (0..7)
                .map(|i| QuestionDraft::new(format!("New{i}"), ["yes", "no"], "yes"))
                .collect(),
        }
        .validate(fixed_now())
        .unwrap()
        .assign_id(quiz_id);
        repo.upsert_quiz(&edited).await.unwrap();

        service.restart_session(&mut active).await.unwrap();
        let session = active.session();
        assert_eq!(session.quiz().title(), "Workflow v2");
        assert_eq!(session.sampled_questions().len(), 5);
        assert!(
            session
                .sampled_questions()
                .iter()
                .all(|q| q.text().starts_with("New"))
        );
    }

    #[tokio::test]
    async fn seeded_services_sample_identically() {
        let (_repo, service, quiz_id) = setup(12).await;
        let a = service.start_session(quiz_id).await.unwrap();
        let b = service.start_session(quiz_id).await.unwrap();
        assert_eq!(
            a.session().sampled_questions(),
            b.session().sampled_questions()
        );
    }
}

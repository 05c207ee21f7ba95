//! Timed quiz attempt state machine.
//!
//! A [`QuizSession`] samples a handful of questions from a quiz bank and walks
//! the player through them. It is driven entirely by discrete calls: one
//! [`QuizSession::tick`] per elapsed second, one [`QuizSession::answer`] per
//! click, one [`QuizSession::advance`] or [`QuizSession::jump_to`] per
//! navigation. Nothing here blocks, sleeps or reads the wall clock, so tests
//! drive it synchronously.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::model::{Question, Quiz, QuizId, QuizResult, SessionId};

pub const DEFAULT_QUESTIONS_PER_SESSION: u32 = 5;
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 300;
pub const DEFAULT_REVEAL_DELAY_MS: u32 = 1_000;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// The quiz cannot be attempted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidQuizError {
    #[error("quiz {quiz_id} has no questions")]
    NoQuestions { quiz_id: QuizId },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("questions per session must be between 1 and 50")]
    InvalidQuestionsPerSession,

    #[error("time limit must be between 10 and 7200 seconds")]
    InvalidTimeLimit,

    #[error("reveal delay must be at most 5000 ms")]
    InvalidRevealDelay,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Tunables for a quiz attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    questions_per_session: u32,
    time_limit_secs: u32,
    reveal_delay_ms: u32,
}

impl SessionSettings {
    /// Five questions, five minutes, one second to show the answer highlight.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            questions_per_session: DEFAULT_QUESTIONS_PER_SESSION,
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            reveal_delay_ms: DEFAULT_REVEAL_DELAY_MS,
        }
    }

    /// Creates custom settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` when a value is outside its allowed range.
    pub fn new(
        questions_per_session: u32,
        time_limit_secs: u32,
        reveal_delay_ms: u32,
    ) -> Result<Self, SettingsError> {
        if !(1..=50).contains(&questions_per_session) {
            return Err(SettingsError::InvalidQuestionsPerSession);
        }
        if !(10..=7_200).contains(&time_limit_secs) {
            return Err(SettingsError::InvalidTimeLimit);
        }
        if reveal_delay_ms > 5_000 {
            return Err(SettingsError::InvalidRevealDelay);
        }

        Ok(Self {
            questions_per_session,
            time_limit_secs,
            reveal_delay_ms,
        })
    }

    #[must_use]
    pub fn questions_per_session(&self) -> u32 {
        self.questions_per_session
    }

    #[must_use]
    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    /// How long a driver should show the correct/incorrect highlight before
    /// calling [`QuizSession::advance`].
    #[must_use]
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.reveal_delay_ms))
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::standard()
    }
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    InProgress,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Recorded { correct: bool },
    /// Session finished, question already answered, or not one of its options.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Moved { index: usize },
    /// Last question reached with questions still flagged. The session stays
    /// in progress until the caller confirms with [`QuizSession::finish`].
    ReviewPending { flagged: Vec<usize> },
    Finished,
}

/// Marker shown for each question in the progress strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Unanswered,
    Answered,
    Flagged,
}

/// One line of the post-quiz answer review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry<'a> {
    pub index: usize,
    pub question: &'a Question,
    pub selected: Option<&'a str>,
    pub correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub current_index: usize,
    pub total: usize,
    pub answered: usize,
    pub flagged: usize,
    pub remaining_secs: u32,
    pub status: SessionStatus,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One timed attempt at a quiz.
///
/// Owned by whoever started it and never persisted; only the final
/// [`QuizResult`] leaves the session.
pub struct QuizSession {
    id: SessionId,
    quiz: Quiz,
    settings: SessionSettings,
    sampled: Vec<Question>,
    current: usize,
    answers: Vec<Option<String>>,
    flagged: BTreeSet<usize>,
    remaining_secs: u32,
    correct_count: u32,
    status: SessionStatus,
}

impl QuizSession {
    /// Starts an attempt with `min(questions_per_session, bank size)` questions
    /// drawn without replacement, in random order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuizError::NoQuestions` if the quiz bank is empty.
    pub fn start<R: Rng + ?Sized>(
        quiz: Quiz,
        settings: SessionSettings,
        rng: &mut R,
    ) -> Result<Self, InvalidQuizError> {
        if quiz.questions().is_empty() {
            return Err(InvalidQuizError::NoQuestions { quiz_id: quiz.id() });
        }
        Ok(Self::fresh(quiz, settings, rng))
    }

    /// Starts over on the same quiz: new sample, score, timer and flags.
    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        *self = Self::fresh(self.quiz.clone(), self.settings, rng);
    }

    fn fresh<R: Rng + ?Sized>(quiz: Quiz, settings: SessionSettings, rng: &mut R) -> Self {
        let limit = usize::try_from(settings.questions_per_session()).unwrap_or(usize::MAX);
        let mut sampled = quiz.questions().to_vec();
        sampled.shuffle(rng);
        sampled.truncate(limit);

        let id = SessionId::generate();
        debug!(
            "session {id} started on quiz {} with {} of {} questions",
            quiz.id(),
            sampled.len(),
            quiz.question_count()
        );

        Self {
            id,
            answers: vec![None; sampled.len()],
            sampled,
            quiz,
            settings,
            current: 0,
            flagged: BTreeSet::new(),
            remaining_secs: settings.time_limit_secs(),
            correct_count: 0,
            status: SessionStatus::InProgress,
        }
    }

    /// One second elapsed. Running out of time finishes the session.
    pub fn tick(&mut self) -> SessionStatus {
        if self.is_finished() {
            return self.status;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            debug!("session {} timed out", self.id);
            self.status = SessionStatus::Finished;
        }
        self.status
    }

    /// Records an answer for the current question.
    ///
    /// Only the first answer per question counts; later calls are ignored, as
    /// are options that do not belong to the question.
    pub fn answer(&mut self, option: &str) -> AnswerOutcome {
        if self.is_finished() || self.answers[self.current].is_some() {
            return AnswerOutcome::Ignored;
        }

        let question = &self.sampled[self.current];
        if !question.has_option(option) {
            return AnswerOutcome::Ignored;
        }

        let correct = question.is_correct(option);
        if correct {
            self.correct_count += 1;
        }
        self.answers[self.current] = Some(option.to_owned());

        AnswerOutcome::Recorded { correct }
    }

    /// Moves to the next question, or wraps up after the last one.
    pub fn advance(&mut self) -> AdvanceOutcome {
        if self.is_finished() {
            return AdvanceOutcome::Finished;
        }

        if self.current + 1 < self.sampled.len() {
            self.current += 1;
            return AdvanceOutcome::Moved {
                index: self.current,
            };
        }

        if !self.flagged.is_empty() {
            return AdvanceOutcome::ReviewPending {
                flagged: self.flagged.iter().copied().collect(),
            };
        }

        self.status = SessionStatus::Finished;
        debug!("session {} finished after last question", self.id);
        AdvanceOutcome::Finished
    }

    /// Navigates to `index` without touching answers or status.
    ///
    /// Returns `false` if the index is out of range.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index >= self.sampled.len() {
            return false;
        }
        self.current = index;
        true
    }

    /// Steps back one question, staying put on the first.
    pub fn previous(&mut self) -> usize {
        self.current = self.current.saturating_sub(1);
        self.current
    }

    /// Jumps to the lowest flagged question, if any.
    pub fn jump_to_first_flagged(&mut self) -> Option<usize> {
        let first = self.flagged.first().copied()?;
        self.current = first;
        Some(first)
    }

    /// Flags or unflags a question for review.
    ///
    /// Returns whether the question is flagged afterwards, or `None` if the
    /// session is finished or the index is out of range.
    pub fn toggle_flag(&mut self, index: usize) -> Option<bool> {
        if self.is_finished() || index >= self.sampled.len() {
            return None;
        }
        if self.flagged.remove(&index) {
            Some(false)
        } else {
            self.flagged.insert(index);
            Some(true)
        }
    }

    /// Ends the attempt, whatever state it is in, and scores it.
    pub fn finish(&mut self) -> QuizResult {
        if !self.is_finished() {
            self.status = SessionStatus::Finished;
            debug!("session {} finished on request", self.id);
        }
        self.result()
    }

    /// Score so far.
    #[must_use]
    pub fn result(&self) -> QuizResult {
        QuizResult::new(
            self.correct_count,
            u32::try_from(self.sampled.len()).unwrap_or(u32::MAX),
            self.elapsed_secs(),
        )
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[must_use]
    pub fn sampled_questions(&self) -> &[Question] {
        &self.sampled
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.sampled[self.current]
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<String>] {
        &self.answers
    }

    #[must_use]
    pub fn flagged(&self) -> &BTreeSet<usize> {
        &self.flagged
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.settings
            .time_limit_secs()
            .saturating_sub(self.remaining_secs)
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == SessionStatus::Finished
    }

    /// Flagged takes precedence over answered.
    #[must_use]
    pub fn question_status(&self, index: usize) -> Option<QuestionStatus> {
        let answer = self.answers.get(index)?;
        Some(if self.flagged.contains(&index) {
            QuestionStatus::Flagged
        } else if answer.is_some() {
            QuestionStatus::Answered
        } else {
            QuestionStatus::Unanswered
        })
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            current_index: self.current,
            total: self.sampled.len(),
            answered: self.answers.iter().filter(|a| a.is_some()).count(),
            flagged: self.flagged.len(),
            remaining_secs: self.remaining_secs,
            status: self.status,
        }
    }

    /// Per-question review: what was picked and whether it was right.
    #[must_use]
    pub fn review(&self) -> Vec<ReviewEntry<'_>> {
        self.sampled
            .iter()
            .zip(&self.answers)
            .enumerate()
            .map(|(index, (question, answer))| {
                let selected = answer.as_deref();
                ReviewEntry {
                    index,
                    question,
                    selected,
                    correct: selected.is_some_and(|s| question.is_correct(s)),
                }
            })
            .collect()
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("quiz_id", &self.quiz.id())
            .field("sampled_len", &self.sampled.len())
            .field("current", &self.current)
            .field("flagged", &self.flagged)
            .field("remaining_secs", &self.remaining_secs)
            .field("correct_count", &self.correct_count)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionDraft, QuizDraft};
    use crate::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn build_quiz(questions: usize) -> Quiz {
        QuizDraft {
            title: "General Knowledge".into(),
            description: None,
            questions: (0..questions)
                .map(|i| {
                    QuestionDraft::new(
                        format!("Q{i}"),
                        [format!("right{i}"), format!("wrong{i}")],
                        format!("right{i}"),
                    )
                })
                .collect(),
        }
        .validate(fixed_now())
        .unwrap()
        .assign_id(QuizId::new(1))
    }

    fn start(questions: usize, seed: u64) -> QuizSession {
        let mut rng = StdRng::seed_from_u64(seed);
        QuizSession::start(build_quiz(questions), SessionSettings::standard(), &mut rng).unwrap()
    }

    fn texts(session: &QuizSession) -> Vec<String> {
        session
            .sampled_questions()
            .iter()
            .map(|q| q.text().to_owned())
            .collect()
    }

    fn wrong_option(question: &Question) -> String {
        question
            .options()
            .iter()
            .find(|o| !question.is_correct(o))
            .cloned()
            .unwrap()
    }

    fn answer_current(session: &mut QuizSession, correct: bool) -> AnswerOutcome {
        let question = session.current_question();
        let option = if correct {
            question.correct_option().to_owned()
        } else {
            wrong_option(question)
        };
        session.answer(&option)
    }

    #[test]
    fn samples_min_of_five_and_bank_size() {
        for n in 1..=12 {
            let session = start(n, 1);
            assert_eq!(session.sampled_questions().len(), n.min(5));
            assert_eq!(session.answers().len(), n.min(5));
        }
    }

    #[test]
    fn sample_has_no_duplicates() {
        for seed in 0..20 {
            let session = start(15, seed);
            let unique: HashSet<_> = texts(&session).into_iter().collect();
            assert_eq!(unique.len(), 5);
        }
    }

    #[test]
    fn repeated_starts_vary_the_sample() {
        let mut rng = StdRng::seed_from_u64(7);
        let quiz = build_quiz(12);
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let session =
                QuizSession::start(quiz.clone(), SessionSettings::standard(), &mut rng).unwrap();
            seen.insert(texts(&session));
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        assert_eq!(texts(&start(15, 42)), texts(&start(15, 42)));
    }

    #[test]
    fn fresh_session_state() {
        let session = start(10, 3);
        assert_eq!(session.current_index(), 0);
        assert!(session.answers().iter().all(Option::is_none));
        assert!(session.flagged().is_empty());
        assert_eq!(session.remaining_secs(), 300);
        assert_eq!(session.status(), SessionStatus::InProgress);
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = QuizSession::start(build_quiz(0), SessionSettings::standard(), &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            InvalidQuizError::NoQuestions {
                quiz_id: QuizId::new(1)
            }
        );
    }

    #[test]
    fn all_correct_answers_pass() {
        let mut session = start(10, 5);
        while !session.is_finished() {
            assert_eq!(
                answer_current(&mut session, true),
                AnswerOutcome::Recorded { correct: true }
            );
            session.advance();
        }

        let result = session.finish();
        assert_eq!(result.correct_count, 5);
        assert_eq!(result.total_questions, 5);
        assert!(result.passed);
    }

    #[test]
    fn all_wrong_answers_fail() {
        let mut session = start(10, 5);
        while !session.is_finished() {
            answer_current(&mut session, false);
            session.advance();
        }

        let result = session.finish();
        assert_eq!(result.correct_count, 0);
        assert!(!result.passed);
    }

    #[test]
    fn pass_threshold_boundary() {
        for (correct, passed) in [(3, true), (2, false)] {
            let mut session = start(10, 9);
            for i in 0..5 {
                answer_current(&mut session, i < correct);
                session.advance();
            }
            let result = session.finish();
            assert_eq!(result.correct_count, u32::try_from(correct).unwrap());
            assert_eq!(result.passed, passed);
        }
    }

    #[test]
    fn timeout_finishes_session() {
        let mut session = start(10, 1);
        for _ in 0..299 {
            assert_eq!(session.tick(), SessionStatus::InProgress);
        }
        assert_eq!(session.tick(), SessionStatus::Finished);

        let result = session.finish();
        assert_eq!(result.correct_count, 0);
        assert_eq!(result.elapsed_secs, 300);
        assert!(!result.passed);
    }

    #[test]
    fn tick_after_finish_is_noop() {
        let mut session = start(10, 1);
        session.tick();
        session.finish();
        assert_eq!(session.tick(), SessionStatus::Finished);
        assert_eq!(session.remaining_secs(), 299);
        assert_eq!(session.finish().elapsed_secs, 1);
    }

    #[test]
    fn answers_are_ignored_after_timeout() {
        let mut session = start(10, 1);
        for _ in 0..300 {
            session.tick();
        }
        assert_eq!(answer_current(&mut session, true), AnswerOutcome::Ignored);
        assert!(session.answers().iter().all(Option::is_none));
    }

    #[test]
    fn flag_toggle_is_idempotent() {
        let mut session = start(10, 1);
        session.toggle_flag(1);
        let before = session.flagged().clone();

        assert_eq!(session.toggle_flag(3), Some(true));
        assert_eq!(session.toggle_flag(3), Some(false));
        assert_eq!(session.flagged(), &before);
    }

    #[test]
    fn flag_rejects_out_of_range_and_finished() {
        let mut session = start(10, 1);
        assert_eq!(session.toggle_flag(5), None);
        session.finish();
        assert_eq!(session.toggle_flag(0), None);
        assert!(session.flagged().is_empty());
    }

    #[test]
    fn single_answer_lock() {
        let mut session = start(10, 2);
        let question = session.current_question().clone();
        let wrong = wrong_option(&question);

        assert_eq!(
            session.answer(&wrong),
            AnswerOutcome::Recorded { correct: false }
        );
        assert_eq!(
            session.answer(question.correct_option()),
            AnswerOutcome::Ignored
        );
        assert_eq!(session.answers()[0].as_deref(), Some(wrong.as_str()));
        assert_eq!(session.result().correct_count, 0);
    }

    #[test]
    fn unknown_option_is_ignored() {
        let mut session = start(10, 2);
        assert_eq!(session.answer("not an option"), AnswerOutcome::Ignored);
        assert!(session.answers()[0].is_none());
    }

    #[test]
    fn flagged_questions_hold_back_finish() {
        let mut session = start(10, 4);
        session.toggle_flag(1);

        for _ in 0..4 {
            answer_current(&mut session, true);
            assert!(matches!(session.advance(), AdvanceOutcome::Moved { .. }));
        }
        answer_current(&mut session, true);

        assert_eq!(
            session.advance(),
            AdvanceOutcome::ReviewPending { flagged: vec![1] }
        );
        assert_eq!(session.status(), SessionStatus::InProgress);

        assert_eq!(session.jump_to_first_flagged(), Some(1));
        assert_eq!(session.current_index(), 1);

        let result = session.finish();
        assert_eq!(session.status(), SessionStatus::Finished);
        assert_eq!(result.correct_count, 5);
        assert_eq!(session.advance(), AdvanceOutcome::Finished);
    }

    #[test]
    fn jump_only_moves_the_cursor() {
        let mut session = start(10, 4);
        answer_current(&mut session, true);

        assert!(session.jump_to(3));
        assert_eq!(session.current_index(), 3);
        assert!(session.jump_to(3));
        assert!(!session.jump_to(5));
        assert_eq!(session.current_index(), 3);
        assert_eq!(session.status(), SessionStatus::InProgress);
        assert_eq!(session.progress().answered, 1);

        assert_eq!(session.previous(), 2);
        session.jump_to(0);
        assert_eq!(session.previous(), 0);
        assert_eq!(session.jump_to_first_flagged(), None);
    }

    #[test]
    fn restart_resets_state() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut session =
            QuizSession::start(build_quiz(15), SessionSettings::standard(), &mut rng).unwrap();
        let first_id = session.id();
        let first_sample = texts(&session);

        answer_current(&mut session, true);
        session.advance();
        session.toggle_flag(2);
        for _ in 0..30 {
            session.tick();
        }

        let mut resampled = false;
        for _ in 0..20 {
            session.restart(&mut rng);
            assert_eq!(session.current_index(), 0);
            assert_eq!(session.remaining_secs(), 300);
            assert!(session.answers().iter().all(Option::is_none));
            assert!(session.flagged().is_empty());
            assert_eq!(session.status(), SessionStatus::InProgress);
            assert_eq!(session.result().correct_count, 0);
            assert_eq!(session.sampled_questions().len(), 5);
            assert_ne!(session.id(), first_id);
            resampled |= texts(&session) != first_sample;
        }
        assert!(resampled);
    }

    #[test]
    fn question_status_prefers_flag() {
        let mut session = start(10, 6);
        answer_current(&mut session, false);
        assert_eq!(session.question_status(0), Some(QuestionStatus::Answered));
        assert_eq!(session.question_status(1), Some(QuestionStatus::Unanswered));

        session.toggle_flag(0);
        assert_eq!(session.question_status(0), Some(QuestionStatus::Flagged));
        assert_eq!(session.question_status(9), None);
    }

    #[test]
    fn review_lists_every_sampled_question() {
        let mut session = start(10, 8);
        answer_current(&mut session, true);
        session.advance();
        answer_current(&mut session, false);
        session.finish();

        let review = session.review();
        assert_eq!(review.len(), 5);
        assert!(review[0].correct);
        assert!(!review[1].correct);
        assert!(review[1].selected.is_some());
        assert_eq!(review[2].selected, None);
        assert!(!review[2].correct);
    }

    #[test]
    fn custom_settings_shape_the_session() {
        let settings = SessionSettings::new(3, 60, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let session = QuizSession::start(build_quiz(10), settings, &mut rng).unwrap();
        assert_eq!(session.sampled_questions().len(), 3);
        assert_eq!(session.remaining_secs(), 60);
        assert_eq!(session.settings().reveal_delay(), Duration::ZERO);
    }

    #[test]
    fn settings_reject_out_of_range_values() {
        assert_eq!(
            SessionSettings::new(0, 300, 0).unwrap_err(),
            SettingsError::InvalidQuestionsPerSession
        );
        assert_eq!(
            SessionSettings::new(5, 5, 0).unwrap_err(),
            SettingsError::InvalidTimeLimit
        );
        assert_eq!(
            SessionSettings::new(5, 300, 10_000).unwrap_err(),
            SettingsError::InvalidRevealDelay
        );
        assert_eq!(
            SessionSettings::standard().reveal_delay(),
            Duration::from_millis(1_000)
        );
    }
}

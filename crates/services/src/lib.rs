#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod quiz_service;
pub mod sessions;

pub use sphere_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use error::{AppServicesError, QuizServiceError, SessionError};
pub use quiz_service::{QuizService, QuizUpdate};

pub use sessions::{
    ActiveSession, AttemptHistoryService, AttemptListItem, FinishedAttempt, IntervalTicker,
    ManualTicker, QuizSessionService, ResultReporter, Sampling, TickSource, drive_countdown,
};

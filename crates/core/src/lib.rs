#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod session;
pub mod time;

pub use error::Error;
pub use session::{
    AdvanceOutcome, AnswerOutcome, InvalidQuizError, QuestionStatus, QuizSession, ReviewEntry,
    SessionProgress, SessionSettings, SessionStatus, SettingsError,
};
pub use time::Clock;

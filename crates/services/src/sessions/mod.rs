mod history;
mod reporter;
mod sampling;
mod timer;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use history::{AttemptHistoryService, AttemptListItem};
pub use reporter::ResultReporter;
pub use sampling::Sampling;
pub use timer::{IntervalTicker, ManualTicker, TICK_PERIOD, TickSource, drive_countdown};
pub use workflow::{ActiveSession, FinishedAttempt, QuizSessionService};

mod attempt;
mod ids;
mod question;
mod quiz;

pub use ids::{ParseIdError, QuizId, SessionId};

pub use attempt::{PASS_THRESHOLD_PERCENT, QuizAttempt, QuizAttemptError, QuizResult};
pub use question::{MIN_OPTIONS, Question, QuestionDraft, QuestionError};
pub use quiz::{Quiz, QuizDraft, QuizError, ValidatedQuiz};

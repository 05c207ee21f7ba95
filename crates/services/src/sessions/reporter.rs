use std::sync::Arc;

use log::{debug, warn};
use sphere_core::model::QuizAttempt;
use storage::repository::{AttemptRepository, AttemptRowId};
use tokio::task::JoinHandle;

/// Hands finished attempts to the attempt store without holding up the player.
///
/// The write runs on a spawned task. A failed write is logged and dropped;
/// the in-memory result the player already sees is never affected.
#[derive(Clone)]
pub struct ResultReporter {
    attempts: Arc<dyn AttemptRepository>,
}

impl ResultReporter {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { attempts }
    }

    /// Spawn the write. Must be called from within a tokio runtime.
    ///
    /// The handle resolves to the stored row id, or `None` if the write
    /// failed. Dropping it detaches the task.
    pub fn report(&self, attempt: QuizAttempt) -> JoinHandle<Option<AttemptRowId>> {
        let attempts = Arc::clone(&self.attempts);
        tokio::spawn(async move {
            match attempts.append_attempt(&attempt).await {
                Ok(id) => {
                    debug!(
                        "stored attempt {id} for session {} on quiz {}",
                        attempt.session_id(),
                        attempt.quiz_id()
                    );
                    Some(id)
                }
                Err(err) => {
                    warn!(
                        "failed to store attempt for session {} on quiz {}: {err}",
                        attempt.session_id(),
                        attempt.quiz_id()
                    );
                    None
                }
            }
        })
    }
}

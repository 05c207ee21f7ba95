//! Countdown tick sources.
//!
//! A session only knows about whole-second ticks. Production drives it from a
//! tokio interval; tests use [`ManualTicker`] so no real time passes.

use std::time::Duration;

use async_trait::async_trait;
use sphere_core::{QuizSession, SessionStatus};
use sphere_core::model::QuizResult;
use tokio::time::{Instant, Interval, MissedTickBehavior};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Yields once per elapsed second.
#[async_trait]
pub trait TickSource: Send {
    async fn next_tick(&mut self);
}

/// Wall-clock ticks from `tokio::time`.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// First tick fires one period from now, not immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::with_period(TICK_PERIOD)
    }

    #[must_use]
    pub fn with_period(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

impl Default for IntervalTicker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TickSource for IntervalTicker {
    async fn next_tick(&mut self) {
        self.interval.tick().await;
    }
}

/// Ticks that resolve immediately and are counted.
#[derive(Debug, Default)]
pub struct ManualTicker {
    ticks: u64,
}

impl ManualTicker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[async_trait]
impl TickSource for ManualTicker {
    async fn next_tick(&mut self) {
        self.ticks += 1;
        tokio::task::yield_now().await;
    }
}

/// Ticks `session` until it finishes, then returns its result.
///
/// Returns at once if the session is already finished.
pub async fn drive_countdown<T>(session: &mut QuizSession, ticker: &mut T) -> QuizResult
where
    T: TickSource + ?Sized,
{
    while session.status() == SessionStatus::InProgress {
        ticker.next_tick().await;
        session.tick();
    }
    session.result()
}

//! Retry configuration and backoff.

use std::sync::Arc;
use std::time::Duration;

use crate::sleep::{Sleeper, ThreadSleeper};

/// Maps the 1-based count of attempts made so far to the pause before the next.
pub type Backoff = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// Step used by [`linear_backoff`].
const BACKOFF_STEP: Duration = Duration::from_millis(100);

/// Default backoff: `n * 100ms`.
///
/// Historically called "exponential" by callers; it grows linearly and the
/// exact values are relied on.
pub fn linear_backoff(attempt: u32) -> Duration {
    BACKOFF_STEP.saturating_mul(attempt)
}

/// How many times to try a task and how to pause in between.
#[derive(Clone)]
pub struct RetryConfig {
    times: u32,
    backoff: Backoff,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryConfig {
    /// Try up to `times` times with [`linear_backoff`] on the real clock.
    ///
    /// `times` is clamped to at least 1: a task always runs once.
    pub fn new(times: u32) -> Self {
        Self {
            times: times.max(1),
            backoff: Arc::new(linear_backoff),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn with_backoff<F>(mut self, backoff: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        self.backoff = Arc::new(backoff);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn times(&self) -> u32 {
        self.times
    }

    /// Pause after the `attempt`-th failure (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        (self.backoff)(attempt)
    }

    pub(crate) fn sleeper(&self) -> &dyn Sleeper {
        self.sleeper.as_ref()
    }
}

impl std::fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryConfig")
            .field("times", &self.times)
            .finish_non_exhaustive()
    }
}

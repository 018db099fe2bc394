//! Pausing the current thread of execution.
//!
//! Retry backoff goes through a [`Sleeper`] so tests can swap in a fake that
//! counts calls instead of waiting.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use reqkit_core::ExecutionContext;

use crate::clock::{Clock, SystemClock};

/// Granularity at which [`CancellableSleeper`] re-checks its scope.
const POLL_SLICE: Duration = Duration::from_millis(10);

pub trait Sleeper: Send + Sync {
    /// Block for at least `duration` (implementations may return early).
    fn sleep(&self, duration: Duration);
}

/// Sleeps on the real clock.
#[derive(Debug, Default, Copy, Clone)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Sleeps on the real clock but wakes early once its scope is cancelled or
/// past its deadline.
///
/// The retry loop itself never looks at cancellation; plugging this sleeper
/// in is how a caller makes backoff pauses honor the scope.
#[derive(Clone)]
pub struct CancellableSleeper {
    cancellation: CancellationToken,
    deadline: Option<DateTime<Utc>>,
    clock: Arc<dyn Clock>,
}

impl CancellableSleeper {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            deadline: None,
            clock: Arc::new(SystemClock::utc()),
        }
    }

    /// Sleeper bound to `ctx`'s cancellation signal and deadline.
    pub fn for_context(ctx: &ExecutionContext) -> Self {
        Self {
            cancellation: ctx.cancellation().clone(),
            deadline: ctx.deadline(),
            clock: Arc::new(SystemClock::utc()),
        }
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Clock used to evaluate the deadline.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn should_stop(&self) -> bool {
        self.cancellation.is_cancelled()
            || self
                .deadline
                .is_some_and(|deadline| self.clock.now_utc() >= deadline)
    }
}

impl std::fmt::Debug for CancellableSleeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellableSleeper")
            .field("cancelled", &self.cancellation.is_cancelled())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Sleeper for CancellableSleeper {
    fn sleep(&self, duration: Duration) {
        // None: too far out to represent, so only the scope can end the wait.
        let until = Instant::now().checked_add(duration);

        loop {
            if self.should_stop() {
                debug!(requested_ms = millis(duration), "sleep cut short");
                return;
            }

            let slice = match until {
                Some(until) => {
                    let remaining = until.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return;
                    }
                    remaining.min(POLL_SLICE)
                }
                None => POLL_SLICE,
            };

            thread::sleep(slice);
        }
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

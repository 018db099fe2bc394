//! Runtime-facing layer: time sources, pausing, and local retry.

pub mod clock;
pub mod retry;
pub mod sleep;

pub use clock::{Clock, FixedClock, SystemClock};
pub use retry::{RetryConfig, execute};
pub use sleep::{CancellableSleeper, Sleeper, ThreadSleeper};

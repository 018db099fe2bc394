//! Local, single-call retry.
//!
//! ## Design
//!
//! - A task is attempted up to `times` times, strictly one after another
//! - Between failed attempts the executor pauses for `backoff(n)`, where `n`
//!   is the 1-based count of attempts made so far
//! - No pause after the final failed attempt
//! - The task's last error is returned unchanged (never wrapped)
//!
//! The loop does not poll cancellation between attempts. A task (or a
//! cancellation-aware [`Sleeper`](crate::sleep::Sleeper) such as
//! [`CancellableSleeper`](crate::sleep::CancellableSleeper)) is expected to
//! observe its scope and bail out.

pub mod config;
pub mod executor;

pub use config::{Backoff, RetryConfig, linear_backoff};
pub use executor::execute;

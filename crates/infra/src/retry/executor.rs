//! Retry control loop.

use std::fmt::Debug;

use tracing::{debug, error, warn};

use super::config::RetryConfig;
use crate::sleep::millis;

/// Run `task`, retrying on failure as configured.
///
/// Returns the first success, or the last error once `config.times()`
/// attempts have failed. The error is opaque to the loop; `Debug` is only
/// used to log it. Exactly one sleep happens between consecutive
/// attempts and none after the last one.
pub fn execute<T, E, F>(config: &RetryConfig, mut task: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Debug,
{
    let times = config.times();
    let mut attempt: u32 = 1;

    loop {
        match task() {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "task succeeded after retries");
                }
                return Ok(value);
            }
            Err(err) if attempt >= times => {
                error!(attempts = times, error = ?err, "task failed, no attempts left");
                return Err(err);
            }
            Err(err) => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    attempt,
                    max_attempts = times,
                    delay_ms = millis(delay),
                    error = ?err,
                    "task failed, retrying"
                );
                config.sleeper().sleep(delay);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::sleep::Sleeper;

    /// Records requested pauses instead of waiting.
    #[derive(Default)]
    struct RecordingSleeper {
        pauses: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn count(&self) -> usize {
            self.pauses.lock().unwrap().len()
        }

        fn pauses(&self) -> Vec<Duration> {
            self.pauses.lock().unwrap().clone()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.pauses.lock().unwrap().push(duration);
        }
    }

    fn config_with(times: u32) -> (RetryConfig, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        let config = RetryConfig::new(times).with_sleeper(sleeper.clone());
        (config, sleeper)
    }

    #[test]
    fn success_needs_no_retries() {
        let (config, sleeper) = config_with(5);

        let result: Result<&str, anyhow::Error> = execute(&config, || Ok("my result"));

        assert_eq!(result.unwrap(), "my result");
        assert_eq!(sleeper.count(), 0);
    }

    #[test]
    fn success_with_default_config() {
        let result: Result<String, anyhow::Error> =
            execute(&RetryConfig::new(3), || Ok("my result".to_string()));

        assert_eq!(result.unwrap(), "my result");
    }

    #[test]
    fn success_after_two_failures() {
        let (config, sleeper) = config_with(5);
        let mut failures = 0;

        let result = execute(&config, || {
            if failures == 2 {
                return Ok("My result");
            }
            failures += 1;
            Err(anyhow::anyhow!("Couldn't fetch to the database"))
        });

        assert_eq!(result.unwrap(), "My result");
        assert_eq!(sleeper.count(), 2);
        assert_eq!(
            sleeper.pauses(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[test]
    fn custom_backoff_receives_one_based_attempts() {
        let (config, sleeper) = config_with(5);
        let config = config.with_backoff(|n| Duration::from_millis(u64::from(n)));
        let mut calls = 0;

        let result = execute(&config, || {
            calls += 1;
            if calls == 3 { Ok(calls) } else { Err("not yet") }
        });

        assert_eq!(result, Ok(3));
        assert_eq!(
            sleeper.pauses(),
            vec![Duration::from_millis(1), Duration::from_millis(2)]
        );
    }

    #[test]
    fn always_failing_task_returns_last_error() {
        let (config, sleeper) = config_with(3);
        let mut calls = 0;

        let result: Result<i32, String> = execute(&config, || {
            calls += 1;
            Err(format!("Couldn't connect to the database (attempt {calls})"))
        });

        assert_eq!(
            result,
            Err("Couldn't connect to the database (attempt 3)".to_string())
        );
        assert_eq!(calls, 3);
        assert_eq!(sleeper.count(), 2);
    }

    #[test]
    fn single_attempt_never_sleeps() {
        let (config, sleeper) = config_with(1);
        let mut calls = 0;

        let result: Result<(), &str> = execute(&config, || {
            calls += 1;
            Err("boom")
        });

        assert_eq!(result, Err("boom"));
        assert_eq!(calls, 1);
        assert_eq!(sleeper.count(), 0);
    }

    #[test]
    fn unbounded_backoff_with_cancelled_scope_finishes() {
        use crate::sleep::CancellableSleeper;
        use tokio_util::sync::CancellationToken;

        let token = CancellationToken::new();
        token.cancel();
        let config = RetryConfig::new(3)
            .with_backoff(|_| Duration::MAX)
            .with_sleeper(Arc::new(CancellableSleeper::new(token)));
        let mut calls = 0;

        let result: Result<(), &str> = execute(&config, || {
            calls += 1;
            Err("still down")
        });

        assert_eq!(result, Err("still down"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn errors_without_display_are_accepted() {
        #[derive(Debug, PartialEq)]
        struct Opaque(u8);

        let (config, sleeper) = config_with(2);

        let result: Result<(), Opaque> = execute(&config, || Err(Opaque(7)));

        assert_eq!(result, Err(Opaque(7)));
        assert_eq!(sleeper.count(), 1);
    }

    #[test]
    fn error_is_returned_unchanged() {
        use reqkit_core::{ErrorKind, StructuredError};

        let (config, _sleeper) = config_with(2);

        let result: Result<(), StructuredError> = execute(&config, || {
            Err(StructuredError::timeout("db_timeout", "Database timed out"))
        });

        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.code(), "db_timeout");
    }
}

//! Retry controller with exponential backoff.
//!
//! The controller owns the attempt loop of one invocation. Attempts run
//! strictly one after another; between a failed attempt and the next one it
//! waits `base_delay * 2^attempt_index`. There is no jitter and no cap.

use crate::error::{AttemptError, ConformError, TerminalFailure};
use crate::types::{AttemptOutcome, AttemptRecord};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Retry policy: total attempt ceiling and base backoff delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

    /// Create a policy. `max_attempts` counts every attempt, including the first.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Result<Self, ConformError> {
        if max_attempts == 0 {
            return Err(ConformError::invalid_request(
                "max_retries must allow at least one attempt",
            ));
        }
        Ok(Self {
            max_attempts,
            base_delay,
        })
    }

    /// Create a policy from a base delay given in (fractional) seconds
    pub fn from_seconds(max_attempts: u32, base_delay_seconds: f64) -> Result<Self, ConformError> {
        let base_delay = Duration::try_from_secs_f64(base_delay_seconds).map_err(|_| {
            ConformError::invalid_request(format!(
                "base delay must be a non-negative number of seconds, got {base_delay_seconds}"
            ))
        })?;
        Self::new(max_attempts, base_delay)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay after the failed attempt with zero-based index `attempt_index`
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt_index))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay: Self::DEFAULT_BASE_DELAY,
        }
    }
}

/// Receives one record per finished attempt.
pub trait AttemptObserver {
    fn on_attempt(&mut self, record: AttemptRecord);
}

impl AttemptObserver for Vec<AttemptRecord> {
    fn on_attempt(&mut self, record: AttemptRecord) {
        self.push(record);
    }
}

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Idle,
    /// Running the attempt with this zero-based index
    Attempting { attempt: u32 },
    Succeeded,
    Exhausted,
}

/// Drives the attempts of a single invocation.
#[derive(Debug)]
pub struct RetryController {
    policy: RetryPolicy,
    state: RetryState,
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: RetryState::Idle,
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds or the attempt ceiling is reached.
    ///
    /// `operation` receives the zero-based attempt index. Every attempt,
    /// successful or not, is reported to `observer`. Intermediate failures are
    /// never returned; once attempts run out the last error is wrapped in a
    /// [`TerminalFailure`].
    pub async fn run<T, F, Fut, O>(
        &mut self,
        observer: &mut O,
        mut operation: F,
    ) -> Result<T, TerminalFailure>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
        O: AttemptObserver + ?Sized,
    {
        let mut attempt = 0;

        loop {
            self.state = RetryState::Attempting { attempt };
            let started = Instant::now();
            let result = operation(attempt).await;
            let elapsed = started.elapsed();

            match result {
                Ok(value) => {
                    observer.on_attempt(AttemptRecord {
                        index: attempt,
                        outcome: AttemptOutcome::Succeeded,
                        error: None,
                        elapsed,
                        backoff: None,
                    });
                    self.state = RetryState::Succeeded;
                    return Ok(value);
                }
                Err(err) => {
                    let exhausted = attempt + 1 >= self.policy.max_attempts || !err.is_retryable();
                    let backoff = (!exhausted).then(|| self.policy.delay_for(attempt));

                    observer.on_attempt(AttemptRecord {
                        index: attempt,
                        outcome: AttemptOutcome::Failed(err.kind()),
                        error: Some(err.to_string()),
                        elapsed,
                        backoff,
                    });

                    let Some(delay) = backoff else {
                        self.state = RetryState::Exhausted;
                        tracing::debug!(
                            "Attempts exhausted after {}/{}: {}",
                            attempt + 1,
                            self.policy.max_attempts,
                            err
                        );
                        return Err(TerminalFailure {
                            attempts: attempt + 1,
                            last_error: err,
                        });
                    };

                    tracing::debug!(
                        "Retry attempt {}/{} failed ({}), waiting {:?}",
                        attempt + 1,
                        self.policy.max_attempts,
                        err.kind(),
                        delay
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BackendError, ErrorKind, ValidationError};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max: u32, base_secs: u64) -> RetryPolicy {
        RetryPolicy::new(max, Duration::from_secs(base_secs)).unwrap()
    }

    #[test]
    fn test_delay_doubles_exactly() {
        let policy = RetryPolicy::from_seconds(5, 0.5).unwrap();
        let delays: Vec<_> = (0..4).map(|i| policy.delay_for(i)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ]
        );
    }

    #[test]
    fn test_delay_saturates_instead_of_overflowing() {
        let policy = policy(100, 1);
        assert_eq!(policy.delay_for(64), Duration::from_secs(1).saturating_mul(u32::MAX));
    }

    #[test]
    fn test_policy_rejects_zero_attempts_and_bad_delays() {
        assert!(RetryPolicy::new(0, Duration::ZERO).is_err());
        assert!(RetryPolicy::from_seconds(3, -1.0).is_err());
        assert!(RetryPolicy::from_seconds(3, f64::INFINITY).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_has_no_delay() {
        let mut controller = RetryController::new(policy(3, 1));
        let mut records: Vec<AttemptRecord> = Vec::new();
        let start = Instant::now();

        let result = controller
            .run(&mut records, |_| async { Ok::<_, AttemptError>("done") })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, AttemptOutcome::Succeeded);
        assert_eq!(controller.state(), RetryState::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_third_attempt_waits_one_then_two_seconds() {
        let mut controller = RetryController::new(policy(3, 1));
        let mut records: Vec<AttemptRecord> = Vec::new();
        let start = Instant::now();

        let result = controller
            .run(&mut records, |attempt| async move {
                if attempt < 2 {
                    Err(ValidationError::NotParseable("garbage".into()).into())
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        let backoffs: Vec<_> = records.iter().map(|r| r.backoff).collect();
        assert_eq!(
            backoffs,
            vec![Some(Duration::from_secs(1)), Some(Duration::from_secs(2)), None]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let mut controller = RetryController::new(policy(3, 1));
        let mut records: Vec<AttemptRecord> = Vec::new();

        let failure = controller
            .run(&mut records, |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    Err::<(), _>(BackendError::transport(format!("reset #{attempt}")).into())
                }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(failure.attempts, 3);
        assert_eq!(failure.last_error_kind(), ErrorKind::Transport);
        assert_eq!(
            failure.last_error,
            AttemptError::from(BackendError::transport("reset #2"))
        );
        assert_eq!(records.len(), 3);
        assert!(records
            .iter()
            .all(|r| r.outcome == AttemptOutcome::Failed(ErrorKind::Transport)));
        assert_eq!(records[2].backoff, None);
        assert_eq!(controller.state(), RetryState::Exhausted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_policy_never_sleeps() {
        let mut controller = RetryController::new(policy(1, 10));
        let mut records: Vec<AttemptRecord> = Vec::new();
        let start = Instant::now();

        let failure = controller
            .run(&mut records, |_| async {
                Err::<(), _>(BackendError::refusal("capacity").into())
            })
            .await
            .unwrap_err();

        assert_eq!(failure.attempts, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(records.len(), 1);
    }
}

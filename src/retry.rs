use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first one), `None` retries forever
    pub max_attempts: Option<u32>,
    /// Delay before every retry
    pub delay: Duration,
}

impl RetryConfig {
    /// Retry forever, waiting the same `delay` between attempts
    pub fn fixed_unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            delay,
        }
    }

    /// Cap the number of attempts (`None` removes the cap)
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Preset: cloud translation connectivity retries.
    /// Waits 5s between attempts and never gives up.
    pub fn cloud_translation() -> Self {
        Self::fixed_unbounded(Duration::from_secs(5))
    }

    /// Calculate the delay for a given attempt number (0-indexed)
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            Duration::ZERO
        } else {
            self.delay
        }
    }

    fn attempts_label(&self) -> String {
        match self.max_attempts {
            Some(max) => max.to_string(),
            None => "∞".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::cloud_translation()
    }
}

/// Execute an async operation with retries, using a predicate to determine if retry is appropriate
///
/// Errors for which `should_retry` returns false are returned immediately.
/// With `max_attempts: None` retryable errors never surface; the loop only
/// ends on success or on a non-retryable error.
///
/// # Panics
/// Panics if `config.max_attempts` is `Some(0)`
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    assert!(
        config.max_attempts != Some(0),
        "RetryConfig.max_attempts must be >= 1, got 0"
    );

    let mut attempt: u32 = 0;

    loop {
        // Wait before retry (except for first attempt)
        let delay = config.delay_for_attempt(attempt);
        if !delay.is_zero() {
            debug!(
                "{}: Retry attempt {}/{} after {:?}",
                operation_name,
                attempt.saturating_add(1),
                config.attempts_label(),
                delay
            );
            sleep(delay).await;
        }

        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(
                        "{}: Succeeded on attempt {}/{}",
                        operation_name,
                        attempt.saturating_add(1),
                        config.attempts_label()
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if !should_retry(&e) {
                    debug!(
                        "{}: Error is not retryable, failing immediately: {}",
                        operation_name, e
                    );
                    return Err(e);
                }

                match config.max_attempts {
                    Some(max) if attempt + 1 >= max => {
                        warn!(
                            "{}: All {} attempts failed. Last error: {}",
                            operation_name, max, e
                        );
                        return Err(e);
                    }
                    Some(max) => {
                        warn!(
                            "{}: Attempt {}/{} failed ({}), {} retries remaining",
                            operation_name,
                            attempt + 1,
                            max,
                            e,
                            max - attempt - 1
                        );
                    }
                    None => {
                        warn!(
                            "{}: Attempt {} failed ({}), waiting {:?} and trying again",
                            operation_name,
                            attempt.saturating_add(1),
                            e,
                            config.delay_for_attempt(attempt.saturating_add(1))
                        );
                    }
                }
            }
        }

        attempt = attempt.saturating_add(1);
    }
}

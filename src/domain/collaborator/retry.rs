use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Bounded retry for calls to remote collaborators.
///
/// Every attempt gets its own timeout; between attempts the policy sleeps for
/// a fixed backoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, attempt_timeout: Duration::from_millis(1000), backoff: Duration::from_millis(50) }
    }
}

/// All attempts failed. Carries the last failure for the caller to report.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryError {
    pub attempts: u32,
    pub last_error: String,
}

impl fmt::Display for RetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gave up after {} attempts, last error: {}", self.attempts, self.last_error)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, attempt_timeout: Duration, backoff: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), attempt_timeout, backoff }
    }

    /// Runs `attempt` until it succeeds or the attempts are used up.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> std::result::Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt_no in 1..=max_attempts {
            match tokio::time::timeout(self.attempt_timeout, attempt()).await {
                Ok(Ok(value)) => {
                    if attempt_no > 1 {
                        log::info!("{} succeeded on attempt {}/{}.", operation, attempt_no, max_attempts);
                    }
                    return Ok(value);
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => last_error = format!("timed out after {} ms", self.attempt_timeout.as_millis()),
            }

            log::warn!("{} failed (attempt {}/{}): {}", operation, attempt_no, max_attempts, last_error);

            if attempt_no < max_attempts {
                tokio::time::sleep(self.backoff).await;
            }
        }

        Err(RetryError { attempts: max_attempts, last_error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(50), Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);

        let result = quick_policy(3)
            .run("flaky call", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err(Error::InstallDispatch(format!("failure {}", n))) } else { Ok(n) }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_with_last_error() {
        let calls = AtomicU32::new(0);

        let result: std::result::Result<(), RetryError> = quick_policy(2)
            .run("broken call", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::InstallDispatch("switch unreachable".to_string()))
            })
            .await;

        let error = result.unwrap_err();
        assert_eq!(error.attempts, 2);
        assert!(error.last_error.contains("switch unreachable"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_attempt_timeout_counts_as_failure() {
        let result: std::result::Result<(), RetryError> = quick_policy(1)
            .run("slow call", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(result.unwrap_err().last_error.contains("timed out"));
    }
}

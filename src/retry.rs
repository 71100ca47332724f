//! Bounded re-invocation of a fallible asynchronous operation.
//!
//! The delay between attempts is constant; there is no jitter or backoff. The
//! operation may leave partial side effects behind on failed attempts, so
//! callers are responsible for making the operation itself idempotent.

use std::future::Future;
use std::time::Duration;

/// Number of attempts used when [`RetryOptions::attempts`] is not positive.
pub const DEFAULT_ATTEMPTS: u32 = 8;

/// Per-call retry configuration.
#[derive(Debug, Clone, Copy)]
pub struct RetryOptions {
    /// Maximum number of invocations. Values below 1 are treated as the
    /// default ([`DEFAULT_ATTEMPTS`]), not as "never retry".
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            delay: Duration::ZERO,
        }
    }
}

/// Invokes `operation` until it succeeds or `options.attempts` invocations
/// have failed.
///
/// The first success resolves immediately with its value. Each failure
/// consumes one attempt; between attempts the task sleeps for `options.delay`
/// without blocking other work. Once the attempts are exhausted the **last**
/// underlying error is returned. Only one invocation is in flight at a time.
///
/// # Errors
///
/// Returns the error of the final failed invocation.
pub async fn retry<T, E, F, Fut>(mut operation: F, options: RetryOptions) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempts_left = if options.attempts < 1 {
        DEFAULT_ATTEMPTS
    } else {
        options.attempts
    };

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempts_left -= 1;
                if attempts_left == 0 {
                    return Err(err);
                }
                tokio::time::sleep(options.delay).await;
            }
        }
    }
}

//! Retry policy for throttled requests.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::football::FetchError;

/// Retries a fetch with exponentially growing delays, but only while the
/// server keeps answering with HTTP 429. Any other failure is returned
/// immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
  /// Delay before the first retry; doubled for every further retry
  pub base_delay: Duration,
  /// Total number of attempts, including the first one
  pub max_attempts: u32,
}

impl Default for Backoff {
  fn default() -> Self {
    Self {
      base_delay: Duration::from_secs(5),
      max_attempts: 3,
    }
  }
}

impl Backoff {
  pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
    Self {
      base_delay,
      max_attempts: max_attempts.max(1),
    }
  }

  /// Delay to wait after the failed attempt with the given 0-based index.
  pub fn delay_for(&self, attempt: u32) -> Duration {
    self
      .base_delay
      .saturating_mul(2u32.saturating_pow(attempt))
  }

  /// Run `attempt` until it succeeds, fails with a non-throttling error, or
  /// the attempt budget is spent. Returns the last error in the latter cases.
  pub async fn run<T, F, Fut>(&self, mut attempt: F) -> Result<T, FetchError>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
  {
    let mut index = 0;
    loop {
      match attempt().await {
        Ok(value) => return Ok(value),
        Err(err) if err.is_throttled() && index + 1 < self.max_attempts => {
          let wait = self.delay_for(index);
          warn!(
            ?wait,
            retry = index + 1,
            max_attempts = self.max_attempts,
            "rate limited, backing off"
          );
          tokio::time::sleep(wait).await;
          index += 1;
        }
        Err(err) => return Err(err),
      }
    }
  }
}

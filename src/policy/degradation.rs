//! Switches to sample data after repeated consecutive failures.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Operating state of the data layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  /// Remote requests are attempted
  Normal,
  /// Remote requests are skipped and fallback data is served
  Degraded,
}

impl Mode {
  pub fn is_degraded(self) -> bool {
    self == Mode::Degraded
  }
}

#[derive(Debug, Default)]
struct FailureState {
  consecutive_failures: u32,
  last_failure_at: Option<Instant>,
}

/// Consecutive failure counter shared by every request key.
///
/// Owned by one data layer instance rather than being process-global, so
/// independent instances never influence each other.
#[derive(Debug)]
pub struct DegradationPolicy {
  threshold: u32,
  /// How long to stay offline before letting one request try the network again.
  /// `None` keeps the policy degraded until a success is recorded.
  probe_interval: Option<Duration>,
  state: Mutex<FailureState>,
}

impl Default for DegradationPolicy {
  fn default() -> Self {
    Self::new(3, Some(Duration::from_secs(60)))
  }
}

impl DegradationPolicy {
  pub fn new(threshold: u32, probe_interval: Option<Duration>) -> Self {
    Self {
      threshold: threshold.max(1),
      probe_interval,
      state: Mutex::new(FailureState::default()),
    }
  }

  pub fn consecutive_failures(&self) -> u32 {
    self.state().consecutive_failures
  }

  /// True once the failure counter has reached the threshold.
  pub fn should_degrade(&self) -> bool {
    self.consecutive_failures() >= self.threshold
  }

  pub fn mode(&self) -> Mode {
    if self.should_degrade() {
      Mode::Degraded
    } else {
      Mode::Normal
    }
  }

  /// Whether a degraded caller may try the network once more.
  ///
  /// Always true in normal mode. While degraded, true only when the retry
  /// interval has elapsed since the most recent failure.
  pub fn permits_probe(&self) -> bool {
    let state = self.state();
    if state.consecutive_failures < self.threshold {
      return true;
    }

    match (self.probe_interval, state.last_failure_at) {
      (Some(interval), Some(at)) => at.elapsed() >= interval,
      _ => false,
    }
  }

  pub fn record_success(&self) {
    let mut state = self.state();
    if state.consecutive_failures >= self.threshold {
      info!("remote data reachable again, leaving offline mode");
    }
    state.consecutive_failures = 0;
    state.last_failure_at = None;
  }

  pub fn record_failure(&self) {
    let mut state = self.state();
    state.consecutive_failures = state.consecutive_failures.saturating_add(1);
    state.last_failure_at = Some(Instant::now());

    if state.consecutive_failures == self.threshold {
      warn!(
        failures = state.consecutive_failures,
        "too many consecutive errors, switching to offline sample data"
      );
    }
  }

  fn state(&self) -> MutexGuard<'_, FailureState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

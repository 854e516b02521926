//! Liveness tokens for in-flight requests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Liveness token captured when a request starts.
///
/// Clones share the same flag. Once cancelled, results of the request must not
/// be written into the cache or counted by the degradation policy.
#[derive(Debug, Clone)]
pub struct RequestScope {
  alive: Arc<AtomicBool>,
}

impl RequestScope {
  pub fn new() -> Self {
    Self {
      alive: Arc::new(AtomicBool::new(true)),
    }
  }

  /// Mark the request as abandoned.
  pub fn cancel(&self) {
    self.alive.store(false, Ordering::SeqCst);
  }

  pub fn is_live(&self) -> bool {
    self.alive.load(Ordering::SeqCst)
  }
}

impl Default for RequestScope {
  fn default() -> Self {
    Self::new()
  }
}

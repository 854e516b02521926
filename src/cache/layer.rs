//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::scope::RequestScope;
use super::traits::CacheResult;

/// Default freshness window for cached payloads.
const DEFAULT_FRESHNESS: Duration = Duration::from_secs(5 * 60);

/// A stored payload. Replaced wholesale, never patched.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
  payload: T,
  /// Monotonic time the producing fetch started, used for freshness
  fetched_at: Instant,
  /// Wall-clock counterpart of `fetched_at`, for display
  cached_at: DateTime<Utc>,
  /// Start order of the producing fetch
  generation: u64,
}

struct CacheInner<T> {
  entries: Mutex<HashMap<String, CacheEntry<T>>>,
  next_generation: AtomicU64,
  freshness: Duration,
}

/// In-memory cache keyed by request key.
///
/// Entries are never evicted; a stale entry is simply treated as a miss on the
/// next lookup and overwritten once a newer fetch succeeds. Clones share the
/// same entries.
pub struct Cache<T> {
  inner: Arc<CacheInner<T>>,
}

impl<T: Clone> Cache<T> {
  /// Create an empty cache with the default five minute freshness window.
  pub fn new() -> Self {
    Self::with_freshness(DEFAULT_FRESHNESS)
  }

  /// Create an empty cache with a custom freshness window.
  pub fn with_freshness(freshness: Duration) -> Self {
    Self {
      inner: Arc::new(CacheInner {
        entries: Mutex::new(HashMap::new()),
        next_generation: AtomicU64::new(0),
        freshness,
      }),
    }
  }

  /// Return the cached payload for `key` if it is still fresh, otherwise run
  /// `fetcher` and store its result.
  ///
  /// Failures are returned to the caller untouched and never cached; an older
  /// stale entry for the key stays in place.
  pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetcher: F) -> Result<CacheResult<T>, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    self
      .get_or_fetch_scoped(key, &RequestScope::new(), fetcher)
      .await
  }

  /// Like [`Cache::get_or_fetch`], but the result is only stored if `scope`
  /// is still live when the fetch completes.
  pub async fn get_or_fetch_scoped<F, Fut, E>(
    &self,
    key: &str,
    scope: &RequestScope,
    fetcher: F,
  ) -> Result<CacheResult<T>, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let started = Instant::now();

    if let Some(hit) = self.lookup_fresh(key, started) {
      debug!(key, "using cached data");
      return Ok(hit);
    }

    // Taken before the first suspension point so start order is preserved
    let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst);
    let cached_at = Utc::now();

    debug!(key, generation, "fetching fresh data");
    let payload = fetcher().await?;

    if scope.is_live() {
      self.store(key, payload.clone(), started, cached_at, generation);
    } else {
      debug!(key, "request abandoned, discarding result");
    }

    Ok(CacheResult::from_network(payload, cached_at))
  }

  fn lookup_fresh(&self, key: &str, now: Instant) -> Option<CacheResult<T>> {
    let entries = self.entries();
    let entry = entries.get(key)?;

    if now.duration_since(entry.fetched_at) < self.inner.freshness {
      Some(CacheResult::from_cache(entry.payload.clone(), entry.cached_at))
    } else {
      None
    }
  }

  /// Write a fetch result unless a fetch that started later already wrote one.
  fn store(
    &self,
    key: &str,
    payload: T,
    fetched_at: Instant,
    cached_at: DateTime<Utc>,
    generation: u64,
  ) {
    let mut entries = self.entries();

    if let Some(existing) = entries.get(key) {
      if existing.generation > generation {
        debug!(
          key,
          generation,
          newer = existing.generation,
          "newer fetch already stored, dropping result"
        );
        return;
      }
    }

    entries.insert(
      key.to_string(),
      CacheEntry {
        payload,
        fetched_at,
        cached_at,
        generation,
      },
    );
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
    // Entries are replaced whole, so a poisoned map is still consistent
    self
      .inner
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  /// Stored payload for `key`, fresh or not.
  #[cfg(test)]
  fn peek(&self, key: &str) -> Option<T> {
    self.entries().get(key).map(|e| e.payload.clone())
  }
}

impl<T: Clone> Default for Cache<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Clone for Cache<T> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::CacheSource;
  use std::sync::atomic::AtomicU32;

  fn counting_fetcher(
    calls: &Arc<AtomicU32>,
    value: &'static str,
  ) -> impl FnOnce() -> futures::future::Ready<Result<&'static str, String>> {
    let calls = Arc::clone(calls);
    move || {
      calls.fetch_add(1, Ordering::SeqCst);
      futures::future::ready(Ok(value))
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_second_lookup_within_window_does_not_fetch() {
    let cache = Cache::new();
    let calls = Arc::new(AtomicU32::new(0));

    let first = cache
      .get_or_fetch("competitions", counting_fetcher(&calls, "a"))
      .await
      .unwrap();
    let second = cache
      .get_or_fetch("competitions", counting_fetcher(&calls, "b"))
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(second.source, CacheSource::CacheFresh);
    assert_eq!(second.data, "a");
  }

  #[tokio::test(start_paused = true)]
  async fn test_lookup_after_window_fetches_again() {
    let cache = Cache::with_freshness(Duration::from_secs(60));
    let calls = Arc::new(AtomicU32::new(0));

    cache
      .get_or_fetch("standings_2021", counting_fetcher(&calls, "old"))
      .await
      .unwrap();
    tokio::time::advance(Duration::from_secs(61)).await;
    let result = cache
      .get_or_fetch("standings_2021", counting_fetcher(&calls, "new"))
      .await
      .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(result.data, "new");
    assert_eq!(cache.peek("standings_2021"), Some("new"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_matches_key_expires_after_five_minutes() {
    let cache = Cache::new();
    let calls = Arc::new(AtomicU32::new(0));
    let key = "matches_2021_2024-01-10_2024-01-17";

    cache
      .get_or_fetch(key, counting_fetcher(&calls, "P"))
      .await
      .unwrap();

    tokio::time::advance(Duration::from_secs(200)).await;
    let at_200 = cache
      .get_or_fetch(key, counting_fetcher(&calls, "Q"))
      .await
      .unwrap();
    assert_eq!(at_200.data, "P");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(200)).await;
    let at_400 = cache
      .get_or_fetch(key, counting_fetcher(&calls, "Q"))
      .await
      .unwrap();
    assert_eq!(at_400.data, "Q");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_refresh_keeps_stale_entry() {
    let cache = Cache::with_freshness(Duration::from_secs(10));
    let calls = Arc::new(AtomicU32::new(0));

    cache
      .get_or_fetch("teams_2014", counting_fetcher(&calls, "cached"))
      .await
      .unwrap();
    tokio::time::advance(Duration::from_secs(11)).await;

    let result = cache
      .get_or_fetch("teams_2014", || async { Err::<&str, _>("boom".to_string()) })
      .await;

    assert_eq!(result.unwrap_err(), "boom");
    assert_eq!(cache.peek("teams_2014"), Some("cached"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_failure_is_not_cached() {
    let cache: Cache<u32> = Cache::new();

    let first = cache
      .get_or_fetch("competitions", || async { Err::<u32, _>("down") })
      .await;
    assert!(first.is_err());

    let second = cache
      .get_or_fetch("competitions", || async { Ok::<_, &str>(7) })
      .await
      .unwrap();
    assert_eq!(second.data, 7);
    assert_eq!(second.source, CacheSource::Network);
  }

  #[tokio::test(start_paused = true)]
  async fn test_later_started_fetch_wins() {
    let cache = Cache::new();

    let slow = cache.get_or_fetch("matches_2014", || async {
      tokio::time::sleep(Duration::from_secs(10)).await;
      Ok::<_, String>("started first")
    });
    let fast = cache.get_or_fetch("matches_2014", || async {
      tokio::time::sleep(Duration::from_secs(1)).await;
      Ok::<_, String>("started second")
    });

    let (slow, fast) = tokio::join!(slow, fast);

    // Both callers get their own result back
    assert_eq!(slow.unwrap().data, "started first");
    assert_eq!(fast.unwrap().data, "started second");
    assert_eq!(cache.peek("matches_2014"), Some("started second"));
  }

  #[tokio::test(start_paused = true)]
  async fn test_abandoned_request_does_not_write() {
    let cache = Cache::new();
    let scope = RequestScope::new();
    let cancel = scope.clone();

    let result = cache
      .get_or_fetch_scoped("standings_2014", &scope, || async move {
        cancel.cancel();
        Ok::<_, String>(42)
      })
      .await
      .unwrap();

    assert_eq!(result.data, 42);
    assert_eq!(cache.peek("standings_2014"), None);
  }

  #[tokio::test(start_paused = true)]
  async fn test_clones_share_entries() {
    let cache = Cache::new();
    let clone = cache.clone();
    let calls = Arc::new(AtomicU32::new(0));

    cache
      .get_or_fetch("competitions", counting_fetcher(&calls, "shared"))
      .await
      .unwrap();
    let result = clone
      .get_or_fetch("competitions", counting_fetcher(&calls, "other"))
      .await
      .unwrap();

    assert_eq!(result.data, "shared");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}

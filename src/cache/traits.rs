//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};

/// Anything that identifies a fetch intent.
///
/// Two logically identical requests must render the same `cache_key`.
pub trait QueryKey {
  /// Stable key used to index cached results (e.g. "standings_2021")
  fn cache_key(&self) -> String;

  /// Human-readable description for logs and status lines
  fn description(&self) -> String;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was fetched from the network (None for fallback data)
  pub fetched_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T, fetched_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      fetched_at: Some(fetched_at),
    }
  }

  /// Create a new cache result from a fresh cache entry.
  pub fn from_cache(data: T, fetched_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      fetched_at: Some(fetched_at),
    }
  }

  /// Create a new cache result for degraded mode.
  pub fn fallback(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Fallback,
      fetched_at: None,
    }
  }

  /// Convert the payload while keeping the source metadata.
  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheResult<U> {
    CacheResult {
      data: f(self.data),
      source: self.source,
      fetched_at: self.fetched_at,
    }
  }

  /// Fallible variant of [`CacheResult::map`].
  pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<CacheResult<U>, E> {
    Ok(CacheResult {
      data: f(self.data)?,
      source: self.source,
      fetched_at: self.fetched_at,
    })
  }

  pub fn is_fallback(&self) -> bool {
    self.source == CacheSource::Fallback
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still within the freshness window
  CacheFresh,
  /// Degraded mode - compiled-in sample data
  Fallback,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_map_keeps_source() {
    let now = Utc::now();
    let result = CacheResult::from_cache(2, now).map(|n| n * 10);
    assert_eq!(result.data, 20);
    assert_eq!(result.source, CacheSource::CacheFresh);
    assert_eq!(result.fetched_at, Some(now));
  }

  #[test]
  fn test_fallback_has_no_timestamp() {
    let result = CacheResult::fallback("sample");
    assert!(result.is_fallback());
    assert!(result.fetched_at.is_none());
  }
}

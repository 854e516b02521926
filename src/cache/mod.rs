//! In-memory caching layer for remote data.
//!
//! This module provides an API-agnostic caching mechanism that:
//! - Serves the last successful payload per request key while it is fresh
//! - Treats expired entries as misses (lazy expiry, no eviction)
//! - Orders concurrent writes for the same key by fetch start
//! - Drops results of requests whose caller has gone away

mod layer;
mod scope;
mod traits;

pub use layer::Cache;
pub use scope::RequestScope;
pub use traits::{CacheResult, CacheSource, QueryKey};

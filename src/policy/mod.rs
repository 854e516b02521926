//! Policies wrapped around remote fetching: retry on throttling, and
//! degradation to sample data after repeated failures.

mod backoff;
mod degradation;
mod fallback;

pub use backoff::Backoff;
pub use degradation::{DegradationPolicy, Mode};
pub use fallback::FallbackTable;

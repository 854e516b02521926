pub mod api_types;
mod cached_client;
mod client;
mod error;
mod request;

pub use cached_client::FootballData;
pub use client::{Fetcher, FootballClient};
pub use error::{FetchError, LoadError};
pub use request::{Payload, ResourceId};

#[cfg(test)]
pub(crate) use cached_client::tests as test_support;

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single remote fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  /// No response was received (connection, DNS, timeout, body transfer)
  #[error("network error: {0}")]
  Network(String),
  /// The server answered with a non-2xx status
  #[error("HTTP error: {0}")]
  Http(StatusCode),
  /// The body could not be decoded into the expected payload
  #[error("could not parse response: {0}")]
  Parse(String),
}

impl FetchError {
  /// Whether the server asked us to slow down (HTTP 429).
  pub fn is_throttled(&self) -> bool {
    matches!(self, Self::Http(status) if *status == StatusCode::TOO_MANY_REQUESTS)
  }
}

/// Failure of a top-level data request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
  #[error(transparent)]
  Fetch(#[from] FetchError),
  /// Degraded mode is active and no sample data exists for the resource
  #[error("{0} is unavailable while offline")]
  Unavailable(String),
  /// The payload kind does not match the request
  #[error("unexpected payload for {0}")]
  UnexpectedPayload(String),
}

//! Async query abstraction for view data.
//!
//! A `Query<T>` owns the fetch closure, the loading/success/error state and
//! the channel the spawned task reports back on. Views call `poll()` on every
//! tick.
//!
//! # Example
//!
//! ```ignore
//! let board = scoreboard.clone();
//! let mut query = Query::new(move |scope| {
//!     let board = board.clone();
//!     async move { board.standings(2021, &scope).await.map_err(|e| e.to_string()) }
//! });
//!
//! query.fetch();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//! ```
//!
//! Every fetch runs under its own `RequestScope`. Starting a new fetch or
//! dropping the query cancels the previous scope, so abandoned requests never
//! write the shared cache or move the failure counter.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::cache::RequestScope;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }
}

type FetcherFn<T> = Box<dyn Fn(RequestScope) -> BoxFuture<'static, Result<T, String>> + Send + Sync>;

/// Async query for data fetching with state management.
pub struct Query<T> {
  state: QueryState<T>,
  /// Last successful data, kept visible while a refetch is in flight
  previous: Option<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
  scope: RequestScope,
  fetched_at: Option<Instant>,
  refresh_interval: Option<Duration>,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is called with a fresh scope each time `fetch()` or
  /// `refetch()` starts a request.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn(RequestScope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      previous: None,
      fetcher: Box::new(move |scope| fetcher(scope).boxed()),
      receiver: None,
      scope: RequestScope::new(),
      fetched_at: None,
      refresh_interval: None,
    }
  }

  /// Refetch automatically once the data is older than `interval`.
  pub fn with_refresh_interval(mut self, interval: Option<Duration>) -> Self {
    self.refresh_interval = interval;
    self
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  /// Current data, or the previous result while a refetch is loading.
  pub fn data(&self) -> Option<&T> {
    self.state.data().or(match self.state {
      QueryState::Loading => self.previous.as_ref(),
      _ => None,
    })
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  /// Whether the refresh interval has passed since the last success.
  pub fn is_due(&self) -> bool {
    match (&self.state, self.refresh_interval, self.fetched_at) {
      (QueryState::Success(_), Some(interval), Some(at)) => at.elapsed() >= interval,
      _ => false,
    }
  }

  /// Start fetching data if not already loading.
  pub fn fetch(&mut self) {
    if self.state.is_loading() {
      return;
    }
    self.start_fetch();
  }

  /// Force a refetch, abandoning any request in flight.
  pub fn refetch(&mut self) {
    self.receiver = None;
    self.start_fetch();
  }

  /// Poll for results from a pending fetch, refetching when due.
  ///
  /// Returns `true` if the state changed. Call this in the tick handler.
  pub fn poll(&mut self) -> bool {
    if self.is_due() {
      self.fetch();
      return true;
    }

    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = QueryState::Success(data);
        self.previous = None;
        self.fetched_at = Some(Instant::now());
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.state = QueryState::Error(error);
        self.previous = None;
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.state = QueryState::Error("Query was cancelled".to_string());
        self.previous = None;
        self.receiver = None;
        true
      }
    }
  }

  fn start_fetch(&mut self) {
    self.scope.cancel();
    self.scope = RequestScope::new();

    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    if let QueryState::Success(data) = std::mem::replace(&mut self.state, QueryState::Loading) {
      self.previous = Some(data);
    }

    let future = (self.fetcher)(self.scope.clone());
    tokio::spawn(async move {
      let result = future.await;
      // Receiver may have been dropped
      let _ = tx.send(result);
    });
  }
}

impl<T> Drop for Query<T> {
  fn drop(&mut self) {
    self.scope.cancel();
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("fetched_at", &self.fetched_at)
      .field("refresh_interval", &self.refresh_interval)
      .finish_non_exhaustive()
  }
}

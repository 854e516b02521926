//! Data access layer combining the API client with caching, retry and
//! offline fallback.

use color_eyre::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{Cache, CacheResult, CacheSource, QueryKey, RequestScope};
use crate::config::Config;
use crate::policy::{Backoff, DegradationPolicy, FallbackTable, Mode};

use super::api_types::{CompetitionsResponse, MatchesResponse, StandingsResponse, TeamsResponse};
use super::client::{Fetcher, FootballClient};
use super::error::LoadError;
use super::request::{Payload, Request};

/// Football data source with transparent caching and offline support.
///
/// Every request goes through the same pipeline: while degraded, the
/// compiled-in sample data is served without touching the network or the
/// cache. Otherwise the cache is consulted, and on a miss the fetcher runs
/// under the backoff policy. Outcomes of real fetches feed the shared
/// consecutive-failure counter.
pub struct FootballData<F> {
  fetcher: Arc<F>,
  cache: Cache<Payload>,
  backoff: Backoff,
  degradation: Arc<DegradationPolicy>,
  fallback: Arc<FallbackTable>,
}

impl FootballData<FootballClient> {
  /// Create a data source backed by the football-data.org API.
  pub fn new(config: &Config) -> Result<Self> {
    let fetcher = FootballClient::new(config)?;
    let cache = Cache::with_freshness(Duration::from_secs(config.cache.freshness_secs));
    let backoff = Backoff::new(
      Duration::from_secs(config.backoff.base_delay_secs),
      config.backoff.max_attempts,
    );
    let degradation = DegradationPolicy::new(
      config.degradation.threshold,
      config.degradation.probe_interval(),
    );
    let fallback = FallbackTable::builtin()?;

    Ok(Self::with_parts(
      fetcher,
      cache,
      backoff,
      degradation,
      fallback,
    ))
  }
}

impl<F: Fetcher> FootballData<F> {
  pub fn with_parts(
    fetcher: F,
    cache: Cache<Payload>,
    backoff: Backoff,
    degradation: DegradationPolicy,
    fallback: FallbackTable,
  ) -> Self {
    Self {
      fetcher: Arc::new(fetcher),
      cache,
      backoff,
      degradation: Arc::new(degradation),
      fallback: Arc::new(fallback),
    }
  }

  pub fn mode(&self) -> Mode {
    self.degradation.mode()
  }

  /// Load a payload for `request`.
  ///
  /// Results (and failures) are only applied to shared state while `scope`
  /// is live.
  pub async fn load(
    &self,
    request: &Request,
    scope: &RequestScope,
  ) -> Result<CacheResult<Payload>, LoadError> {
    if !self.degradation.permits_probe() {
      return self.serve_fallback(request);
    }
    if self.degradation.should_degrade() {
      info!(request = %request.description(), "probing network while offline");
    }

    let key = request.cache_key();
    let result = self
      .cache
      .get_or_fetch_scoped(&key, scope, || {
        self.backoff.run(|| self.fetcher.fetch(request))
      })
      .await;

    match result {
      Ok(loaded) => {
        if loaded.source == CacheSource::Network && scope.is_live() {
          self.degradation.record_success();
        }
        Ok(loaded)
      }
      Err(err) => {
        warn!(request = %request.description(), error = %err, "fetch failed");
        if scope.is_live() {
          self.degradation.record_failure();
        }
        Err(err.into())
      }
    }
  }

  fn serve_fallback(&self, request: &Request) -> Result<CacheResult<Payload>, LoadError> {
    let resource = request.resource_id();
    match self.fallback.get_fallback(resource) {
      Some(payload) => {
        debug!(%resource, "serving sample data");
        Ok(CacheResult::fallback(payload))
      }
      None => Err(LoadError::Unavailable(resource.to_string())),
    }
  }

  async fn load_as<T>(
    &self,
    request: Request,
    scope: &RequestScope,
    extract: fn(Payload) -> Option<T>,
  ) -> Result<CacheResult<T>, LoadError> {
    self
      .load(&request, scope)
      .await?
      .try_map(|payload| extract(payload).ok_or_else(|| LoadError::UnexpectedPayload(request.description())))
  }

  /// All competitions available to the account.
  pub async fn competitions(
    &self,
    scope: &RequestScope,
  ) -> Result<CacheResult<CompetitionsResponse>, LoadError> {
    self
      .load_as(Request::Competitions, scope, Payload::into_competitions)
      .await
  }

  /// Matches of a competition for a selected day, or around today.
  pub async fn matches(
    &self,
    competition_id: u64,
    date: Option<chrono::NaiveDate>,
    scope: &RequestScope,
  ) -> Result<CacheResult<MatchesResponse>, LoadError> {
    self
      .load_as(
        Request::matches(competition_id, date),
        scope,
        Payload::into_matches,
      )
      .await
  }

  /// League table of a competition.
  pub async fn standings(
    &self,
    competition_id: u64,
    scope: &RequestScope,
  ) -> Result<CacheResult<StandingsResponse>, LoadError> {
    self
      .load_as(
        Request::Standings { competition_id },
        scope,
        Payload::into_standings,
      )
      .await
  }

  /// Teams taking part in a competition.
  pub async fn teams(
    &self,
    competition_id: u64,
    scope: &RequestScope,
  ) -> Result<CacheResult<TeamsResponse>, LoadError> {
    self
      .load_as(Request::Teams { competition_id }, scope, Payload::into_teams)
      .await
  }
}

impl<F> Clone for FootballData<F> {
  fn clone(&self) -> Self {
    Self {
      fetcher: Arc::clone(&self.fetcher),
      cache: self.cache.clone(),
      backoff: self.backoff,
      degradation: Arc::clone(&self.degradation),
      fallback: Arc::clone(&self.fallback),
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::football::FetchError;
  use reqwest::StatusCode;
  use std::collections::VecDeque;
  use std::future::Future;
  use std::sync::Mutex;

  /// Fetcher that replays scripted outcomes and records every request.
  #[derive(Clone, Default)]
  pub(crate) struct ScriptedFetcher {
    calls: Arc<Mutex<Vec<Request>>>,
    outcomes: Arc<Mutex<VecDeque<Result<Payload, FetchError>>>>,
  }

  impl ScriptedFetcher {
    pub(crate) fn push(&self, outcome: Result<Payload, FetchError>) {
      self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub(crate) fn calls(&self) -> Vec<Request> {
      self.calls.lock().unwrap().clone()
    }
  }

  impl Fetcher for ScriptedFetcher {
    fn fetch(
      &self,
      request: &Request,
    ) -> impl Future<Output = Result<Payload, FetchError>> + Send {
      self.calls.lock().unwrap().push(request.clone());
      let outcome = self
        .outcomes
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(FetchError::Network("nothing scripted".into())));
      async move { outcome }
    }
  }

  pub(crate) fn data_source(fetcher: &ScriptedFetcher) -> FootballData<ScriptedFetcher> {
    FootballData::with_parts(
      fetcher.clone(),
      Cache::new(),
      Backoff::default(),
      DegradationPolicy::new(3, Some(Duration::from_secs(60))),
      FallbackTable::builtin().unwrap(),
    )
  }

  pub(crate) fn competitions_payload(ids: &[u64]) -> Payload {
    let competitions: Vec<String> = ids
      .iter()
      .map(|id| format!(r#"{{ "id": {}, "name": "Competition {}" }}"#, id, id))
      .collect();
    let body = format!(r#"{{ "competitions": [{}] }}"#, competitions.join(","));
    Payload::decode(crate::football::ResourceId::Competitions, &body).unwrap()
  }

  fn network_error() -> FetchError {
    FetchError::Network("connection reset".into())
  }

  #[tokio::test(start_paused = true)]
  async fn test_success_is_cached() {
    let fetcher = ScriptedFetcher::default();
    fetcher.push(Ok(competitions_payload(&[2021])));
    let data = data_source(&fetcher);
    let scope = RequestScope::new();

    let first = data.competitions(&scope).await.unwrap();
    let second = data.competitions(&scope).await.unwrap();

    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(second.source, CacheSource::CacheFresh);
    assert_eq!(second.data.competitions[0].id, 2021);
    assert_eq!(fetcher.calls().len(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_three_failures_then_fallback_without_network() {
    let fetcher = ScriptedFetcher::default();
    for _ in 0..3 {
      fetcher.push(Err(network_error()));
    }
    let data = data_source(&fetcher);
    let scope = RequestScope::new();

    assert!(data.matches(2021, None, &scope).await.is_err());
    assert!(data.standings(2014, &scope).await.is_err());
    assert!(data.competitions(&scope).await.is_err());
    assert_eq!(data.mode(), Mode::Degraded);

    let result = data.matches(2021, None, &scope).await.unwrap();

    assert_eq!(result.source, CacheSource::Fallback);
    assert_eq!(result.data.matches.len(), 3);
    assert_eq!(fetcher.calls().len(), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_degraded_without_sample_is_unavailable() {
    let fetcher = ScriptedFetcher::default();
    let data = data_source(&fetcher);
    let scope = RequestScope::new();
    for _ in 0..3 {
      let _ = data.teams(2021, &scope).await;
    }

    let result = data.standings(2019, &scope).await;

    assert_eq!(
      result.unwrap_err(),
      LoadError::Unavailable("standings of 2019".into())
    );
    assert_eq!(fetcher.calls().len(), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_throttling_is_retried_transparently() {
    let fetcher = ScriptedFetcher::default();
    fetcher.push(Err(FetchError::Http(StatusCode::TOO_MANY_REQUESTS)));
    fetcher.push(Err(FetchError::Http(StatusCode::TOO_MANY_REQUESTS)));
    fetcher.push(Ok(competitions_payload(&[2014])));
    let data = data_source(&fetcher);

    let result = data.competitions(&RequestScope::new()).await.unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(fetcher.calls().len(), 3);
    assert_eq!(data.degradation.consecutive_failures(), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_success_resets_failures() {
    let fetcher = ScriptedFetcher::default();
    fetcher.push(Err(network_error()));
    fetcher.push(Err(network_error()));
    fetcher.push(Ok(competitions_payload(&[2021])));
    let data = data_source(&fetcher);
    let scope = RequestScope::new();

    let _ = data.teams(2021, &scope).await;
    let _ = data.teams(2014, &scope).await;
    assert_eq!(data.degradation.consecutive_failures(), 2);

    data.competitions(&scope).await.unwrap();
    assert_eq!(data.degradation.consecutive_failures(), 0);
    assert_eq!(data.mode(), Mode::Normal);
  }

  #[tokio::test(start_paused = true)]
  async fn test_abandoned_request_does_not_count() {
    let fetcher = ScriptedFetcher::default();
    fetcher.push(Err(network_error()));
    let data = data_source(&fetcher);
    let scope = RequestScope::new();
    scope.cancel();

    let result = data.competitions(&scope).await;

    assert!(result.is_err());
    assert_eq!(data.degradation.consecutive_failures(), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_abandoned_success_keeps_failure_count() {
    let fetcher = ScriptedFetcher::default();
    fetcher.push(Err(network_error()));
    fetcher.push(Err(network_error()));
    fetcher.push(Err(FetchError::Http(StatusCode::TOO_MANY_REQUESTS)));
    fetcher.push(Ok(competitions_payload(&[2021])));
    let data = data_source(&fetcher);
    let live = RequestScope::new();
    let _ = data.teams(2021, &live).await;
    let _ = data.teams(2014, &live).await;
    assert_eq!(data.degradation.consecutive_failures(), 2);

    // Cancelled while the throttled request waits for its retry
    let scope = RequestScope::new();
    let (result, _) = tokio::join!(data.competitions(&scope), async {
      tokio::time::sleep(Duration::from_secs(1)).await;
      scope.cancel();
    });

    assert_eq!(result.unwrap().source, CacheSource::Network);
    assert_eq!(data.degradation.consecutive_failures(), 2);
    assert_eq!(data.mode(), Mode::Normal);

    // The abandoned result was not cached either
    fetcher.push(Ok(competitions_payload(&[2014])));
    let again = data.competitions(&live).await.unwrap();
    assert_eq!(again.source, CacheSource::Network);
    assert_eq!(again.data.competitions[0].id, 2014);
    assert_eq!(fetcher.calls().len(), 5);
  }

  #[tokio::test(start_paused = true)]
  async fn test_retry_after_interval_recovers() {
    let fetcher = ScriptedFetcher::default();
    for _ in 0..3 {
      fetcher.push(Err(network_error()));
    }
    fetcher.push(Ok(competitions_payload(&[2021, 2014])));
    let data = data_source(&fetcher);
    let scope = RequestScope::new();
    for _ in 0..3 {
      let _ = data.teams(2002, &scope).await;
    }

    let offline = data.competitions(&scope).await.unwrap();
    assert_eq!(offline.source, CacheSource::Fallback);

    tokio::time::advance(Duration::from_secs(60)).await;
    let online = data.competitions(&scope).await.unwrap();

    assert_eq!(online.source, CacheSource::Network);
    assert_eq!(data.mode(), Mode::Normal);
    assert_eq!(fetcher.calls().len(), 4);
  }

  #[tokio::test(start_paused = true)]
  async fn test_clones_share_failure_counter() {
    let fetcher = ScriptedFetcher::default();
    let data = data_source(&fetcher);
    let clone = data.clone();
    let scope = RequestScope::new();

    for _ in 0..3 {
      let _ = clone.teams(2021, &scope).await;
    }

    assert_eq!(data.mode(), Mode::Degraded);
  }
}

use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::cache::QueryKey;
use crate::config::Config;

use super::error::FetchError;
use super::request::{Payload, Request};

const AUTH_HEADER: &str = "X-Auth-Token";

/// Issues a single remote request. No retries of its own.
pub trait Fetcher: Send + Sync {
  fn fetch(&self, request: &Request) -> impl Future<Output = Result<Payload, FetchError>> + Send;
}

/// football-data.org API client
#[derive(Clone)]
pub struct FootballClient {
  http: reqwest::Client,
  base_url: Url,
}

impl FootballClient {
  pub fn new(config: &Config) -> Result<Self> {
    let mut headers = HeaderMap::new();
    match Config::get_api_token() {
      Some(token) => {
        let value = HeaderValue::from_str(&token)
          .map_err(|e| eyre!("API token is not a valid header value: {}", e))?;
        headers.insert(AUTH_HEADER, value);
      }
      None => warn!("no API token configured, requests will be heavily rate limited"),
    }

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .timeout(Duration::from_secs(config.api.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url: config.api.base_url()?,
    })
  }

  /// Full URL for a request, including query parameters.
  fn url_for(&self, request: &Request) -> Result<Url, FetchError> {
    let mut url = self
      .base_url
      .join(&request.path())
      .map_err(|e| FetchError::Network(format!("invalid request URL: {}", e)))?;

    let query = request.query();
    if !query.is_empty() {
      url.query_pairs_mut().extend_pairs(query);
    }

    Ok(url)
  }

  async fn get(&self, request: &Request) -> Result<Payload, FetchError> {
    let url = self.url_for(request)?;
    debug!(%url, "GET");

    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| FetchError::Network(e.to_string()))?;

    let status = response.status();
    debug!(status = status.as_u16(), request = %request.description(), "response");
    if !status.is_success() {
      return Err(FetchError::Http(status));
    }

    let body = response
      .text()
      .await
      .map_err(|e| FetchError::Network(e.to_string()))?;

    Payload::decode(request.resource_id(), &body).map_err(|e| FetchError::Parse(e.to_string()))
  }
}

impl Fetcher for FootballClient {
  fn fetch(&self, request: &Request) -> impl Future<Output = Result<Payload, FetchError>> + Send {
    self.get(request)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;
  use reqwest::StatusCode;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn client(base: &str) -> FootballClient {
    FootballClient {
      http: reqwest::Client::new(),
      base_url: Url::parse(base).unwrap(),
    }
  }

  #[test]
  fn test_url_for_matches_has_date_range() {
    let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    let url = client("https://api.football-data.org/v4/")
      .url_for(&Request::matches(2021, Some(day)))
      .unwrap();

    assert_eq!(
      url.as_str(),
      "https://api.football-data.org/v4/competitions/2021/matches?dateFrom=2024-01-10&dateTo=2024-01-10"
    );
  }

  #[test]
  fn test_url_for_standings() {
    let url = client("http://localhost:8080/api/football/v4/")
      .url_for(&Request::Standings { competition_id: 2014 })
      .unwrap();

    assert_eq!(
      url.as_str(),
      "http://localhost:8080/api/football/v4/competitions/2014/standings"
    );
  }

  #[tokio::test]
  async fn test_unreachable_host_is_network_error() {
    // Port 9 (discard) on localhost is closed in test environments
    let result = client("http://127.0.0.1:9/v4/")
      .fetch(&Request::Competitions)
      .await;

    assert!(matches!(result, Err(FetchError::Network(_))));
  }

  /// Server answering GET /v4/competitions with a fixed response
  async fn competitions_server(response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v4/competitions"))
      .respond_with(response)
      .mount(&server)
      .await;
    server
  }

  async fn fetch_competitions(server: &MockServer) -> Result<Payload, FetchError> {
    client(&format!("{}/v4/", server.uri()))
      .fetch(&Request::Competitions)
      .await
  }

  #[tokio::test]
  async fn test_throttled_response_is_http_429() {
    let server = competitions_server(ResponseTemplate::new(429)).await;

    let result = fetch_competitions(&server).await;

    assert_eq!(result, Err(FetchError::Http(StatusCode::TOO_MANY_REQUESTS)));
  }

  #[tokio::test]
  async fn test_server_error_keeps_status() {
    let server = competitions_server(ResponseTemplate::new(503)).await;

    let result = fetch_competitions(&server).await;

    assert_eq!(result, Err(FetchError::Http(StatusCode::SERVICE_UNAVAILABLE)));
  }

  #[tokio::test]
  async fn test_undecodable_body_is_parse_error() {
    let server =
      competitions_server(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .await;

    let result = fetch_competitions(&server).await;

    assert!(matches!(result, Err(FetchError::Parse(_))));
  }

  #[tokio::test]
  async fn test_ok_body_decodes_to_payload() {
    let server = competitions_server(
      ResponseTemplate::new(200)
        .set_body_string(r#"{ "competitions": [{ "id": 2021, "name": "Premier League" }] }"#),
    )
    .await;

    let result = fetch_competitions(&server).await;

    match result {
      Ok(Payload::Competitions(response)) => {
        assert_eq!(response.competitions.len(), 1);
        assert_eq!(response.competitions[0].id, 2021);
      }
      other => panic!("unexpected result: {:?}", other),
    }
  }
}

//! Fetch intents, their cache keys, and the payloads they produce.

use chrono::{Days, Local, NaiveDate};
use std::fmt;

use crate::cache::QueryKey;

use super::api_types::{CompetitionsResponse, MatchesResponse, StandingsResponse, TeamsResponse};

/// Days on either side of today when no match date is selected.
const DEFAULT_WINDOW_DAYS: u64 = 7;

/// A parameterized remote request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Request {
  /// All competitions available to the account
  Competitions,
  /// Matches of one competition within an inclusive date range
  Matches {
    competition_id: u64,
    date_from: NaiveDate,
    date_to: NaiveDate,
  },
  /// League table of one competition
  Standings { competition_id: u64 },
  /// Squads of one competition
  Teams { competition_id: u64 },
}

impl Request {
  /// Matches for a selected day, or for a window around today.
  ///
  /// Dates are resolved here so that two requests for the same intent always
  /// produce the same cache key.
  pub fn matches(competition_id: u64, date: Option<NaiveDate>) -> Self {
    Self::matches_around(competition_id, date, Local::now().date_naive())
  }

  fn matches_around(competition_id: u64, date: Option<NaiveDate>, today: NaiveDate) -> Self {
    let (date_from, date_to) = match date {
      Some(day) => (day, day),
      None => (
        today
          .checked_sub_days(Days::new(DEFAULT_WINDOW_DAYS))
          .unwrap_or(today),
        today
          .checked_add_days(Days::new(DEFAULT_WINDOW_DAYS))
          .unwrap_or(today),
      ),
    };

    Self::Matches {
      competition_id,
      date_from,
      date_to,
    }
  }

  /// The resource this request reads, independent of its parameters.
  pub fn resource_id(&self) -> ResourceId {
    match self {
      Self::Competitions => ResourceId::Competitions,
      Self::Matches { competition_id, .. } => ResourceId::Matches(*competition_id),
      Self::Standings { competition_id } => ResourceId::Standings(*competition_id),
      Self::Teams { competition_id } => ResourceId::Teams(*competition_id),
    }
  }

  /// Path relative to the API base URL.
  pub fn path(&self) -> String {
    match self {
      Self::Competitions => "competitions".to_string(),
      Self::Matches { competition_id, .. } => format!("competitions/{}/matches", competition_id),
      Self::Standings { competition_id } => format!("competitions/{}/standings", competition_id),
      Self::Teams { competition_id } => format!("competitions/{}/teams", competition_id),
    }
  }

  /// Query parameters for the remote call.
  pub fn query(&self) -> Vec<(&'static str, String)> {
    match self {
      Self::Matches {
        date_from, date_to, ..
      } => vec![
        ("dateFrom", date_from.format("%Y-%m-%d").to_string()),
        ("dateTo", date_to.format("%Y-%m-%d").to_string()),
      ],
      _ => Vec::new(),
    }
  }
}

impl QueryKey for Request {
  fn cache_key(&self) -> String {
    match self {
      Self::Competitions => "competitions".to_string(),
      Self::Matches {
        competition_id,
        date_from,
        date_to,
      } => format!("matches_{}_{}_{}", competition_id, date_from, date_to),
      Self::Standings { competition_id } => format!("standings_{}", competition_id),
      Self::Teams { competition_id } => format!("teams_{}", competition_id),
    }
  }

  fn description(&self) -> String {
    match self {
      Self::Matches {
        competition_id,
        date_from,
        date_to,
      } if date_from == date_to => format!("matches of {} on {}", competition_id, date_from),
      Self::Matches {
        competition_id,
        date_from,
        date_to,
      } => format!(
        "matches of {} from {} to {}",
        competition_id, date_from, date_to
      ),
      other => other.resource_id().to_string(),
    }
  }
}

/// Identity of a remote resource, used to look up fallback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceId {
  Competitions,
  Matches(u64),
  Standings(u64),
  Teams(u64),
}

impl fmt::Display for ResourceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Competitions => write!(f, "competitions"),
      Self::Matches(id) => write!(f, "matches of {}", id),
      Self::Standings(id) => write!(f, "standings of {}", id),
      Self::Teams(id) => write!(f, "teams of {}", id),
    }
  }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
  Competitions(CompetitionsResponse),
  Matches(MatchesResponse),
  Standings(StandingsResponse),
  Teams(TeamsResponse),
}

impl Payload {
  /// Decode a response body according to the resource it was requested for.
  pub fn decode(resource: ResourceId, body: &str) -> serde_json::Result<Self> {
    Ok(match resource {
      ResourceId::Competitions => Self::Competitions(serde_json::from_str(body)?),
      ResourceId::Matches(_) => Self::Matches(serde_json::from_str(body)?),
      ResourceId::Standings(_) => Self::Standings(serde_json::from_str(body)?),
      ResourceId::Teams(_) => Self::Teams(serde_json::from_str(body)?),
    })
  }

  pub fn into_competitions(self) -> Option<CompetitionsResponse> {
    match self {
      Self::Competitions(response) => Some(response),
      _ => None,
    }
  }

  pub fn into_matches(self) -> Option<MatchesResponse> {
    match self {
      Self::Matches(response) => Some(response),
      _ => None,
    }
  }

  pub fn into_standings(self) -> Option<StandingsResponse> {
    match self {
      Self::Standings(response) => Some(response),
      _ => None,
    }
  }

  pub fn into_teams(self) -> Option<TeamsResponse> {
    match self {
      Self::Teams(response) => Some(response),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  #[test]
  fn test_default_window_key() {
    let request = Request::matches_around(2021, None, day("2024-01-10"));
    assert_eq!(request.cache_key(), "matches_2021_2024-01-03_2024-01-17");
  }

  #[test]
  fn test_selected_date_key() {
    let request = Request::matches_around(2014, Some(day("2024-03-02")), day("2024-01-10"));
    assert_eq!(request.cache_key(), "matches_2014_2024-03-02_2024-03-02");
    assert_eq!(
      request.query(),
      vec![
        ("dateFrom", "2024-03-02".to_string()),
        ("dateTo", "2024-03-02".to_string())
      ]
    );
  }

  #[test]
  fn test_identical_intents_give_identical_keys() {
    let a = Request::matches(2021, Some(day("2024-01-10")));
    let b = Request::matches(2021, Some(day("2024-01-10")));
    assert_eq!(a.cache_key(), b.cache_key());
  }

  #[test]
  fn test_other_keys() {
    assert_eq!(Request::Competitions.cache_key(), "competitions");
    assert_eq!(
      Request::Standings { competition_id: 2021 }.cache_key(),
      "standings_2021"
    );
    assert_eq!(Request::Teams { competition_id: 2002 }.cache_key(), "teams_2002");
  }

  #[test]
  fn test_resource_id_ignores_dates() {
    let a = Request::matches_around(2021, None, day("2024-01-10"));
    let b = Request::matches_around(2021, Some(day("2024-02-01")), day("2024-01-10"));
    assert_eq!(a.resource_id(), b.resource_id());
    assert_eq!(a.resource_id(), ResourceId::Matches(2021));
  }

  #[test]
  fn test_paths() {
    assert_eq!(Request::Competitions.path(), "competitions");
    assert_eq!(
      Request::Standings { competition_id: 2019 }.path(),
      "competitions/2019/standings"
    );
    assert!(Request::Teams { competition_id: 1 }.query().is_empty());
  }

  #[test]
  fn test_decode_by_resource() {
    let payload = Payload::decode(ResourceId::Competitions, r#"{"competitions": []}"#).unwrap();
    assert_eq!(
      payload.into_competitions().map(|c| c.competitions.len()),
      Some(0)
    );
    assert!(Payload::decode(ResourceId::Standings(2021), "not json").is_err());
  }
}

//! Derivation of what the screens show from raw API payloads.
//!
//! Rows and sections are plain data so the views only deal with layout.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{CacheResult, CacheSource, RequestScope};
use crate::config::Config;
use crate::football::api_types::{
  Competition, Match, MatchStatus, MatchesResponse, TableRow, Team, TeamRef,
};
use crate::football::{Fetcher, FootballClient, FootballData, LoadError};

const DEFAULT_BADGE: &str = "🏆";
const UNKNOWN_COUNTRY: &str = "UNKNOWN";
const UNKNOWN_LEAGUE: &str = "Unknown League";
const UNKNOWN_TEAM: &str = "TBD";

/// User-selectable subset of matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchFilter {
  #[default]
  All,
  Live,
  Finished,
  Upcoming,
}

impl MatchFilter {
  pub const ALL: [MatchFilter; 4] = [Self::All, Self::Live, Self::Finished, Self::Upcoming];

  /// Next filter in tab order, wrapping around.
  pub fn next(self) -> Self {
    match self {
      Self::All => Self::Live,
      Self::Live => Self::Finished,
      Self::Finished => Self::Upcoming,
      Self::Upcoming => Self::All,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::All => "All",
      Self::Live => "Live",
      Self::Finished => "Finished",
      Self::Upcoming => "Upcoming",
    }
  }

  pub fn accepts(self, status: DisplayStatus) -> bool {
    match self {
      Self::All => true,
      Self::Live => status == DisplayStatus::Live,
      Self::Finished => status == DisplayStatus::Finished,
      Self::Upcoming => status == DisplayStatus::Upcoming,
    }
  }
}

/// Match state as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
  Finished,
  Live,
  Upcoming,
}

impl DisplayStatus {
  /// Collapse an API status, or None for statuses that are never shown
  /// (postponed, cancelled, ...).
  pub fn from_status(status: MatchStatus) -> Option<Self> {
    match status {
      MatchStatus::Finished => Some(Self::Finished),
      MatchStatus::Live | MatchStatus::InPlay | MatchStatus::Paused => Some(Self::Live),
      MatchStatus::Scheduled | MatchStatus::Timed => Some(Self::Upcoming),
      _ => None,
    }
  }
}

impl fmt::Display for DisplayStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Finished => write!(f, "FT"),
      Self::Live => write!(f, "LIVE"),
      Self::Upcoming => write!(f, "--"),
    }
  }
}

/// Whether a match belongs on the scoreboard at all.
///
/// Finished matches are only shown once both full-time scores are known.
pub fn is_displayable(m: &Match) -> bool {
  match DisplayStatus::from_status(m.status) {
    Some(DisplayStatus::Finished) => m.score.full_time.is_complete(),
    Some(_) => true,
    None => false,
  }
}

fn team_label(team: &TeamRef) -> String {
  team
    .short_name
    .clone()
    .or_else(|| team.name.clone())
    .unwrap_or_else(|| UNKNOWN_TEAM.to_string())
}

/// One line of the match list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRow {
  pub id: u64,
  pub home: String,
  pub away: String,
  pub home_score: u32,
  pub away_score: u32,
  /// Kickoff as HH:MM in the display timezone
  pub kickoff: String,
  pub status: DisplayStatus,
}

impl MatchRow {
  /// Row for a match in the local timezone, or None if it is not displayable.
  pub fn from_match(m: &Match) -> Option<Self> {
    Self::from_match_in(m, &Local)
  }

  pub fn from_match_in<Tz>(m: &Match, tz: &Tz) -> Option<Self>
  where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
  {
    if !is_displayable(m) {
      return None;
    }
    let status = DisplayStatus::from_status(m.status)?;

    let mut score = m.score.full_time;
    if status == DisplayStatus::Live && !score.is_complete() {
      score = m.score.half_time;
    }

    Some(Self {
      id: m.id,
      home: team_label(&m.home_team),
      away: team_label(&m.away_team),
      home_score: score.home.unwrap_or(0),
      away_score: score.away.unwrap_or(0),
      kickoff: m.utc_date.with_timezone(tz).format("%H:%M").to_string(),
      status,
    })
  }

  /// Text for the status column: kickoff time for upcoming matches.
  pub fn status_text(&self) -> String {
    match self.status {
      DisplayStatus::Upcoming => self.kickoff.clone(),
      other => other.to_string(),
    }
  }

  /// Score column, blank until the match starts.
  pub fn score_text(&self) -> String {
    match self.status {
      DisplayStatus::Upcoming => "-".to_string(),
      _ => format!("{} - {}", self.home_score, self.away_score),
    }
  }
}

/// A competition with its displayable matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueSection {
  pub id: u64,
  pub name: String,
  pub flag: String,
  pub country: String,
  pub emblem: Option<String>,
  pub rows: Vec<MatchRow>,
}

impl LeagueSection {
  /// Build a section from a matches payload.
  ///
  /// `known` supplies the header when the payload carries no competition.
  pub fn from_response(
    id: u64,
    known: Option<&Competition>,
    response: &MatchesResponse,
    filter: MatchFilter,
    limit: Option<usize>,
  ) -> Self {
    let competition = response.competition.as_ref().or(known);
    let area = competition.and_then(|c| c.area.as_ref());

    let rows = response
      .matches
      .iter()
      .filter_map(MatchRow::from_match)
      .filter(|row| filter.accepts(row.status))
      .take(limit.unwrap_or(usize::MAX))
      .collect();

    Self {
      id,
      name: competition
        .map(|c| c.name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_LEAGUE.to_string()),
      flag: area
        .and_then(|a| a.flag.clone())
        .unwrap_or_else(|| DEFAULT_BADGE.to_string()),
      country: area
        .map(|a| a.name.to_uppercase())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
      emblem: competition.and_then(|c| c.emblem.clone()),
      rows,
    }
  }

  /// Printable badge for the header. Flags delivered as image URLs
  /// cannot be drawn in a terminal, so those fall back to the trophy.
  pub fn badge(&self) -> &str {
    if self.flag.starts_with("http") {
      DEFAULT_BADGE
    } else {
      &self.flag
    }
  }
}

/// Everything the match list needs for one render.
#[derive(Debug, Clone)]
pub struct MatchBoard {
  /// Competition name from the payload, for single-league boards
  pub competition: Option<String>,
  pub sections: Vec<LeagueSection>,
  /// Some of the data is sample data served while offline
  pub offline: bool,
  pub updated_at: DateTime<Utc>,
}

/// League table rows with the source they were loaded from.
#[derive(Debug, Clone)]
pub struct StandingsTable {
  /// Competition name from the payload, when present
  pub competition: Option<String>,
  pub rows: Vec<TableRow>,
  pub offline: bool,
}

/// Order competitions with starred ones first (in starred order), then by name.
pub fn order_competitions(mut competitions: Vec<Competition>, starred: &[u64]) -> Vec<Competition> {
  competitions.sort_by(|a, b| {
    let rank = |c: &Competition| {
      starred
        .iter()
        .position(|id| *id == c.id)
        .unwrap_or(usize::MAX)
    };
    rank(a)
      .cmp(&rank(b))
      .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
  });
  competitions
}

/// Scoreboard backed by the football-data.org API
pub type LiveScoreboard = Scoreboard<FootballClient>;

/// Loads scoreboard screens through the shared data source.
pub struct Scoreboard<F> {
  data: FootballData<F>,
  popular: Vec<u64>,
  overview_limit: usize,
  request_spacing: Duration,
}

impl<F> Clone for Scoreboard<F> {
  fn clone(&self) -> Self {
    Self {
      data: self.data.clone(),
      popular: self.popular.clone(),
      overview_limit: self.overview_limit,
      request_spacing: self.request_spacing,
    }
  }
}

impl<F: Fetcher> Scoreboard<F> {
  pub fn new(data: FootballData<F>, config: &Config) -> Self {
    Self {
      data,
      popular: config.leagues.popular.clone(),
      overview_limit: config.leagues.overview_limit,
      request_spacing: Duration::from_secs(config.leagues.request_spacing_secs),
    }
  }

  pub fn data(&self) -> &FootballData<F> {
    &self.data
  }

  pub fn popular(&self) -> &[u64] {
    &self.popular
  }

  /// Competitions ordered for the league picker.
  pub async fn competitions(
    &self,
    scope: &RequestScope,
  ) -> Result<CacheResult<Vec<Competition>>, LoadError> {
    let result = self.data.competitions(scope).await?;
    Ok(result.map(|response| order_competitions(response.competitions, &self.popular)))
  }

  /// Matches of every popular league, a few rows each.
  ///
  /// Leagues missing from the competitions list are skipped. Consecutive
  /// network requests are spaced out to stay under the API rate limit.
  /// A league that fails to load is logged and left out.
  pub async fn overview(
    &self,
    date: Option<NaiveDate>,
    filter: MatchFilter,
    scope: &RequestScope,
  ) -> Result<MatchBoard, LoadError> {
    let competitions = self.data.competitions(scope).await?;
    let mut offline = competitions.is_fallback();
    let mut last_hit_network = competitions.source == CacheSource::Network;
    let mut sections = Vec::new();

    for id in &self.popular {
      if !scope.is_live() {
        debug!("overview abandoned");
        break;
      }
      let Some(known) = competitions.data.competitions.iter().find(|c| c.id == *id) else {
        debug!(competition = id, "not in competitions list, skipping");
        continue;
      };

      if last_hit_network && !self.data.mode().is_degraded() {
        tokio::time::sleep(self.request_spacing).await;
      }

      match self.data.matches(*id, date, scope).await {
        Ok(result) => {
          last_hit_network = result.source == CacheSource::Network;
          offline |= result.is_fallback();
          let section = LeagueSection::from_response(
            *id,
            Some(known),
            &result.data,
            filter,
            Some(self.overview_limit),
          );
          if section.rows.is_empty() {
            debug!(competition = id, "no displayable matches");
          } else {
            sections.push(section);
          }
        }
        Err(err) => {
          warn!(competition = id, error = %err, "failed to load league, skipping");
          last_hit_network = matches!(err, LoadError::Fetch(_));
        }
      }
    }

    Ok(MatchBoard {
      competition: None,
      sections,
      offline,
      updated_at: Utc::now(),
    })
  }

  /// Every displayable match of one league.
  pub async fn league(
    &self,
    competition_id: u64,
    date: Option<NaiveDate>,
    filter: MatchFilter,
    scope: &RequestScope,
  ) -> Result<MatchBoard, LoadError> {
    let result = self.data.matches(competition_id, date, scope).await?;
    let section = LeagueSection::from_response(competition_id, None, &result.data, filter, None);

    Ok(MatchBoard {
      competition: result
        .data
        .competition
        .as_ref()
        .map(|c| c.name.clone())
        .filter(|name| !name.is_empty()),
      sections: if section.rows.is_empty() {
        Vec::new()
      } else {
        vec![section]
      },
      offline: result.is_fallback(),
      updated_at: Utc::now(),
    })
  }

  /// First table of the league's standings.
  pub async fn standings(
    &self,
    competition_id: u64,
    scope: &RequestScope,
  ) -> Result<StandingsTable, LoadError> {
    let result = self.data.standings(competition_id, scope).await?;
    let offline = result.is_fallback();
    let response = result.data;

    Ok(StandingsTable {
      competition: response
        .competition
        .map(|c| c.name)
        .filter(|name| !name.is_empty()),
      rows: response
        .standings
        .into_iter()
        .next()
        .map(|group| group.table)
        .unwrap_or_default(),
      offline,
    })
  }

  /// Teams of a league sorted by name.
  pub async fn teams(
    &self,
    competition_id: u64,
    scope: &RequestScope,
  ) -> Result<CacheResult<Vec<Team>>, LoadError> {
    let result = self.data.teams(competition_id, scope).await?;
    Ok(result.map(|response| {
      let mut teams = response.teams;
      teams.sort_by(|a, b| a.name.cmp(&b.name));
      teams
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::football::api_types::{Area, Score, ScorePair};
  use crate::football::test_support::{competitions_payload, data_source, ScriptedFetcher};
  use crate::football::{FetchError, Payload, ResourceId};

  fn team(short: Option<&str>, name: Option<&str>) -> TeamRef {
    TeamRef {
      id: None,
      name: name.map(String::from),
      short_name: short.map(String::from),
      tla: None,
      crest: None,
    }
  }

  fn a_match(status: MatchStatus, full: (Option<u32>, Option<u32>), half: (Option<u32>, Option<u32>)) -> Match {
    Match {
      id: 7,
      utc_date: Utc.with_ymd_and_hms(2024, 1, 13, 19, 45, 0).unwrap(),
      status,
      matchday: Some(21),
      stage: None,
      group: None,
      home_team: team(Some("Arsenal"), Some("Arsenal FC")),
      away_team: team(None, Some("Crystal Palace FC")),
      score: Score {
        winner: None,
        duration: None,
        full_time: ScorePair {
          home: full.0,
          away: full.1,
        },
        half_time: ScorePair {
          home: half.0,
          away: half.1,
        },
      },
    }
  }

  fn matches_payload(id: u64, statuses: &[&str]) -> Payload {
    let matches: Vec<String> = statuses
      .iter()
      .enumerate()
      .map(|(i, status)| {
        format!(
          r#"{{ "id": {}, "utcDate": "2024-01-13T15:00:00Z", "status": "{}",
               "homeTeam": {{ "name": "Home {}" }}, "awayTeam": {{ "name": "Away {}" }},
               "score": {{ "fullTime": {{ "home": 1, "away": 0 }}, "halfTime": {{ "home": 0, "away": 0 }} }} }}"#,
          i, status, i, i
        )
      })
      .collect();
    let body = format!(
      r#"{{ "competition": {{ "id": {}, "name": "League {}" }}, "matches": [{}] }}"#,
      id,
      id,
      matches.join(",")
    );
    Payload::decode(ResourceId::Matches(id), &body).unwrap()
  }

  fn competition(id: u64, name: &str) -> Competition {
    Competition {
      id,
      name: name.to_string(),
      code: None,
      emblem: None,
      kind: None,
      area: None,
      current_season: None,
    }
  }

  fn scoreboard(fetcher: &ScriptedFetcher) -> Scoreboard<ScriptedFetcher> {
    Scoreboard::new(data_source(fetcher), &Config::default())
  }

  #[test]
  fn test_finished_without_score_is_hidden() {
    let m = a_match(MatchStatus::Finished, (Some(2), None), (None, None));
    assert!(!is_displayable(&m));
    assert!(MatchRow::from_match_in(&m, &Utc).is_none());
  }

  #[test]
  fn test_postponed_is_hidden() {
    let m = a_match(MatchStatus::Postponed, (None, None), (None, None));
    assert!(!is_displayable(&m));
  }

  #[test]
  fn test_live_uses_half_time_score() {
    let m = a_match(MatchStatus::InPlay, (None, None), (Some(1), None));
    let row = MatchRow::from_match_in(&m, &Utc).unwrap();

    assert_eq!(row.status, DisplayStatus::Live);
    assert_eq!((row.home_score, row.away_score), (1, 0));
    assert_eq!(row.score_text(), "1 - 0");
  }

  #[test]
  fn test_row_labels_and_kickoff() {
    let m = a_match(MatchStatus::Timed, (None, None), (None, None));
    let row = MatchRow::from_match_in(&m, &Utc).unwrap();

    assert_eq!(row.home, "Arsenal");
    assert_eq!(row.away, "Crystal Palace FC");
    assert_eq!(row.kickoff, "19:45");
    assert_eq!(row.status, DisplayStatus::Upcoming);
    assert_eq!(row.status_text(), "19:45");
  }

  #[test]
  fn test_paused_counts_as_live() {
    let m = a_match(MatchStatus::Paused, (Some(0), Some(0)), (Some(0), Some(0)));
    let row = MatchRow::from_match_in(&m, &Utc).unwrap();
    assert!(MatchFilter::Live.accepts(row.status));
  }

  #[test]
  fn test_filter_cycles() {
    let mut filter = MatchFilter::All;
    for expected in [
      MatchFilter::Live,
      MatchFilter::Finished,
      MatchFilter::Upcoming,
      MatchFilter::All,
    ] {
      filter = filter.next();
      assert_eq!(filter, expected);
    }
  }

  #[test]
  fn test_section_header_defaults() {
    let response = MatchesResponse {
      competition: None,
      matches: Vec::new(),
    };
    let section = LeagueSection::from_response(99, None, &response, MatchFilter::All, None);

    assert_eq!(section.name, "Unknown League");
    assert_eq!(section.flag, "🏆");
    assert_eq!(section.country, "UNKNOWN");
    assert_eq!(section.badge(), "🏆");
  }

  #[test]
  fn test_section_uses_area() {
    let mut known = competition(2014, "Primera Division");
    known.area = Some(Area {
      name: "Spain".to_string(),
      flag: Some("https://crests.football-data.org/760.svg".to_string()),
    });
    let response = MatchesResponse {
      competition: None,
      matches: vec![a_match(MatchStatus::Finished, (Some(3), Some(2)), (Some(1), Some(1)))],
    };

    let section =
      LeagueSection::from_response(2014, Some(&known), &response, MatchFilter::Finished, None);

    assert_eq!(section.name, "Primera Division");
    assert_eq!(section.country, "SPAIN");
    assert_eq!(section.badge(), "🏆");
    assert_eq!(section.rows.len(), 1);
  }

  #[test]
  fn test_section_filter_and_limit() {
    let response = MatchesResponse {
      competition: None,
      matches: vec![
        a_match(MatchStatus::Finished, (Some(1), Some(0)), (None, None)),
        a_match(MatchStatus::InPlay, (None, None), (None, None)),
        a_match(MatchStatus::Scheduled, (None, None), (None, None)),
        a_match(MatchStatus::Live, (None, None), (None, None)),
      ],
    };

    let live = LeagueSection::from_response(1, None, &response, MatchFilter::Live, None);
    assert_eq!(live.rows.len(), 2);

    let limited = LeagueSection::from_response(1, None, &response, MatchFilter::All, Some(3));
    assert_eq!(limited.rows.len(), 3);
  }

  #[test]
  fn test_order_competitions() {
    let ordered = order_competitions(
      vec![
        competition(2002, "Bundesliga"),
        competition(2014, "La Liga"),
        competition(2019, "Serie A"),
        competition(2021, "Premier League"),
        competition(2015, "Ligue 1"),
      ],
      &[2021, 2014],
    );
    let ids: Vec<u64> = ordered.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![2021, 2014, 2002, 2015, 2019]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_overview_spaces_network_requests() {
    let fetcher = ScriptedFetcher::default();
    fetcher.push(Ok(competitions_payload(&[2021, 2014])));
    fetcher.push(Ok(matches_payload(2021, &["FINISHED"; 7])));
    fetcher.push(Ok(matches_payload(2014, &["SCHEDULED", "IN_PLAY"])));
    let board = scoreboard(&fetcher);

    let started = tokio::time::Instant::now();
    let result = board
      .overview(None, MatchFilter::All, &RequestScope::new())
      .await
      .unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(10));
    assert!(!result.offline);
    assert_eq!(result.sections.len(), 2);
    assert_eq!(result.sections[0].rows.len(), 5);
    assert_eq!(result.sections[1].name, "League 2014");
    assert_eq!(fetcher.calls().len(), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_overview_skips_unlisted_and_failing_leagues() {
    let fetcher = ScriptedFetcher::default();
    fetcher.push(Ok(competitions_payload(&[2014, 2002])));
    fetcher.push(Err(FetchError::Network("reset".into())));
    let board = scoreboard(&fetcher);

    let result = board
      .overview(None, MatchFilter::All, &RequestScope::new())
      .await
      .unwrap();

    assert!(result.sections.is_empty());
    // 2021 is not listed, so only 2014 was requested
    assert_eq!(fetcher.calls().len(), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_overview_while_offline_uses_samples() {
    let fetcher = ScriptedFetcher::default();
    let board = scoreboard(&fetcher);
    let scope = RequestScope::new();
    for _ in 0..3 {
      let _ = board.data().teams(2021, &scope).await;
    }

    let started = tokio::time::Instant::now();
    let result = board.overview(None, MatchFilter::All, &scope).await.unwrap();

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(result.offline);
    let names: Vec<&str> = result.sections.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Premier League", "La Liga"]);
    assert_eq!(result.sections[0].rows.len(), 3);
    assert_eq!(fetcher.calls().len(), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_league_shows_all_rows() {
    let fetcher = ScriptedFetcher::default();
    fetcher.push(Ok(matches_payload(2002, &["FINISHED"; 8])));
    let board = scoreboard(&fetcher);

    let result = board
      .league(2002, None, MatchFilter::All, &RequestScope::new())
      .await
      .unwrap();

    assert_eq!(result.competition.as_deref(), Some("League 2002"));
    assert_eq!(result.sections.len(), 1);
    assert_eq!(result.sections[0].rows.len(), 8);
  }

  #[tokio::test(start_paused = true)]
  async fn test_standings_first_table_from_samples() {
    let fetcher = ScriptedFetcher::default();
    let board = scoreboard(&fetcher);
    let scope = RequestScope::new();
    for _ in 0..3 {
      let _ = board.data().teams(2021, &scope).await;
    }

    let table = board.standings(2021, &scope).await.unwrap();

    assert!(table.offline);
    assert_eq!(table.competition.as_deref(), Some("Premier League"));
    assert_eq!(table.rows.len(), 9);
    assert_eq!(table.rows[0].position, 1);
  }
}

//! Serde-deserializable types matching football-data.org v4 responses.
//!
//! Most fields are optional: the API sends `null` for teams that are not yet
//! known (e.g. knockout fixtures) and omits fields depending on the
//! subscription tier.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

// ============================================================================
// Competitions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Area {
  #[serde(default)]
  pub name: String,
  pub flag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
  pub id: u64,
  pub start_date: Option<NaiveDate>,
  pub end_date: Option<NaiveDate>,
  pub current_matchday: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competition {
  pub id: u64,
  #[serde(default)]
  pub name: String,
  pub code: Option<String>,
  pub emblem: Option<String>,
  /// LEAGUE, CUP, ...
  #[serde(rename = "type")]
  pub kind: Option<String>,
  #[serde(alias = "country")]
  pub area: Option<Area>,
  pub current_season: Option<Season>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompetitionsResponse {
  #[serde(default)]
  pub competitions: Vec<Competition>,
}

// ============================================================================
// Matches
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
  Scheduled,
  Timed,
  Live,
  InPlay,
  Paused,
  Finished,
  Postponed,
  Suspended,
  Cancelled,
  Awarded,
  #[serde(other)]
  Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRef {
  pub id: Option<u64>,
  pub name: Option<String>,
  pub short_name: Option<String>,
  pub tla: Option<String>,
  pub crest: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ScorePair {
  pub home: Option<u32>,
  pub away: Option<u32>,
}

impl ScorePair {
  pub fn is_complete(&self) -> bool {
    self.home.is_some() && self.away.is_some()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
  /// HOME_TEAM, AWAY_TEAM, DRAW
  pub winner: Option<String>,
  /// REGULAR, EXTRA_TIME, PENALTY_SHOOTOUT
  pub duration: Option<String>,
  #[serde(default)]
  pub full_time: ScorePair,
  #[serde(default)]
  pub half_time: ScorePair,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
  pub id: u64,
  #[serde(alias = "date")]
  pub utc_date: DateTime<Utc>,
  pub status: MatchStatus,
  pub matchday: Option<u32>,
  pub stage: Option<String>,
  pub group: Option<String>,
  pub home_team: TeamRef,
  pub away_team: TeamRef,
  #[serde(default)]
  pub score: Score,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchesResponse {
  pub competition: Option<Competition>,
  #[serde(default)]
  pub matches: Vec<Match>,
}

// ============================================================================
// Teams
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Coach {
  pub id: Option<u64>,
  pub name: Option<String>,
  pub nationality: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
  pub id: u64,
  #[serde(default)]
  pub name: String,
  pub short_name: Option<String>,
  pub tla: Option<String>,
  pub crest: Option<String>,
  pub website: Option<String>,
  pub founded: Option<u32>,
  pub club_colors: Option<String>,
  pub venue: Option<String>,
  pub coach: Option<Coach>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeamsResponse {
  pub competition: Option<Competition>,
  #[serde(default)]
  pub teams: Vec<Team>,
}

// ============================================================================
// Standings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
  pub position: u32,
  pub team: TeamRef,
  pub played_games: u32,
  pub won: u32,
  pub draw: u32,
  pub lost: u32,
  pub points: u32,
  pub goals_for: u32,
  pub goals_against: u32,
  pub goal_difference: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StandingGroup {
  pub stage: Option<String>,
  /// TOTAL, HOME, AWAY
  #[serde(rename = "type")]
  pub kind: Option<String>,
  pub group: Option<String>,
  #[serde(default)]
  pub table: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StandingsResponse {
  pub competition: Option<Competition>,
  #[serde(default)]
  pub standings: Vec<StandingGroup>,
}

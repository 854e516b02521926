//! Compiled-in sample data served while offline.

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::HashMap;

use crate::football::api_types::{
  CompetitionsResponse, MatchesResponse, StandingsResponse, TeamsResponse,
};
use crate::football::{Payload, ResourceId};

const BUILTIN: &str = include_str!("fallback.json");

/// On-disk layout of the sample data document, keyed by competition id.
#[derive(Debug, Deserialize)]
struct FallbackDocument {
  competitions: Option<CompetitionsResponse>,
  #[serde(default)]
  matches: HashMap<u64, MatchesResponse>,
  #[serde(default)]
  standings: HashMap<u64, StandingsResponse>,
  #[serde(default)]
  teams: HashMap<u64, TeamsResponse>,
}

/// Immutable sample payloads, one per known resource.
#[derive(Debug, Clone, Default)]
pub struct FallbackTable {
  entries: HashMap<ResourceId, Payload>,
}

impl FallbackTable {
  /// Load the sample data shipped with the binary.
  pub fn builtin() -> Result<Self> {
    Self::from_json(BUILTIN)
  }

  pub fn from_json(json: &str) -> Result<Self> {
    let document: FallbackDocument =
      serde_json::from_str(json).map_err(|e| eyre!("Failed to parse fallback data: {}", e))?;

    let mut entries = HashMap::new();
    if let Some(competitions) = document.competitions {
      entries.insert(
        ResourceId::Competitions,
        Payload::Competitions(competitions),
      );
    }
    for (id, matches) in document.matches {
      entries.insert(ResourceId::Matches(id), Payload::Matches(matches));
    }
    for (id, standings) in document.standings {
      entries.insert(ResourceId::Standings(id), Payload::Standings(standings));
    }
    for (id, teams) in document.teams {
      entries.insert(ResourceId::Teams(id), Payload::Teams(teams));
    }

    Ok(Self { entries })
  }

  /// Sample payload for a resource, or None when nothing is shipped for it.
  pub fn get_fallback(&self, resource: ResourceId) -> Option<Payload> {
    self.entries.get(&resource).cloned()
  }

  #[cfg(test)]
  fn len(&self) -> usize {
    self.entries.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_builtin_parses() {
    let table = FallbackTable::builtin().unwrap();
    assert_eq!(table.len(), 4);
  }

  #[test]
  fn test_builtin_premier_league_matches() {
    let table = FallbackTable::builtin().unwrap();
    let matches = table
      .get_fallback(ResourceId::Matches(2021))
      .and_then(Payload::into_matches)
      .unwrap();

    assert_eq!(matches.matches.len(), 3);
    assert_eq!(
      matches.matches[0].home_team.short_name.as_deref(),
      Some("Arsenal")
    );
  }

  #[test]
  fn test_builtin_standings_and_competitions() {
    let table = FallbackTable::builtin().unwrap();

    let standings = table
      .get_fallback(ResourceId::Standings(2021))
      .and_then(Payload::into_standings)
      .unwrap();
    assert_eq!(standings.standings[0].table.len(), 9);

    let competitions = table
      .get_fallback(ResourceId::Competitions)
      .and_then(Payload::into_competitions)
      .unwrap();
    let ids: Vec<u64> = competitions.competitions.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![2021, 2014]);
  }

  #[test]
  fn test_unknown_resource_has_no_fallback() {
    let table = FallbackTable::builtin().unwrap();
    assert!(table.get_fallback(ResourceId::Matches(2019)).is_none());
    assert!(table.get_fallback(ResourceId::Standings(2014)).is_none());
    assert!(table.get_fallback(ResourceId::Teams(2021)).is_none());
  }

  #[test]
  fn test_from_json_rejects_garbage() {
    assert!(FallbackTable::from_json("{ nope").is_err());
  }
}

pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use ratatui::widgets::ListState;
use std::time::Duration;

use crate::config::Config;
use crate::scoreboard::{LiveScoreboard, MatchFilter};

/// Shared handles every view is created with
#[derive(Clone)]
pub struct ViewContext {
  pub scoreboard: LiveScoreboard,
  /// Automatic reload period for live data, None disables it
  pub refresh_interval: Option<Duration>,
  pub default_filter: MatchFilter,
}

impl ViewContext {
  pub fn new(scoreboard: LiveScoreboard, config: &Config) -> Self {
    Self {
      scoreboard,
      refresh_interval: config.refresh.interval(),
      default_filter: config.default_filter,
    }
  }
}

/// Keep a list selection inside `0..len`, selecting the first item by default
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    Some(idx) if idx >= len => state.select(Some(len - 1)),
    None => state.select(Some(0)),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_selection_defaults_to_first() {
    let mut state = ListState::default();
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(0));
  }

  #[test]
  fn test_selection_clamped_after_shrink() {
    let mut state = ListState::default();
    state.select(Some(8));
    ensure_valid_selection(&mut state, 5);
    assert_eq!(state.selected(), Some(4));
  }

  #[test]
  fn test_selection_cleared_when_empty() {
    let mut state = ListState::default();
    state.select(Some(2));
    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }
}

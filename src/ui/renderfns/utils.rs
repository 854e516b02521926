use chrono::{DateTime, Local, Utc};
use ratatui::prelude::{Color, Rect};

use crate::scoreboard::DisplayStatus;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Get the display color for a match status
pub fn status_color(status: DisplayStatus) -> Color {
  match status {
    DisplayStatus::Live => Color::Red,
    DisplayStatus::Finished => Color::Green,
    DisplayStatus::Upcoming => Color::Gray,
  }
}

/// Color of a goal difference in the league table
pub fn goal_difference_color(diff: i32) -> Color {
  match diff {
    d if d > 0 => Color::Green,
    d if d < 0 => Color::Red,
    _ => Color::White,
  }
}

/// Local wall-clock time for "last update" lines
pub fn format_clock(at: DateTime<Utc>) -> String {
  at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Area for an overlay anchored at the top-left of `area`
pub fn overlay_rect(area: Rect, height: u16) -> Rect {
  let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
  Rect::new(
    area.x + 1,
    area.y + 1,
    width.saturating_sub(1),
    height.min(area.height.saturating_sub(1)),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("Arsenal", 10), "Arsenal");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("Chelsea", 7), "Chelsea");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("Brighton & Hove Albion", 10), "Brighto...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("1. FC Köln München", 8), "1. FC...");
    assert_eq!(truncate("Atlético", 8), "Atlético");
  }

  #[test]
  fn test_status_colors() {
    assert_eq!(status_color(DisplayStatus::Live), Color::Red);
    assert_eq!(status_color(DisplayStatus::Finished), Color::Green);
    assert_eq!(status_color(DisplayStatus::Upcoming), Color::Gray);
  }

  #[test]
  fn test_goal_difference_color() {
    assert_eq!(goal_difference_color(12), Color::Green);
    assert_eq!(goal_difference_color(-3), Color::Red);
    assert_eq!(goal_difference_color(0), Color::White);
  }

  #[test]
  fn test_overlay_fits_small_area() {
    let area = Rect::new(0, 0, 20, 4);
    let overlay = overlay_rect(area, 10);
    assert!(overlay.right() <= area.right());
    assert!(overlay.bottom() <= area.bottom());
  }
}

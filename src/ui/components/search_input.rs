use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::ui::renderfns::overlay_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by search input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Search query changed (emitted on each keystroke, empty string on cancel)
  Changed(String),
  /// Search submitted (overlay closed, filter persists)
  Submitted,
}

/// Name search opened with `/`
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
  input: TextInput,
  active: bool,
}

impl SearchInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn query(&self) -> &str {
    self.input.value()
  }

  /// Case-insensitive match of the current query against `text`
  pub fn matches(&self, text: &str) -> bool {
    let query = self.query().trim();
    query.is_empty() || text.to_lowercase().contains(&query.to_lowercase())
  }

  /// Handle a key event.
  /// Call this regardless of active state, it handles activation too.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<SearchEvent> {
    if !self.active {
      if key.code == KeyCode::Char('/') {
        self.active = true;
        self.input.clear();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(_) => {
        self.active = false;
        KeyResult::Event(SearchEvent::Submitted)
      }
      InputResult::Cancelled => {
        self.active = false;
        self.input.clear();
        KeyResult::Event(SearchEvent::Changed(String::new()))
      }
      InputResult::Consumed => KeyResult::Event(SearchEvent::Changed(self.input.value().to_string())),
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let overlay_area = overlay_rect(area, 3);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Search ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let input_line = Line::from(vec![
      Span::styled("/", Style::default().fg(Color::Yellow)),
      Span::raw(self.input.value()),
      Span::styled("_", Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(Paragraph::new(input_line), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_typing_emits_changes() {
    let mut search = SearchInput::new();
    search.handle_key(key(KeyCode::Char('/')));

    assert_eq!(
      search.handle_key(key(KeyCode::Char('l'))),
      KeyResult::Event(SearchEvent::Changed("l".to_string()))
    );
    assert!(search.matches("La Liga"));
    assert!(!search.matches("Serie A"));
  }

  #[test]
  fn test_submit_keeps_query() {
    let mut search = SearchInput::new();
    search.handle_key(key(KeyCode::Char('/')));
    search.handle_key(key(KeyCode::Char('x')));

    assert_eq!(
      search.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(SearchEvent::Submitted)
    );
    assert!(!search.is_active());
    assert_eq!(search.query(), "x");
  }

  #[test]
  fn test_cancel_clears_query() {
    let mut search = SearchInput::new();
    search.handle_key(key(KeyCode::Char('/')));
    search.handle_key(key(KeyCode::Char('x')));
    search.handle_key(key(KeyCode::Esc));

    assert_eq!(search.query(), "");
    assert!(search.matches("anything"));
  }
}

use super::KeyResult;
use crate::scoreboard::MatchFilter;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Events emitted by the filter tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTabsEvent {
  Changed(MatchFilter),
}

/// Tab row for All / Live / Finished / Upcoming
#[derive(Debug, Clone, Default)]
pub struct FilterTabs {
  selected: MatchFilter,
}

impl FilterTabs {
  pub fn new(selected: MatchFilter) -> Self {
    Self { selected }
  }

  pub fn selected(&self) -> MatchFilter {
    self.selected
  }

  /// Tab/f cycles forward, BackTab/F backwards
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FilterTabsEvent> {
    let next = match key.code {
      KeyCode::Tab | KeyCode::Char('f') => self.selected.next(),
      KeyCode::BackTab | KeyCode::Char('F') => self.previous(),
      _ => return KeyResult::NotHandled,
    };
    self.selected = next;
    KeyResult::Event(FilterTabsEvent::Changed(next))
  }

  fn previous(&self) -> MatchFilter {
    let all = MatchFilter::ALL;
    let idx = all.iter().position(|f| *f == self.selected).unwrap_or(0);
    all[(idx + all.len() - 1) % all.len()]
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled("[filter] ", Style::default().fg(Color::Yellow))];

    for (idx, filter) in MatchFilter::ALL.iter().enumerate() {
      if idx > 0 {
        spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
      }
      let style = if *filter == self.selected {
        Style::default().fg(Color::Black).bg(Color::Cyan)
      } else {
        Style::default().fg(Color::Gray)
      };
      spans.push(Span::styled(format!(" {} ", filter.label()), style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }
}

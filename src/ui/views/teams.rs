use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::cache::{CacheResult, RequestScope};
use crate::football::api_types::Team;
use crate::query::{Query, QueryState};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::truncate;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::ViewContext;

/// Teams of one competition, searchable by name
pub struct TeamsView {
  competition_id: u64,
  name: String,
  query: Query<CacheResult<Vec<Team>>>,
  list_state: ListState,
  search: SearchInput,
}

impl TeamsView {
  pub fn new(ctx: ViewContext, competition_id: u64, name: String) -> Self {
    let scoreboard = ctx.scoreboard.clone();
    let mut query = Query::new(move |scope: RequestScope| {
      let scoreboard = scoreboard.clone();
      async move {
        scoreboard
          .teams(competition_id, &scope)
          .await
          .map_err(|e| e.to_string())
      }
    });

    query.fetch();

    Self {
      competition_id,
      name,
      query,
      list_state: ListState::default(),
      search: SearchInput::new(),
    }
  }

  fn visible_teams(&self) -> Vec<&Team> {
    self
      .query
      .data()
      .map(|result| {
        result
          .data
          .iter()
          .filter(|team| {
            self.search.matches(&team.name)
              || team.short_name.as_deref().is_some_and(|s| self.search.matches(s))
          })
          .collect()
      })
      .unwrap_or_default()
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let teams = self.visible_teams();
    let len = teams.len();

    let title = match self.query.state() {
      QueryState::Loading => format!(" Teams · {} (loading...) ", self.name),
      QueryState::Error(e) => format!(" Teams · {} (error: {}) ", self.name, e),
      _ if !self.search.query().is_empty() => {
        format!(" Teams · {} ({}) /{} ", self.name, len, self.search.query())
      }
      _ => format!(" Teams · {} ({}) ", self.name, len),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if teams.is_empty() && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load teams. Press 'r' to retry."
      } else {
        "No teams found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = teams
      .iter()
      .map(|team| {
        let coach = team
          .coach
          .as_ref()
          .and_then(|c| c.name.clone())
          .unwrap_or_default();
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:<5}", team.tla.clone().unwrap_or_default()),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(format!("{:<28}", truncate(&team.name, 28))),
          Span::styled(
            format!(
              "{:<6}",
              team.founded.map(|y| y.to_string()).unwrap_or_default()
            ),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw(format!("{:<30}", truncate(team.venue.as_deref().unwrap_or(""), 30))),
          Span::styled(coach, Style::default().fg(Color::Yellow)),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    ensure_valid_selection(&mut self.list_state, len);
    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.search.handle_key(key) {
      KeyResult::Handled => Some(ViewAction::None),
      KeyResult::Event(SearchEvent::Changed(_)) => {
        self.list_state.select(Some(0));
        Some(ViewAction::None)
      }
      KeyResult::Event(SearchEvent::Submitted) => Some(ViewAction::None),
      KeyResult::NotHandled => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('q') | KeyCode::Esc => return Some(ViewAction::Pop),
      _ => return None,
    }
    Some(ViewAction::None)
  }
}

impl View for TeamsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_overlays(key)
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    format!("Teams [{}]", self.name)
  }

  fn competition(&self) -> Option<(u64, String)> {
    Some((self.competition_id, self.name.clone()))
  }

  fn context(&self) -> Option<String> {
    Some(self.name.clone())
  }

  fn is_capturing_input(&self) -> bool {
    self.search.is_active()
  }

  fn tick(&mut self) {
    self.query.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
      ShortcutInfo::new("esc", "clear search").when_active(),
    ]
  }
}

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::cache::{CacheResult, RequestScope};
use crate::football::api_types::Competition;
use crate::query::{Query, QueryState};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::truncate;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{MatchesView, StandingsView, TeamsView};
use crate::ui::ViewContext;

/// Competition picker, popular leagues first
pub struct LeaguesView {
  ctx: ViewContext,
  query: Query<CacheResult<Vec<Competition>>>,
  list_state: ListState,
  search: SearchInput,
}

impl LeaguesView {
  pub fn new(ctx: ViewContext) -> Self {
    let scoreboard = ctx.scoreboard.clone();
    let mut query = Query::new(move |scope: RequestScope| {
      let scoreboard = scoreboard.clone();
      async move { scoreboard.competitions(&scope).await.map_err(|e| e.to_string()) }
    });

    query.fetch();

    Self {
      ctx,
      query,
      list_state: ListState::default(),
      search: SearchInput::new(),
    }
  }

  fn visible(&self) -> Vec<&Competition> {
    self
      .query
      .data()
      .map(|result| {
        result
          .data
          .iter()
          .filter(|c| {
            self.search.matches(&c.name)
              || c.area.as_ref().is_some_and(|a| self.search.matches(&a.name))
          })
          .collect()
      })
      .unwrap_or_default()
  }

  fn selected(&self) -> Option<(u64, String)> {
    let idx = self.list_state.selected()?;
    self.visible().get(idx).map(|c| (c.id, c.name.clone()))
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let competitions = self.visible();
    let len = competitions.len();
    let offline = self.query.data().is_some_and(|r| r.is_fallback());

    let title = match self.query.state() {
      QueryState::Loading => " Leagues (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Leagues (error: {}) ", e),
      _ if offline => format!(" Leagues ({}) offline sample ", len),
      _ => format!(" Leagues ({}) ", len),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if competitions.is_empty() && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load competitions. Press 'r' to retry."
      } else {
        "No competitions found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let popular = self.ctx.scoreboard.popular();
    let items: Vec<ListItem> = competitions
      .iter()
      .map(|c| {
        let star = if popular.contains(&c.id) { "★" } else { " " };
        let country = c.area.as_ref().map(|a| a.name.as_str()).unwrap_or("");
        ListItem::new(Line::from(vec![
          Span::styled(format!("{} ", star), Style::default().fg(Color::Yellow)),
          Span::styled(
            format!("{:<6}", c.code.clone().unwrap_or_default()),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(format!("{:<32}", truncate(&c.name, 32))),
          Span::styled(
            truncate(country, 20),
            Style::default().fg(Color::DarkGray),
          ),
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

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
        Some(ViewAction::None)
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
        Some(ViewAction::None)
      }
      _ => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    let view: Box<dyn View> = match key.code {
      KeyCode::Char('r') => {
        self.query.refetch();
        return Some(ViewAction::None);
      }
      KeyCode::Char('q') | KeyCode::Esc => return Some(ViewAction::Pop),
      KeyCode::Enter => {
        let (id, name) = self.selected()?;
        Box::new(MatchesView::league(self.ctx.clone(), id, name, None))
      }
      KeyCode::Char('s') => {
        let (id, name) = self.selected()?;
        Box::new(StandingsView::new(self.ctx.clone(), id, name))
      }
      KeyCode::Char('T') => {
        let (id, name) = self.selected()?;
        Box::new(TeamsView::new(self.ctx.clone(), id, name))
      }
      _ => return None,
    };
    Some(ViewAction::Push(view))
  }
}

impl View for LeaguesView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_overlays(key)
      .or_else(|| self.handle_navigation(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Leagues".to_string()
  }

  fn competition(&self) -> Option<(u64, String)> {
    self.selected()
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
      ShortcutInfo::new("enter", "matches").with_priority(25),
      ShortcutInfo::new("s", "standings").with_priority(30),
      ShortcutInfo::new("T", "teams").with_priority(35),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

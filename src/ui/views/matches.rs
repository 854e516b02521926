use chrono::{Days, Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::cache::RequestScope;
use crate::query::{Query, QueryState};
use crate::scoreboard::{LeagueSection, MatchBoard, MatchFilter, MatchRow};
use crate::ui::components::{FilterTabs, FilterTabsEvent, KeyResult};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_clock, status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::StandingsView;
use crate::ui::ViewContext;

/// One line of the flattened match list
enum Entry<'a> {
  Header(&'a LeagueSection),
  Match(&'a LeagueSection, &'a MatchRow),
}

impl Entry<'_> {
  fn section(&self) -> &LeagueSection {
    match self {
      Entry::Header(section) | Entry::Match(section, _) => section,
    }
  }
}

/// Scores of the popular leagues, or of a single competition
pub struct MatchesView {
  ctx: ViewContext,
  /// None shows the overview of popular leagues
  competition: Option<(u64, String)>,
  /// None shows the window around today
  date: Option<NaiveDate>,
  tabs: FilterTabs,
  query: Query<MatchBoard>,
  list_state: ListState,
}

impl MatchesView {
  pub fn overview(ctx: ViewContext, date: Option<NaiveDate>, filter: MatchFilter) -> Self {
    Self::build(ctx, None, date, filter)
  }

  pub fn league(ctx: ViewContext, id: u64, name: String, date: Option<NaiveDate>) -> Self {
    let filter = ctx.default_filter;
    Self::build(ctx, Some((id, name)), date, filter)
  }

  fn build(
    ctx: ViewContext,
    competition: Option<(u64, String)>,
    date: Option<NaiveDate>,
    filter: MatchFilter,
  ) -> Self {
    let query = Self::make_query(&ctx, competition.as_ref().map(|(id, _)| *id), date, filter);
    Self {
      ctx,
      competition,
      date,
      tabs: FilterTabs::new(filter),
      query,
      list_state: ListState::default(),
    }
  }

  fn make_query(
    ctx: &ViewContext,
    competition: Option<u64>,
    date: Option<NaiveDate>,
    filter: MatchFilter,
  ) -> Query<MatchBoard> {
    let scoreboard = ctx.scoreboard.clone();
    let mut query = Query::new(move |scope: RequestScope| {
      let scoreboard = scoreboard.clone();
      async move {
        let result = match competition {
          Some(id) => scoreboard.league(id, date, filter, &scope).await,
          None => scoreboard.overview(date, filter, &scope).await,
        };
        result.map_err(|e| e.to_string())
      }
    })
    .with_refresh_interval(ctx.refresh_interval);

    query.fetch();
    query
  }

  /// Rebuild the query after the filter or date changed
  fn reload(&mut self) {
    self.query = Self::make_query(
      &self.ctx,
      self.competition.as_ref().map(|(id, _)| *id),
      self.date,
      self.tabs.selected(),
    );
    self.list_state.select(Some(0));
  }

  fn shift_date(&mut self, days: i64) {
    let base = self.date.unwrap_or_else(|| Local::now().date_naive());
    let shifted = if days >= 0 {
      base.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
      base.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    if let Some(date) = shifted {
      self.date = Some(date);
      self.reload();
    }
  }

  fn entries(&self) -> Vec<Entry<'_>> {
    let Some(board) = self.query.data() else {
      return Vec::new();
    };
    board
      .sections
      .iter()
      .flat_map(|section| {
        std::iter::once(Entry::Header(section))
          .chain(section.rows.iter().map(move |row| Entry::Match(section, row)))
      })
      .collect()
  }

  /// Replace a placeholder league name with the one from the payload
  fn sync_name(&mut self) {
    let loaded = self.query.data().and_then(|board| board.competition.clone());
    if let (Some((_, name)), Some(loaded)) = (self.competition.as_mut(), loaded) {
      *name = loaded;
    }
  }

  fn selected_section(&self) -> Option<(u64, String)> {
    let idx = self.list_state.selected()?;
    self
      .entries()
      .get(idx)
      .map(|entry| (entry.section().id, entry.section().name.clone()))
  }

  fn date_label(&self) -> String {
    match self.date {
      Some(date) => date.format("%a %d/%m/%Y").to_string(),
      None => "around today".to_string(),
    }
  }

  fn render_status(&self, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(
      format!(" {} ", self.date_label()),
      Style::default().fg(Color::White),
    )];

    if let Some(board) = self.query.data() {
      spans.push(Span::styled(
        format!(" last update {} ", format_clock(board.updated_at)),
        Style::default().fg(Color::DarkGray),
      ));
      if board.offline {
        spans.push(Span::styled(
          " offline: showing sample data ",
          Style::default().fg(Color::Black).bg(Color::Yellow),
        ));
      }
    }
    if self.query.is_loading() {
      spans.push(Span::styled(" loading... ", Style::default().fg(Color::Cyan)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let title = match &self.competition {
      Some((_, name)) => format!(" {} ", name),
      None => " Matches ".to_string(),
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let entries = self.entries();
    if entries.is_empty() {
      let content = match self.query.state() {
        QueryState::Loading | QueryState::Idle => "Loading matches...".to_string(),
        QueryState::Error(e) => format!("Failed to load matches: {}. Press 'r' to retry.", e),
        QueryState::Success(_) => "No matches for this selection.".to_string(),
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let len = entries.len();
    let items: Vec<ListItem> = entries.iter().map(entry_item).collect();

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

  fn handle_filter(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.tabs.handle_key(key) {
      KeyResult::Event(FilterTabsEvent::Changed(_)) => {
        self.reload();
        Some(ViewAction::None)
      }
      KeyResult::Handled => Some(ViewAction::None),
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
      KeyCode::Char('[') | KeyCode::Left => {
        self.shift_date(-1);
        Some(ViewAction::None)
      }
      KeyCode::Char(']') | KeyCode::Right => {
        self.shift_date(1);
        Some(ViewAction::None)
      }
      KeyCode::Char('t') => {
        self.date = None;
        self.reload();
        Some(ViewAction::None)
      }
      _ => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('r') => {
        self.query.refetch();
        Some(ViewAction::None)
      }
      KeyCode::Char('s') => {
        let (id, name) = <Self as View>::competition(self)?;
        Some(ViewAction::Push(Box::new(StandingsView::new(
          self.ctx.clone(),
          id,
          name,
        ))))
      }
      KeyCode::Enter if self.competition.is_none() => {
        let (id, name) = self.selected_section()?;
        Some(ViewAction::Push(Box::new(MatchesView::league(
          self.ctx.clone(),
          id,
          name,
          self.date,
        ))))
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

fn entry_item(entry: &Entry) -> ListItem<'static> {
  match entry {
    Entry::Header(section) => ListItem::new(Line::from(vec![
      Span::raw(format!("{} ", section.badge())),
      Span::styled(
        format!("{} ", section.country),
        Style::default().fg(Color::DarkGray),
      ),
      Span::styled(
        section.name.clone(),
        Style::default().fg(Color::Yellow).bold(),
      ),
    ])),
    Entry::Match(_, row) => ListItem::new(Line::from(vec![
      Span::raw("   "),
      Span::styled(
        format!("{:<6}", row.status_text()),
        Style::default().fg(status_color(row.status)),
      ),
      Span::raw(format!("{:>20}", truncate(&row.home, 20))),
      Span::styled(
        format!(" {:^7} ", row.score_text()),
        Style::default().fg(Color::White).bold(),
      ),
      Span::raw(truncate(&row.away, 20)),
    ])),
  }
}

impl View for MatchesView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_filter(key)
      .or_else(|| self.handle_navigation(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
      ])
      .split(area);

    self.tabs.render(frame, chunks[0]);
    self.render_status(frame, chunks[1]);
    self.render_list(frame, chunks[2]);
  }

  fn breadcrumb_label(&self) -> String {
    match &self.competition {
      Some((_, name)) => name.clone(),
      None => "Matches".to_string(),
    }
  }

  fn competition(&self) -> Option<(u64, String)> {
    self.competition.clone().or_else(|| self.selected_section())
  }

  fn context(&self) -> Option<String> {
    Some(format!("{} · {}", self.tabs.selected().label(), self.date_label()))
  }

  fn tick(&mut self) {
    if self.query.poll() {
      self.sync_name();
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("f", "filter").with_priority(20),
      ShortcutInfo::new("[/]", "day").with_priority(30),
      ShortcutInfo::new("t", "today").with_priority(35),
      ShortcutInfo::new("s", "standings").with_priority(40),
      ShortcutInfo::new("r", "refresh").with_priority(50),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

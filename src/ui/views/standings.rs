use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

use crate::cache::RequestScope;
use crate::football::api_types::TableRow;
use crate::query::{Query, QueryState};
use crate::scoreboard::StandingsTable;
use crate::ui::renderfns::{goal_difference_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::TeamsView;
use crate::ui::ViewContext;

/// League table of one competition
pub struct StandingsView {
  ctx: ViewContext,
  competition_id: u64,
  name: String,
  query: Query<StandingsTable>,
  table_state: TableState,
}

impl StandingsView {
  pub fn new(ctx: ViewContext, competition_id: u64, name: String) -> Self {
    let scoreboard = ctx.scoreboard.clone();
    let mut query = Query::new(move |scope: RequestScope| {
      let scoreboard = scoreboard.clone();
      async move {
        scoreboard
          .standings(competition_id, &scope)
          .await
          .map_err(|e| e.to_string())
      }
    })
    .with_refresh_interval(ctx.refresh_interval);

    query.fetch();

    Self {
      ctx,
      competition_id,
      name,
      query,
      table_state: TableState::default(),
    }
  }

  /// Take the competition name from the payload once it is loaded
  fn sync_name(&mut self) {
    if let Some(name) = self.query.data().and_then(|t| t.competition.clone()) {
      self.name = name;
    }
  }

  fn rows(&self) -> &[TableRow] {
    self.query.data().map(|t| t.rows.as_slice()).unwrap_or(&[])
  }

  fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let offline = self.query.data().is_some_and(|t| t.offline);
    let title = match self.query.state() {
      QueryState::Loading => format!(" Standings · {} (loading...) ", self.name),
      _ if offline => format!(" Standings · {} (offline sample) ", self.name),
      _ => format!(" Standings · {} ", self.name),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if self.rows().is_empty() {
      let content = match self.query.state() {
        QueryState::Error(e) => format!("Failed to load standings: {}. Press 'r' to retry.", e),
        QueryState::Success(_) => "No table published for this competition.".to_string(),
        _ => "Loading standings...".to_string(),
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let header = Row::new(["#", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts"])
      .style(Style::default().fg(Color::Yellow).bold());

    let rows: Vec<Row> = self
      .rows()
      .iter()
      .map(|row| {
        let team = row
          .team
          .short_name
          .clone()
          .or_else(|| row.team.name.clone())
          .unwrap_or_default();
        Row::new(vec![
          Cell::from(row.position.to_string()),
          Cell::from(truncate(&team, 24)),
          Cell::from(row.played_games.to_string()),
          Cell::from(row.won.to_string()),
          Cell::from(row.draw.to_string()),
          Cell::from(row.lost.to_string()),
          Cell::from(row.goals_for.to_string()),
          Cell::from(row.goals_against.to_string()),
          Cell::from(format!("{:+}", row.goal_difference))
            .style(Style::default().fg(goal_difference_color(row.goal_difference))),
          Cell::from(row.points.to_string()).style(Style::default().bold()),
        ])
      })
      .collect();

    let widths = [
      Constraint::Length(3),
      Constraint::Min(16),
      Constraint::Length(3),
      Constraint::Length(3),
      Constraint::Length(3),
      Constraint::Length(3),
      Constraint::Length(4),
      Constraint::Length(4),
      Constraint::Length(4),
      Constraint::Length(4),
    ];

    let table = Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }
}

impl View for StandingsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('T') => {
        return ViewAction::Push(Box::new(TeamsView::new(
          self.ctx.clone(),
          self.competition_id,
          self.name.clone(),
        )))
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_table(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    format!("Standings [{}]", self.name)
  }

  fn competition(&self) -> Option<(u64, String)> {
    Some((self.competition_id, self.name.clone()))
  }

  fn context(&self) -> Option<String> {
    Some(self.name.clone())
  }

  fn tick(&mut self) {
    if self.query.poll() {
      self.sync_name();
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("T", "teams").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

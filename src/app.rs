use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::football::FootballData;
use crate::scoreboard::{MatchFilter, Scoreboard};
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{LeaguesView, MatchesView, StandingsView, TeamsView};
use crate::ui::ViewContext;
use chrono::NaiveDate;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{debug, info};

const TICK_RATE: Duration = Duration::from_millis(250);

/// What the first screen shows, taken from the command line
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
  pub league: Option<u64>,
  pub date: Option<NaiveDate>,
  pub filter: Option<MatchFilter>,
}

/// Main application state
pub struct App {
  /// Navigation stack, root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Command palette opened with `:`
  command_input: CommandInput,

  /// Handles shared with every view
  ctx: ViewContext,

  api_url: String,

  /// One-shot message shown in the footer until the next key press
  status: Option<String>,

  should_quit: bool,
}

impl App {
  pub fn new(mut config: Config, start: StartOptions) -> Result<Self> {
    if let Some(filter) = start.filter {
      config.default_filter = filter;
    }

    let data = FootballData::new(&config)?;
    let scoreboard = Scoreboard::new(data, &config);
    let ctx = ViewContext::new(scoreboard, &config);

    let root: Box<dyn View> = match start.league {
      Some(id) => Box::new(MatchesView::league(
        ctx.clone(),
        id,
        format!("League {}", id),
        start.date,
      )),
      None => Box::new(MatchesView::overview(ctx.clone(), start.date, ctx.default_filter)),
    };

    Ok(Self {
      view_stack: vec![root],
      command_input: CommandInput::new(),
      ctx,
      api_url: config.api.url.clone(),
      status: None,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = self.event_loop().await;

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        Some(Event::Resize) => {}
        None => break,
      }
    }

    info!("shutting down");
    Ok(())
  }

  fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| v.as_ref())
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
      ])
      .split(frame.area());

    let mode = self.ctx.scoreboard.data().mode();
    let (context, shortcuts) = self
      .current_view()
      .map(|v| (v.context(), v.shortcuts()))
      .unwrap_or_default();
    draw_header(
      frame,
      chunks[0],
      &self.api_url,
      mode,
      context.as_deref(),
      &shortcuts,
    );

    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, chunks[1]);
    }

    let breadcrumb: Vec<String> = self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect();
    draw_footer(frame, chunks[2], &breadcrumb, self.status.as_deref());

    self.command_input.render_overlay(frame, chunks[1]);
  }

  /// Poll the visible view; views below it wait until they are shown again
  fn tick(&mut self) {
    if let Some(view) = self.view_stack.last_mut() {
      view.tick();
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    self.status = None;

    let capturing = self.current_view().is_some_and(|v| v.is_capturing_input());
    if !capturing || self.command_input.is_active() {
      match self.command_input.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  /// Replace the whole stack with a new root view
  fn set_root(&mut self, view: Box<dyn View>) {
    self.view_stack.clear();
    self.view_stack.push(view);
  }

  fn execute_command(&mut self, cmd: &str) {
    debug!(command = cmd, "executing command");
    match cmd {
      "matches" => self.set_root(Box::new(MatchesView::overview(
        self.ctx.clone(),
        None,
        self.ctx.default_filter,
      ))),
      "leagues" => self.set_root(Box::new(LeaguesView::new(self.ctx.clone()))),
      "standings" | "teams" => {
        let Some((id, name)) = self.current_view().and_then(|v| v.competition()) else {
          self.status = Some("Select a competition first".to_string());
          return;
        };
        let view: Box<dyn View> = if cmd == "standings" {
          Box::new(StandingsView::new(self.ctx.clone(), id, name))
        } else {
          Box::new(TeamsView::new(self.ctx.clone(), id, name))
        };
        self.view_stack.push(view);
      }
      "quit" => self.should_quit = true,
      "" => {}
      other => self.status = Some(format!("Unknown command: {}", other)),
    }
  }
}

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Terminal was resized, redraw
  Resize,
  /// Periodic tick for query polling and auto refresh
  Tick,
}

/// Produces events from terminal input and a tick timer
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // crossterm polling blocks, keep it off the async workers
    tokio::task::spawn_blocking(move || loop {
      let next = match event::poll(tick_rate) {
        Ok(true) => match event::read() {
          Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
          Ok(CrosstermEvent::Resize(_, _)) => Some(Event::Resize),
          Ok(_) => None,
          Err(e) => {
            debug!(error = %e, "failed to read terminal event");
            None
          }
        },
        Ok(false) => Some(Event::Tick),
        Err(e) => {
          debug!(error = %e, "failed to poll terminal");
          Some(Event::Tick)
        }
      };

      if let Some(evt) = next {
        if tx.send(evt).is_err() {
          break;
        }
      }
    });

    Self { rx }
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// When a shortcut should be shown in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortcutVisibility {
  #[default]
  Always,
  /// Only listed in help, not in the header
  WhenActive,
}

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub visibility: ShortcutVisibility,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      visibility: ShortcutVisibility::Always,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }

  pub const fn when_active(mut self) -> Self {
    self.visibility = ShortcutVisibility::WhenActive;
    self
  }
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
}

/// Trait for view behavior
///
/// Views own their queries and input components and return actions for the
/// App to execute: App → View → Components.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Competition this view is about, used by `:standings` and `:teams`
  fn competition(&self) -> Option<(u64, String)> {
    None
  }

  /// Short context for the header (competition name, selected date, ...)
  fn context(&self) -> Option<String> {
    None
  }

  /// Whether a text input inside the view currently owns the keyboard
  fn is_capturing_input(&self) -> bool {
    false
  }

  /// Called on each tick to poll async queries
  fn tick(&mut self) {}

  /// Get keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

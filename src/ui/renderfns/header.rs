use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::policy::Mode;
use crate::ui::view::{ShortcutInfo, ShortcutVisibility};

/// Draw the header bar with logo, data source, context, and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  api_url: &str,
  mode: Mode,
  context: Option<&str>,
  shortcuts: &[ShortcutInfo],
) {
  let mut spans = vec![
    Span::styled(" scoreline ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", extract_host(api_url)),
      Style::default().fg(Color::White),
    ),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
  ];

  spans.push(match mode {
    Mode::Normal => Span::styled(" online ", Style::default().fg(Color::Green)),
    Mode::Degraded => Span::styled(" offline ", Style::default().fg(Color::Black).bg(Color::Yellow)),
  });

  if let Some(context) = context {
    spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(
      format!(" {} ", context),
      Style::default().fg(Color::Yellow).bold(),
    ));
  }

  spans.push(Span::raw(" "));

  let mut visible: Vec<&ShortcutInfo> = shortcuts
    .iter()
    .filter(|s| s.visibility == ShortcutVisibility::Always)
    .collect();
  visible.sort_by_key(|s| s.priority);

  for shortcut in visible {
    // Keys and brackets highlighted, descriptions dimmed
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Host (and port) of the API URL
fn extract_host(url: &str) -> &str {
  let rest = url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url);
  rest.split('/').next().unwrap_or(rest)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extract_host() {
    assert_eq!(
      extract_host("https://api.football-data.org/v4"),
      "api.football-data.org"
    );
    assert_eq!(
      extract_host("http://localhost:5173/api/football/v4"),
      "localhost:5173"
    );
    assert_eq!(extract_host("example.org"), "example.org");
  }
}

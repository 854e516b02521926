/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "matches",
    aliases: &["m", "scores", "overview"],
    description: "Scores of the popular leagues",
  },
  Command {
    name: "leagues",
    aliases: &["l", "competitions", "c"],
    description: "Pick a competition",
  },
  Command {
    name: "standings",
    aliases: &["s", "table"],
    description: "League table of the current competition",
  },
  Command {
    name: "teams",
    aliases: &["t", "squads"],
    description: "Teams of the current competition",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit scoreline",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| match_rank(cmd, &input_lower).map(|rank| (cmd, rank)))
    .collect();

  // Stable sort keeps declaration order within a rank
  matches.sort_by_key(|(_, rank)| *rank);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Lower is better. None when the command does not match at all.
fn match_rank(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

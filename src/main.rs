mod app;
mod cache;
mod commands;
mod config;
mod event;
mod football;
mod logging;
mod policy;
mod query;
mod scoreboard;
mod ui;

use chrono::NaiveDate;
use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

use crate::scoreboard::MatchFilter;

#[derive(Parser, Debug)]
#[command(name = "scoreline")]
#[command(about = "Live football scores in your terminal, powered by football-data.org")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./scoreline.yaml or $XDG_CONFIG_HOME/scoreline/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Open a single competition by id instead of the overview (e.g. 2021)
  #[arg(short, long)]
  league: Option<u64>,

  /// Show matches of this day (YYYY-MM-DD) instead of the window around today
  #[arg(short, long)]
  date: Option<NaiveDate>,

  /// Initial match filter
  #[arg(short, long, value_enum)]
  filter: Option<MatchFilter>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Keep the guard alive so buffered log lines are flushed on exit
  let _log_guard = logging::init()?;

  let config = config::Config::load(args.config.as_deref())?;
  info!(api = %config.api.url, "starting scoreline");

  let start = app::StartOptions {
    league: args.league,
    date: args.date,
    filter: args.filter,
  };

  let mut app = app::App::new(config, start)?;
  app.run().await?;

  Ok(())
}

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_ENV: &str = "SCORELINE_LOG";
const LOG_FILE: &str = "scoreline.log";

/// Directory holding the log file: $XDG_DATA_HOME/scoreline
pub fn log_dir() -> Option<PathBuf> {
  dirs::data_dir().map(|dir| dir.join("scoreline"))
}

/// Initialize tracing to a log file, since the terminal belongs to the TUI.
///
/// The returned guard flushes buffered lines on drop and must be kept alive
/// for the lifetime of the program.
pub fn init() -> Result<WorkerGuard> {
  let dir = log_dir().ok_or_else(|| eyre!("Could not determine data directory"))?;
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::registry()
    .with(EnvFilter::new(
      std::env::var(LOG_ENV).unwrap_or_else(|_| "info".into()),
    ))
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false),
    )
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}

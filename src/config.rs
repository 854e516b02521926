use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::scoreboard::MatchFilter;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  /// Competitions shown in the overview, in display order
  pub leagues: LeaguesConfig,
  pub cache: CacheConfig,
  pub backoff: BackoffConfig,
  pub degradation: DegradationConfig,
  pub refresh: RefreshConfig,
  /// Filter applied when the match list opens
  pub default_filter: MatchFilter,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// API root, e.g. https://api.football-data.org/v4 or a local proxy
  pub url: String,
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: "https://api.football-data.org/v4".to_string(),
      timeout_secs: 15,
    }
  }
}

impl ApiConfig {
  /// Parsed API root with a trailing slash, so relative paths join below it.
  pub fn base_url(&self) -> Result<Url> {
    let mut raw = self.url.trim().to_string();
    if !raw.ends_with('/') {
      raw.push('/');
    }
    Url::parse(&raw).map_err(|e| eyre!("Invalid API url {}: {}", self.url, e))
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeaguesConfig {
  /// Competition ids loaded in the overview and listed first
  pub popular: Vec<u64>,
  /// Maximum matches per league in the overview
  pub overview_limit: usize,
  /// Pause between consecutive network requests in the overview
  pub request_spacing_secs: u64,
}

impl Default for LeaguesConfig {
  fn default() -> Self {
    Self {
      popular: vec![2021, 2014],
      overview_limit: 5,
      request_spacing_secs: 5,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// How long a fetched payload is served without refetching
  pub freshness_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      freshness_secs: 300,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
  pub base_delay_secs: u64,
  /// Total attempts for a throttled request, including the first
  pub max_attempts: u32,
}

impl Default for BackoffConfig {
  fn default() -> Self {
    Self {
      base_delay_secs: 5,
      max_attempts: 3,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DegradationConfig {
  /// Consecutive failures before switching to sample data
  pub threshold: u32,
  /// Seconds to wait while offline before probing the network again.
  /// 0 disables probing.
  pub probe_interval_secs: u64,
}

impl Default for DegradationConfig {
  fn default() -> Self {
    Self {
      threshold: 3,
      probe_interval_secs: 60,
    }
  }
}

impl DegradationConfig {
  pub fn probe_interval(&self) -> Option<Duration> {
    (self.probe_interval_secs > 0).then(|| Duration::from_secs(self.probe_interval_secs))
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
  /// Seconds between automatic reloads of the visible view. 0 disables.
  pub interval_secs: u64,
}

impl Default for RefreshConfig {
  fn default() -> Self {
    Self { interval_secs: 30 }
  }
}

impl RefreshConfig {
  pub fn interval(&self) -> Option<Duration> {
    (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./scoreline.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/scoreline/config.yaml
  ///
  /// Every setting has a default, so running without a file is fine.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("scoreline.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("scoreline").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the football-data.org API token from environment variables.
  ///
  /// Checks SCORELINE_API_TOKEN first, then FOOTBALL_DATA_API_KEY as fallback.
  pub fn get_api_token() -> Option<String> {
    ["SCORELINE_API_TOKEN", "FOOTBALL_DATA_API_KEY"]
      .iter()
      .filter_map(|name| std::env::var(name).ok())
      .find(|token| !token.trim().is_empty())
  }
}

//! Layered runtime configuration: an optional TOML file overridden by
//! `DAIRY_`-prefixed environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use dairy_core::LedgerConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub store_path: PathBuf,
  pub host:       String,
  pub port:       u16,
  pub ledger:     LedgerConfig,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("~/.local/share/dairy/ledger.db"),
      host:       "127.0.0.1".to_string(),
      port:       8080,
      ledger:     LedgerConfig::default(),
    }
  }
}

impl AppConfig {
  /// Read `path` (if it exists) and apply environment overrides.
  ///
  /// Nested keys use a double underscore, e.g.
  /// `DAIRY_LEDGER__DASHBOARD_LIMIT=10`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("DAIRY")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise configuration")
  }

  /// The store path with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

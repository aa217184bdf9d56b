//! `dairy` — bookkeeping for a milk delivery round.
//!
//! Every subcommand opens the SQLite store named in the config, performs one
//! ledger operation and prints the result. `serve` exposes the same
//! operations as a JSON API instead.
//!
//! # Usage
//!
//! ```
//! dairy customers add --name Asha --phone 555-0100 --daily-qty 1.5 --rate 48
//! dairy deliveries record --customer <id> --quantity 0.5
//! dairy dashboard
//! dairy --config ~/.config/dairy/dairy.toml serve
//! ```

mod commands;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use dairy_api::AppState;
use dairy_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{commands::Command, settings::AppConfig};

#[derive(Parser, Debug)]
#[command(name = "dairy", author, version, about = "Dairy delivery ledger")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "dairy.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so command output stays pipeable.
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = AppConfig::load(&cli.config)?;

  let store_path = cfg.resolved_store_path();
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );
  tracing::debug!(path = %store_path.display(), "store opened");

  let state = AppState::new(Arc::clone(&store), store, cfg.ledger.clone());
  commands::run(cli.command, state, &cfg).await
}

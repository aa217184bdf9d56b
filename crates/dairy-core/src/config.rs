//! Runtime knobs shared by the ledger components.

use std::time::Duration;

use serde::Deserialize;

/// Ledger configuration, deserialised from the `[ledger]` table of the
/// binary's config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
  /// How many of the most recent records of each kind the dashboard shows.
  pub dashboard_limit:       usize,
  /// Reject deliveries and payments whose customer id does not resolve.
  pub enforce_customer_refs: bool,
  /// Upper bound on any single store call, in seconds. `0` disables it.
  pub store_timeout_secs:    u64,
}

impl Default for LedgerConfig {
  fn default() -> Self {
    Self {
      dashboard_limit:       5,
      enforce_customer_refs: false,
      store_timeout_secs:    10,
    }
  }
}

impl LedgerConfig {
  pub fn store_timeout(&self) -> Option<Duration> {
    (self.store_timeout_secs > 0).then(|| Duration::from_secs(self.store_timeout_secs))
  }
}

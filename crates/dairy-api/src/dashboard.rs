//! Handler for `GET /dashboard`.

use axum::{Json, extract::State};
use dairy_core::{
  dashboard::{Summary, SummaryCounts},
  store::{DocumentStore, IdentityProvider},
};
use serde::Serialize;

use crate::{AppState, error::ApiError};

/// Response body: per-section counts alongside the newest records.
#[derive(Debug, Serialize)]
pub struct DashboardBody {
  pub counts:  SummaryCounts,
  #[serde(flatten)]
  pub summary: Summary,
}

/// `GET /dashboard` — the newest customers, deliveries and payments.
///
/// Fails as a whole if any of the three reads fails.
pub async fn handler<S, I>(State(state): State<AppState<S, I>>) -> Result<Json<DashboardBody>, ApiError>
where
  S: DocumentStore,
  I: IdentityProvider,
{
  let summary = state.ledger.dashboard.summarize().await?;
  Ok(Json(DashboardBody { counts: summary.counts(), summary }))
}

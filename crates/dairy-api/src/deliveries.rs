//! Handlers for `/deliveries` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/deliveries` | Newest first; optional `?limit=n` |
//! | `POST` | `/deliveries` | Body: [`NewDelivery`]; omitted `quantity`/`rate` use the customer's defaults |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use dairy_core::{
  delivery::{Delivery, NewDelivery},
  store::{DocumentStore, IdentityProvider},
};

use crate::{AppState, ListParams, error::ApiError};

/// `GET /deliveries[?limit=<n>]`
pub async fn list<S, I>(
  State(state): State<AppState<S, I>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Delivery>>, ApiError>
where
  S: DocumentStore,
  I: IdentityProvider,
{
  let recorder = &state.ledger.deliveries;
  let deliveries = match params.limit {
    Some(limit) => recorder.recent(limit).await?,
    None => recorder.list_deliveries().await?,
  };
  Ok(Json(deliveries))
}

/// `POST /deliveries`
pub async fn create<S, I>(
  State(state): State<AppState<S, I>>,
  Json(body): Json<NewDelivery>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
  I: IdentityProvider,
{
  let delivery = state.ledger.deliveries.record_delivery(body).await?;
  Ok((StatusCode::CREATED, Json(delivery)))
}

//! Handlers for `/payments` endpoints.

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use dairy_core::{
  payment::{NewPayment, Payment},
  store::{DocumentStore, IdentityProvider},
};

use crate::{AppState, ListParams, error::ApiError};

/// `GET /payments[?limit=<n>]`
pub async fn list<S, I>(
  State(state): State<AppState<S, I>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Payment>>, ApiError>
where
  S: DocumentStore,
  I: IdentityProvider,
{
  let ledger = &state.ledger.payments;
  let payments = match params.limit {
    Some(limit) => ledger.recent(limit).await?,
    None => ledger.list_payments().await?,
  };
  Ok(Json(payments))
}

/// `POST /payments` — body: `{"customer_id":"...","amount_paid":"200","notes":"cash"}`
pub async fn create<S, I>(
  State(state): State<AppState<S, I>>,
  Json(body): Json<NewPayment>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
  I: IdentityProvider,
{
  let payment = state.ledger.payments.record_payment(body).await?;
  Ok((StatusCode::CREATED, Json(payment)))
}

//! Handlers for `/customers` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/customers` | Newest first; optional `?limit=n` |
//! | `POST` | `/customers` | Body: [`NewCustomer`]; returns 201 + stored customer |
//! | `GET`  | `/customers/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use dairy_core::{
  customer::{Customer, CustomerId, NewCustomer},
  store::{DocumentStore, IdentityProvider},
};

use crate::{AppState, ListParams, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /customers[?limit=<n>]`
pub async fn list<S, I>(
  State(state): State<AppState<S, I>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Customer>>, ApiError>
where
  S: DocumentStore,
  I: IdentityProvider,
{
  let registry = &state.ledger.customers;
  let customers = match params.limit {
    Some(limit) => registry.recent(limit).await?,
    None => registry.list_customers().await?,
  };
  Ok(Json(customers))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /customers`
pub async fn create<S, I>(
  State(state): State<AppState<S, I>>,
  Json(body): Json<NewCustomer>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
  I: IdentityProvider,
{
  let customer = state.ledger.customers.add_customer(body).await?;
  Ok((StatusCode::CREATED, Json(customer)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /customers/:id`
pub async fn get_one<S, I>(
  State(state): State<AppState<S, I>>,
  Path(id): Path<CustomerId>,
) -> Result<Json<Customer>, ApiError>
where
  S: DocumentStore,
  I: IdentityProvider,
{
  let customer = state
    .ledger
    .customers
    .get_customer(&id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("customer {id} not found")))?;
  Ok(Json(customer))
}

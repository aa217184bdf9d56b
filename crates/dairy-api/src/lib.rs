//! JSON REST API for the dairy ledger.
//!
//! Exposes an axum [`Router`] backed by any [`DocumentStore`] and
//! [`IdentityProvider`]. TLS, sessions and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", dairy_api::api_router(state))
//! ```

pub mod accounts;
pub mod customers;
pub mod dashboard;
pub mod deliveries;
pub mod error;
pub mod payments;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use dairy_core::{
  Ledger, LedgerConfig,
  account::AccountDirectory,
  store::{DocumentStore, IdentityProvider},
};
use serde::Deserialize;

pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, I> {
  pub ledger:   Ledger<S>,
  pub accounts: AccountDirectory<S, I>,
}

impl<S, I> Clone for AppState<S, I> {
  fn clone(&self) -> Self {
    Self {
      ledger:   self.ledger.clone(),
      accounts: self.accounts.clone(),
    }
  }
}

impl<S, I> AppState<S, I>
where
  S: DocumentStore,
  I: IdentityProvider,
{
  pub fn new(store: Arc<S>, identity: Arc<I>, config: LedgerConfig) -> Self {
    Self {
      ledger:   Ledger::new(Arc::clone(&store), config.clone()),
      accounts: AccountDirectory::new(store, identity, config),
    }
  }
}

/// Query string accepted by the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  /// Return only the newest `limit` records.
  pub limit: Option<usize>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, I>(state: AppState<S, I>) -> Router<()>
where
  S: DocumentStore + 'static,
  I: IdentityProvider + 'static,
{
  Router::new()
    // Accounts
    .route("/accounts", post(accounts::sign_up::<S, I>))
    .route("/accounts/login", post(accounts::log_in::<S, I>))
    // Customers
    .route("/customers", get(customers::list::<S, I>).post(customers::create::<S, I>))
    .route("/customers/{id}", get(customers::get_one::<S, I>))
    // Ledgers
    .route("/deliveries", get(deliveries::list::<S, I>).post(deliveries::create::<S, I>))
    .route("/payments", get(payments::list::<S, I>).post(payments::create::<S, I>))
    .route("/dashboard", get(dashboard::handler::<S, I>))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use dairy_store_sqlite::SqliteStore;
  use rust_decimal::Decimal;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  async fn make_state() -> AppState<SqliteStore, SqliteStore> {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    AppState::new(Arc::clone(&store), store, LedgerConfig::default())
  }

  async fn send(
    state:  &AppState<SqliteStore, SqliteStore>,
    method: &str,
    uri:    &str,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(b) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(b.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let resp   = api_router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes  = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value  = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
  }

  fn decimal(v: &Value) -> Decimal { serde_json::from_value(v.clone()).unwrap() }

  // ── Customers ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_then_fetch_customer() {
    let state = make_state().await;
    let (status, created) = send(
      &state,
      "POST",
      "/customers",
      Some(json!({ "name": "Asha", "phone": "555-0100", "daily_qty": "1.5", "rate_per_ltr": "48" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["payment_cycle"], "weekly");

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = send(&state, "GET", &format!("/customers/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (_, listed) = send(&state, "GET", "/customers", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn invalid_customer_is_bad_request() {
    let state = make_state().await;
    let (status, body) = send(
      &state,
      "POST",
      "/customers",
      Some(json!({ "name": "Asha", "phone": "555-0100", "daily_qty": "0", "rate_per_ltr": "48" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("daily quantity"));

    let (_, listed) = send(&state, "GET", "/customers", None).await;
    assert!(listed.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn unknown_customer_is_not_found() {
    let state = make_state().await;
    let (status, _) = send(&state, "GET", "/customers/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn limit_returns_newest() {
    let state = make_state().await;
    for name in ["a", "b", "c"] {
      send(
        &state,
        "POST",
        "/customers",
        Some(json!({ "name": name, "phone": "555", "daily_qty": "1", "rate_per_ltr": "40" })),
      )
      .await;
    }
    let (_, listed) = send(&state, "GET", "/customers?limit=2", None).await;
    let names: Vec<_> = listed.as_array().unwrap().iter().map(|c| c["name"].clone()).collect();
    assert_eq!(names, [json!("c"), json!("b")]);
  }

  // ── Deliveries & payments ───────────────────────────────────────────────────

  #[tokio::test]
  async fn delivery_amount_is_snapshotted() {
    let state = make_state().await;
    let (status, delivery) = send(
      &state,
      "POST",
      "/deliveries",
      Some(json!({ "customer_id": "cust-1", "quantity": "0.5", "rate": "45.0" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&delivery["amount"]), Decimal::new(225, 1));

    let (_, listed) = send(&state, "GET", "/deliveries", None).await;
    assert_eq!(listed[0]["id"], delivery["id"]);
  }

  #[tokio::test]
  async fn payment_without_amount_is_rejected() {
    let state = make_state().await;
    let (status, _) = send(&state, "POST", "/payments", Some(json!({ "customer_id": "cust-1" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, payment) = send(
      &state,
      "POST",
      "/payments",
      Some(json!({ "customer_id": "cust-1", "amount_paid": "200", "notes": "cash" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payment["notes"], "cash");
  }

  #[tokio::test]
  async fn dashboard_caps_each_section() {
    let state = make_state().await;
    for _ in 0..7 {
      send(&state, "POST", "/payments", Some(json!({ "customer_id": "c", "amount_paid": "10" }))).await;
    }
    let (status, summary) = send(&state, "GET", "/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["payments"].as_array().unwrap().len(), 5);
    assert_eq!(summary["counts"]["payments"], 5);
    assert_eq!(summary["counts"]["customers"], 0);
    assert!(summary["customers"].as_array().unwrap().is_empty());
    assert!(summary["deliveries"].as_array().unwrap().is_empty());
  }

  // ── Accounts ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn sign_up_then_log_in() {
    let state = make_state().await;
    let (status, user) = send(
      &state,
      "POST",
      "/accounts",
      Some(json!({ "email": "seller@example.com", "password": "pw", "role": "milk_seller" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "milk_seller");

    let (status, logged_in) = send(
      &state,
      "POST",
      "/accounts/login",
      Some(json!({ "email": "seller@example.com", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logged_in["id"], user["id"]);

    let (status, _) = send(
      &state,
      "POST",
      "/accounts/login",
      Some(json!({ "email": "seller@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn sign_up_defaults_to_getter() {
    let state = make_state().await;
    let (_, user) = send(
      &state,
      "POST",
      "/accounts",
      Some(json!({ "email": "getter@example.com", "password": "pw" })),
    )
    .await;
    assert_eq!(user["role"], "milk_getter");
  }
}

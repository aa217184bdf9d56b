//! Handlers for `/accounts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/accounts` | Body: [`SignUp`]; `role` defaults to `milk_getter` |
//! | `POST` | `/accounts/login` | Body: [`LogInBody`]; 401 on bad credentials |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use dairy_core::{
  account::{SignUp, User},
  store::{DocumentStore, IdentityProvider},
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// `POST /accounts`
pub async fn sign_up<S, I>(
  State(state): State<AppState<S, I>>,
  Json(body): Json<SignUp>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
  I: IdentityProvider,
{
  let user = state.accounts.sign_up(body).await?;
  Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
pub struct LogInBody {
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub password: String,
}

/// `POST /accounts/login`
pub async fn log_in<S, I>(
  State(state): State<AppState<S, I>>,
  Json(body): Json<LogInBody>,
) -> Result<Json<User>, ApiError>
where
  S: DocumentStore,
  I: IdentityProvider,
{
  let user = state.accounts.log_in(&body.email, &body.password).await?;
  Ok(Json(user))
}

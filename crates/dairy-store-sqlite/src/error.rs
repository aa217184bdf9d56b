//! Error type for `dairy-store-sqlite`.

use dairy_core::document::{Collection, DocumentId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("document {id} already exists in {collection}")]
  DuplicateId { collection: Collection, id: DocumentId },

  /// A stored row whose payload is not a JSON object.
  #[error("corrupt {collection} document {id}")]
  Corrupt { collection: Collection, id: DocumentId },

  #[error("an account already exists for {0}")]
  EmailTaken(String),

  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("password hashing failed: {0}")]
  PasswordHash(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

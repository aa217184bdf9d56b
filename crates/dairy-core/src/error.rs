//! Error types for `dairy-core`.

use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
  account::UserId,
  customer::CustomerId,
  document::{Collection, DocumentId},
};

/// Every failure a ledger operation can report to its caller.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error(transparent)]
  Backend(#[from] BackendError),

  /// The identity provider refused the sign-up or the credentials.
  #[error("authentication failed: {0}")]
  Auth(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("no account profile for user {0}")]
  AccountNotFound(UserId),
}

impl Error {
  pub fn is_validation(&self) -> bool { matches!(self, Self::Validation(_)) }
}

/// Caller-correctable input problems. A write that fails validation never
/// reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("{0} is required")]
  Missing(&'static str),

  #[error("{field} must be greater than zero, got {value}")]
  NotPositive { field: &'static str, value: Decimal },

  #[error("{field} is not a valid decimal number: {input:?}")]
  Malformed { field: &'static str, input: String },

  #[error("{0} is outside the supported decimal range")]
  Overflow(&'static str),

  #[error("customer {0} does not exist")]
  UnknownCustomer(CustomerId),
}

/// Failures of the document store or of the data it returned.
#[derive(Debug, Error)]
pub enum BackendError {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store call timed out after {0:?}")]
  Timeout(Duration),

  #[error("malformed {collection} document {id}: {reason}")]
  Malformed {
    collection: Collection,
    id:         DocumentId,
    reason:     String,
  },

  #[error("could not encode {collection} document: {source}")]
  Encode {
    collection: Collection,
    #[source]
    source:     serde_json::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

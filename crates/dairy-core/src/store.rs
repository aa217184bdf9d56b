//! The `DocumentStore` and `IdentityProvider` traits.
//!
//! Both are implemented by backends (e.g. `dairy-store-sqlite`). The ledger
//! components take them as injected dependencies and never reach for a
//! process-wide client.

use std::{future::Future, time::Duration};

use crate::{
  account::UserId,
  document::{Collection, Document, DocumentId, Fields, Inserted, Query},
  error::BackendError,
};

// ─── Document store ──────────────────────────────────────────────────────────

/// Abstraction over a schemaless, per-collection document store.
///
/// Documents are append-only from the ledger's point of view: there is no
/// update or delete operation.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `fields` under a freshly generated id.
  ///
  /// The store writes its own timestamp into `stamp_field`, overwriting any
  /// value the caller supplied, and returns it alongside the id.
  fn insert(
    &self,
    collection: Collection,
    fields: Fields,
    stamp_field: &'static str,
  ) -> impl Future<Output = Result<Inserted, Self::Error>> + Send + '_;

  /// Persist `fields` under a caller-supplied id. Returns an error if the id
  /// is already taken in `collection`.
  fn insert_with_id(
    &self,
    collection: Collection,
    id: DocumentId,
    fields: Fields,
    stamp_field: &'static str,
  ) -> impl Future<Output = Result<Inserted, Self::Error>> + Send + '_;

  /// Retrieve a single document. Returns `None` if not found.
  fn get(
    &self,
    collection: Collection,
    id: DocumentId,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// Return documents of `query.collection` ordered by `query.order_by`
  /// descending, truncated to `query.limit` when set.
  fn query_ordered_desc<'a>(
    &'a self,
    query: &'a Query,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + 'a;
}

// ─── Identity provider ───────────────────────────────────────────────────────

/// Delegated credential issuance and verification.
///
/// The ledger only ever sees the resulting opaque [`UserId`]; how passwords
/// are stored or checked is entirely the provider's business.
pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Register a new email/password pair and return the issued user id.
  fn create_account<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<UserId, Self::Error>> + Send + 'a;

  /// Check a credential pair and return the matching user id.
  fn verify<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<UserId, Self::Error>> + Send + 'a;

  /// Delete the credentials issued under `user_id`. Removing an unknown id
  /// is not an error.
  fn remove_account<'a>(
    &'a self,
    user_id: &'a UserId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Call helper ─────────────────────────────────────────────────────────────

/// Await a store future, bounding it by `timeout` when set, and box the
/// backend's own error into a [`BackendError`].
pub(crate) async fn call<T, E, F>(timeout: Option<Duration>, fut: F) -> Result<T, BackendError>
where
  F: Future<Output = Result<T, E>>,
  E: std::error::Error + Send + Sync + 'static,
{
  let result = match timeout {
    Some(limit) => tokio::time::timeout(limit, fut)
      .await
      .map_err(|_| BackendError::Timeout(limit))?,
    None => fut.await,
  };
  result.map_err(|e| BackendError::Store(Box::new(e)))
}

#[cfg(test)]
mod tests {
  use std::{convert::Infallible, io};

  use super::*;

  #[tokio::test]
  async fn call_passes_through_success() {
    let out = call(None, async { Ok::<_, Infallible>(7) }).await.unwrap();
    assert_eq!(out, 7);
  }

  #[tokio::test]
  async fn call_boxes_backend_errors() {
    let err = call(None, async { Err::<(), _>(io::Error::other("disk on fire")) })
      .await
      .unwrap_err();
    assert!(matches!(err, BackendError::Store(_)));
    assert!(err.to_string().contains("disk on fire"));
  }

  #[tokio::test(start_paused = true)]
  async fn call_times_out() {
    let limit = Duration::from_millis(50);
    let err = call(Some(limit), async {
      tokio::time::sleep(Duration::from_secs(60)).await;
      Ok::<_, Infallible>(())
    })
    .await
    .unwrap_err();
    assert!(matches!(err, BackendError::Timeout(d) if d == limit));
  }
}

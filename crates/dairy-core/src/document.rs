//! Schemaless documents — the unit the [`DocumentStore`] reads and writes.
//!
//! Each component owns the mapping between its typed records and the flat
//! JSON field maps stored here. Timestamps written by the store are RFC 3339
//! strings with a fixed microsecond precision, so they order correctly as
//! plain strings.
//!
//! [`DocumentStore`]: crate::store::DocumentStore

use std::fmt;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::BackendError;

/// A document's field map.
pub type Fields = serde_json::Map<String, Value>;

// ─── Collections ─────────────────────────────────────────────────────────────

/// The four collections the ledger persists into.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::AsRefStr,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Collection {
  Users,
  Customers,
  Deliveries,
  Payments,
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// An opaque, store-generated document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  /// A fresh random id, used by stores that generate their own keys.
  pub fn generate() -> Self { Self(uuid::Uuid::new_v4().simple().to_string()) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for DocumentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// A stored document as returned by a read.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
  pub collection: Collection,
  pub id:         DocumentId,
  pub fields:     Fields,
}

impl Document {
  /// Deserialise the field map into a typed record.
  pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BackendError> {
    serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
      BackendError::Malformed {
        collection: self.collection,
        id:         self.id.clone(),
        reason:     e.to_string(),
      }
    })
  }
}

/// Serialise a typed record into a field map for `collection`.
pub fn encode<T: Serialize>(collection: Collection, record: &T) -> Result<Fields, BackendError> {
  match serde_json::to_value(record) {
    Ok(Value::Object(fields)) => Ok(fields),
    Ok(other) => Err(BackendError::Encode {
      collection,
      source: serde::ser::Error::custom(format!("expected a JSON object, got {other}")),
    }),
    Err(source) => Err(BackendError::Encode { collection, source }),
  }
}

/// The result of a successful insert: the id the store assigned and the
/// server timestamp it wrote into the stamp field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inserted {
  pub id:         DocumentId,
  pub stamped_at: DateTime<Utc>,
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Parameters for [`DocumentStore::query_ordered_desc`].
///
/// Results are ordered by `order_by` descending; documents with equal sort
/// values come back most-recently-inserted first.
///
/// [`DocumentStore::query_ordered_desc`]: crate::store::DocumentStore::query_ordered_desc
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
  pub collection: Collection,
  pub order_by:   &'static str,
  pub limit:      Option<usize>,
}

impl Query {
  pub fn newest_first(collection: Collection, order_by: &'static str) -> Self {
    Self { collection, order_by, limit: None }
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }
}

// ─── Server timestamps ───────────────────────────────────────────────────────

/// The current time at the precision stores persist, so a stamp returned
/// from an insert compares equal to the same stamp read back later.
pub fn server_now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

/// Encode a server timestamp the way every store writes it into documents.
pub fn encode_stamp(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

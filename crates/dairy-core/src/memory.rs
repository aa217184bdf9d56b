//! [`MemoryStore`] — an in-process [`DocumentStore`].
//!
//! Useful for tests and for embedding the ledger without a database. Stamps
//! are strictly increasing within one store, so newest-first reads are fully
//! deterministic.

use std::{
  cmp::Ordering,
  collections::HashMap,
  sync::{Arc, Mutex},
};

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::{
  document::{Collection, Document, DocumentId, Fields, Inserted, Query, encode_stamp, server_now},
  store::DocumentStore,
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("document {id} already exists in {collection}")]
  DuplicateId { collection: Collection, id: DocumentId },

  #[error("memory store lock poisoned")]
  Poisoned,
}

struct Entry {
  seq:    u64,
  id:     DocumentId,
  fields: Fields,
}

#[derive(Default)]
struct Inner {
  next_seq:   u64,
  last_stamp: Option<DateTime<Utc>>,
  docs:       HashMap<Collection, Vec<Entry>>,
}

impl Inner {
  /// Current time, nudged forward so no two inserts share a stamp.
  fn next_stamp(&mut self) -> DateTime<Utc> {
    let mut now = server_now();
    if let Some(last) = self.last_stamp
      && now <= last
    {
      now = last + Duration::microseconds(1);
    }
    self.last_stamp = Some(now);
    now
  }

  fn put(
    &mut self,
    collection: Collection,
    id: DocumentId,
    mut fields: Fields,
    stamp_field: &str,
  ) -> Result<Inserted, MemoryError> {
    let taken = self
      .docs
      .get(&collection)
      .is_some_and(|entries| entries.iter().any(|e| e.id == id));
    if taken {
      return Err(MemoryError::DuplicateId { collection, id });
    }

    let stamped_at = self.next_stamp();
    fields.insert(stamp_field.to_owned(), Value::String(encode_stamp(stamped_at)));

    let seq = self.next_seq;
    self.next_seq += 1;
    self
      .docs
      .entry(collection)
      .or_default()
      .push(Entry { seq, id: id.clone(), fields });

    Ok(Inserted { id, stamped_at })
  }
}

/// A [`DocumentStore`] held entirely in memory.
///
/// Cloning is cheap — clones share the same underlying documents.
#[derive(Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn with<T>(&self, f: impl FnOnce(&mut Inner) -> Result<T, MemoryError>) -> Result<T, MemoryError> {
    let mut guard = self.inner.lock().map_err(|_| MemoryError::Poisoned)?;
    f(&mut guard)
  }
}

impl DocumentStore for MemoryStore {
  type Error = MemoryError;

  async fn insert(
    &self,
    collection: Collection,
    fields: Fields,
    stamp_field: &'static str,
  ) -> Result<Inserted, MemoryError> {
    self.with(|inner| inner.put(collection, DocumentId::generate(), fields, stamp_field))
  }

  async fn insert_with_id(
    &self,
    collection: Collection,
    id: DocumentId,
    fields: Fields,
    stamp_field: &'static str,
  ) -> Result<Inserted, MemoryError> {
    self.with(|inner| inner.put(collection, id, fields, stamp_field))
  }

  async fn get(&self, collection: Collection, id: DocumentId) -> Result<Option<Document>, MemoryError> {
    self.with(|inner| {
      Ok(
        inner
          .docs
          .get(&collection)
          .and_then(|entries| entries.iter().find(|e| e.id == id))
          .map(|e| Document { collection, id: e.id.clone(), fields: e.fields.clone() }),
      )
    })
  }

  async fn query_ordered_desc(&self, query: &Query) -> Result<Vec<Document>, MemoryError> {
    self.with(|inner| {
      let Some(entries) = inner.docs.get(&query.collection) else {
        return Ok(Vec::new());
      };

      let mut sorted: Vec<&Entry> = entries.iter().collect();
      sorted.sort_by(|a, b| {
        compare_values(b.fields.get(query.order_by), a.fields.get(query.order_by))
          .then(b.seq.cmp(&a.seq))
      });

      Ok(
        sorted
          .into_iter()
          .take(query.limit.unwrap_or(usize::MAX))
          .map(|e| Document {
            collection: query.collection,
            id:         e.id.clone(),
            fields:     e.fields.clone(),
          })
          .collect(),
      )
    })
  }
}

// ─── Ordering ────────────────────────────────────────────────────────────────

/// Total order over optional JSON values: missing < null < bool < number <
/// string < array < object, with natural ordering inside scalars.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
  fn rank(v: Option<&Value>) -> u8 {
    match v {
      None => 0,
      Some(Value::Null) => 1,
      Some(Value::Bool(_)) => 2,
      Some(Value::Number(_)) => 3,
      Some(Value::String(_)) => 4,
      Some(Value::Array(_)) => 5,
      Some(Value::Object(_)) => 6,
    }
  }

  match (a, b) {
    (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
    (Some(Value::Number(x)), Some(Value::Number(y))) => {
      let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
      x.partial_cmp(&y).unwrap_or(Ordering::Equal)
    }
    (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
    _ => rank(a).cmp(&rank(b)),
  }
}

//! [`SqliteStore`] — the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use dairy_core::{
  document::{Collection, Document, DocumentId, Fields, Inserted, Query, encode_stamp, server_now},
  store::DocumentStore,
};
use rusqlite::OptionalExtension as _;
use serde_json::Value;

use crate::{
  Error, Result,
  encode::{RawDocument, encode_fields, encode_limit, json_path},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A dairy ledger store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Stamp `fields` and insert them under `id`.
  ///
  /// The existence check and the insert run in one closure on the
  /// connection thread, so no other write can interleave.
  async fn put(
    &self,
    collection: Collection,
    id: DocumentId,
    mut fields: Fields,
    stamp_field: &'static str,
  ) -> Result<Inserted> {
    let stamped_at = server_now();
    fields.insert(stamp_field.to_owned(), Value::String(encode_stamp(stamped_at)));

    let collection_str = collection.to_string();
    let id_str         = id.as_str().to_owned();
    let fields_json    = encode_fields(&fields)?;

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM documents WHERE collection = ?1 AND doc_id = ?2",
            rusqlite::params![collection_str, id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO documents (collection, doc_id, fields_json) VALUES (?1, ?2, ?3)",
          rusqlite::params![collection_str, id_str, fields_json],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateId { collection, id });
    }

    tracing::trace!(%collection, %id, "document inserted");
    Ok(Inserted { id, stamped_at })
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn insert(
    &self,
    collection:  Collection,
    fields:      Fields,
    stamp_field: &'static str,
  ) -> Result<Inserted> {
    self.put(collection, DocumentId::generate(), fields, stamp_field).await
  }

  async fn insert_with_id(
    &self,
    collection:  Collection,
    id:          DocumentId,
    fields:      Fields,
    stamp_field: &'static str,
  ) -> Result<Inserted> {
    self.put(collection, id, fields, stamp_field).await
  }

  async fn get(&self, collection: Collection, id: DocumentId) -> Result<Option<Document>> {
    let collection_str = collection.to_string();
    let id_str         = id.into_inner();

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT doc_id, fields_json FROM documents WHERE collection = ?1 AND doc_id = ?2",
              rusqlite::params![collection_str, id_str],
              |row| {
                Ok(RawDocument {
                  doc_id:      row.get(0)?,
                  fields_json: row.get(1)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(|r| r.into_document(collection)).transpose()
  }

  async fn query_ordered_desc(&self, query: &Query) -> Result<Vec<Document>> {
    let collection     = query.collection;
    let collection_str = collection.to_string();
    let path           = json_path(query.order_by);
    let limit          = encode_limit(query.limit);

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT doc_id, fields_json
           FROM documents
           WHERE collection = ?1
           ORDER BY json_extract(fields_json, ?2) DESC, seq DESC
           LIMIT ?3",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![collection_str, path, limit], |row| {
            Ok(RawDocument {
              doc_id:      row.get(0)?,
              fields_json: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(|r| r.into_document(collection)).collect()
  }
}

//! Conversions between [`Document`]s and the rows of the `documents` table.
//!
//! Field maps are stored as compact JSON text. Sort fields are addressed with
//! SQLite JSON paths (`$.field`).

use dairy_core::document::{Collection, Document, DocumentId, Fields};
use serde_json::Value;

use crate::{Error, Result};

/// A `documents` row before its payload is parsed.
pub struct RawDocument {
  pub doc_id:      String,
  pub fields_json: String,
}

impl RawDocument {
  pub fn into_document(self, collection: Collection) -> Result<Document> {
    let id = DocumentId::new(self.doc_id);
    match serde_json::from_str(&self.fields_json)? {
      Value::Object(fields) => Ok(Document { collection, id, fields }),
      _ => Err(Error::Corrupt { collection, id }),
    }
  }
}

pub fn encode_fields(fields: &Fields) -> Result<String> { Ok(serde_json::to_string(fields)?) }

/// JSON path selecting a top-level field, quoted so any key is addressable.
pub fn json_path(field: &str) -> String {
  format!("$.\"{}\"", field.replace('"', "\\\""))
}

/// `LIMIT` operand; SQLite treats a negative limit as "no limit".
pub fn encode_limit(limit: Option<usize>) -> i64 {
  limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn json_path_quotes_key() {
    assert_eq!(json_path("createdAt"), "$.\"createdAt\"");
  }

  #[test]
  fn unbounded_limit_is_negative() {
    assert_eq!(encode_limit(None), -1);
    assert_eq!(encode_limit(Some(5)), 5);
  }

  #[test]
  fn non_object_payload_is_corrupt() {
    let raw = RawDocument { doc_id: "x".into(), fields_json: "[1,2]".into() };
    assert!(matches!(
      raw.into_document(Collection::Payments),
      Err(Error::Corrupt { collection: Collection::Payments, .. })
    ));
  }
}

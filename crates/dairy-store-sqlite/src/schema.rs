//! SQL schema for the dairy SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Every collection lives in one table. Documents are never updated or
-- deleted; `seq` records insertion order and breaks ties on sort fields.
CREATE TABLE IF NOT EXISTS documents (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    collection  TEXT NOT NULL,   -- 'users' | 'customers' | 'deliveries' | 'payments'
    doc_id      TEXT NOT NULL,
    fields_json TEXT NOT NULL,   -- JSON object, server stamp included
    UNIQUE (collection, doc_id)
);

CREATE INDEX IF NOT EXISTS documents_collection_idx ON documents(collection);

-- Local identity provider. Only argon2 PHC strings are stored.
CREATE TABLE IF NOT EXISTS credentials (
    email         TEXT PRIMARY KEY,
    user_id       TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

PRAGMA user_version = 1;
";

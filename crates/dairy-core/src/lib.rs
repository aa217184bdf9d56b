//! Core types, trait seams and ledger components for the dairy ledger.
//!
//! The crate knows nothing about SQL or HTTP. Persistence goes through the
//! [`DocumentStore`](store::DocumentStore) trait and credential checks through
//! [`IdentityProvider`](store::IdentityProvider); both are injected by the
//! caller at construction time.

pub mod account;
pub mod config;
pub mod customer;
pub mod dashboard;
pub mod delivery;
pub mod document;
pub mod error;
pub mod input;
pub mod ledger;
pub mod memory;
pub mod payment;
pub mod store;

mod id;

pub use config::LedgerConfig;
pub use error::{BackendError, Error, Result, ValidationError};
pub use ledger::Ledger;

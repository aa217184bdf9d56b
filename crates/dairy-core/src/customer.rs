//! Customer Registry — a seller's customers and their delivery defaults.
//!
//! Customers are immutable once added. Their daily quantity and rate are the
//! defaults the [`DeliveryRecorder`](crate::delivery::DeliveryRecorder) falls
//! back to when a delivery does not override them.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  LedgerConfig, Result,
  document::{self, Collection, Document, Query},
  error::BackendError,
  input::{require_positive, require_text},
  store::{self, DocumentStore},
};

crate::id::opaque_id! {
  /// Identifies a [`Customer`].
  CustomerId
}

/// Field the store stamps on customer documents; also the sort key.
pub const CREATED_AT: &str = "createdAt";

// ─── Types ───────────────────────────────────────────────────────────────────

/// How often a customer settles up. Only weekly billing exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentCycle {
  #[default]
  Weekly,
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
  pub id:            CustomerId,
  pub name:          String,
  pub phone:         String,
  /// Default litres delivered per day. Fractions are valid.
  pub daily_qty:     Decimal,
  /// Default price per litre.
  pub rate_per_ltr:  Decimal,
  pub payment_cycle: PaymentCycle,
  pub created_at:    DateTime<Utc>,
}

impl fmt::Display for Customer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} — {} • {}L @ {}/L",
      self.name,
      self.phone,
      self.daily_qty.normalize(),
      self.rate_per_ltr.normalize()
    )
  }
}

/// Input for [`CustomerRegistry::add_customer`]. Numeric fields are optional
/// so that a missing value can be told apart from an invalid one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCustomer {
  #[serde(default)]
  pub name:         String,
  #[serde(default)]
  pub phone:        String,
  pub daily_qty:    Option<Decimal>,
  pub rate_per_ltr: Option<Decimal>,
}

impl NewCustomer {
  pub fn new(
    name: impl Into<String>,
    phone: impl Into<String>,
    daily_qty: Decimal,
    rate_per_ltr: Decimal,
  ) -> Self {
    Self {
      name:         name.into(),
      phone:        phone.into(),
      daily_qty:    Some(daily_qty),
      rate_per_ltr: Some(rate_per_ltr),
    }
  }
}

// ─── Document shape ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerRecord {
  name:          String,
  phone:         String,
  daily_qty:     Decimal,
  rate_per_ltr:  Decimal,
  #[serde(default)]
  payment_cycle: PaymentCycle,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  created_at:    Option<DateTime<Utc>>,
}

impl CustomerRecord {
  fn into_customer(self, id: CustomerId, created_at: DateTime<Utc>) -> Customer {
    Customer {
      id,
      name: self.name,
      phone: self.phone,
      daily_qty: self.daily_qty,
      rate_per_ltr: self.rate_per_ltr,
      payment_cycle: self.payment_cycle,
      created_at,
    }
  }
}

fn decode(doc: &Document) -> Result<Customer, BackendError> {
  let record: CustomerRecord = doc.decode()?;
  let created_at = record.created_at.ok_or_else(|| BackendError::Malformed {
    collection: doc.collection,
    id:         doc.id.clone(),
    reason:     format!("missing {CREATED_AT}"),
  })?;
  Ok(record.into_customer(doc.id.clone().into(), created_at))
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// Adds and lists customers.
pub struct CustomerRegistry<S> {
  store:  Arc<S>,
  config: LedgerConfig,
}

impl<S> Clone for CustomerRegistry<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), config: self.config.clone() }
  }
}

impl<S: DocumentStore> CustomerRegistry<S> {
  pub fn new(store: Arc<S>, config: LedgerConfig) -> Self { Self { store, config } }

  /// Validate and persist a new customer.
  ///
  /// Every call creates a new record; identical inputs are not deduplicated.
  pub async fn add_customer(&self, input: NewCustomer) -> Result<Customer> {
    let record = match validate(input) {
      Ok(record) => record,
      Err(e) => {
        tracing::warn!(error = %e, "rejected customer");
        return Err(e.into());
      }
    };

    let fields = document::encode(Collection::Customers, &record)?;
    let inserted = store::call(
      self.config.store_timeout(),
      self.store.insert(Collection::Customers, fields, CREATED_AT),
    )
    .await?;

    let customer = record.into_customer(inserted.id.into(), inserted.stamped_at);
    tracing::info!(customer_id = %customer.id, name = %customer.name, "customer added");
    Ok(customer)
  }

  /// All customers, newest first.
  pub async fn list_customers(&self) -> Result<Vec<Customer>> {
    self.query(Query::newest_first(Collection::Customers, CREATED_AT)).await
  }

  /// The `limit` most recently added customers, newest first.
  pub async fn recent(&self, limit: usize) -> Result<Vec<Customer>> {
    self
      .query(Query::newest_first(Collection::Customers, CREATED_AT).limit(limit))
      .await
  }

  /// Look up a single customer. Returns `None` if the id does not resolve.
  pub async fn get_customer(&self, id: &CustomerId) -> Result<Option<Customer>> {
    let doc = store::call(
      self.config.store_timeout(),
      self.store.get(Collection::Customers, id.clone().into()),
    )
    .await?;
    Ok(doc.as_ref().map(decode).transpose()?)
  }

  async fn query(&self, query: Query) -> Result<Vec<Customer>> {
    let docs = store::call(self.config.store_timeout(), self.store.query_ordered_desc(&query)).await?;
    tracing::debug!(count = docs.len(), limit = ?query.limit, "loaded customers");
    Ok(docs.iter().map(decode).collect::<Result<_, _>>()?)
  }
}

fn validate(input: NewCustomer) -> Result<CustomerRecord, crate::ValidationError> {
  Ok(CustomerRecord {
    name:          require_text("name", &input.name)?,
    phone:         require_text("phone", &input.phone)?,
    daily_qty:     require_positive("daily quantity", input.daily_qty)?,
    rate_per_ltr:  require_positive("rate", input.rate_per_ltr)?,
    payment_cycle: PaymentCycle::Weekly,
    created_at:    None,
  })
}

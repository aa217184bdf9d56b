//! Delivery Recorder — one document per delivery, with its amount frozen.
//!
//! `amount = quantity × rate` is computed exactly once, when the delivery is
//! recorded, and stored. Reads return the stored amount and never recompute
//! it, so later changes to a customer's rate leave history untouched.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  LedgerConfig, Result, ValidationError,
  customer::{CustomerId, CustomerRegistry},
  document::{self, Collection, Document, Query},
  error::BackendError,
  input::require_positive,
  store::{self, DocumentStore},
};

crate::id::opaque_id! {
  /// Identifies a [`Delivery`].
  DeliveryId
}

/// Field the store stamps on delivery documents; also the sort key.
pub const DATE: &str = "date";

// ─── Types ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
  pub id:          DeliveryId,
  /// Loose reference; not guaranteed to resolve.
  pub customer_id: CustomerId,
  pub quantity:    Decimal,
  pub rate:        Decimal,
  /// Snapshot of `quantity × rate` taken at write time.
  pub amount:      Decimal,
  pub date:        DateTime<Utc>,
}

impl fmt::Display for Delivery {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}L × {}/L = {:.2}",
      self.quantity.normalize(),
      self.rate.normalize(),
      self.amount
    )
  }
}

/// Input for [`DeliveryRecorder::record_delivery`].
///
/// `quantity` and `rate` fall back to the customer's defaults when `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDelivery {
  pub customer_id: CustomerId,
  pub quantity:    Option<Decimal>,
  pub rate:        Option<Decimal>,
}

impl NewDelivery {
  /// A delivery of the customer's usual quantity at the usual rate.
  pub fn usual(customer_id: impl Into<CustomerId>) -> Self {
    Self { customer_id: customer_id.into(), quantity: None, rate: None }
  }

  pub fn new(customer_id: impl Into<CustomerId>, quantity: Decimal, rate: Decimal) -> Self {
    Self {
      customer_id: customer_id.into(),
      quantity:    Some(quantity),
      rate:        Some(rate),
    }
  }

  pub fn with_quantity(mut self, quantity: Decimal) -> Self {
    self.quantity = Some(quantity);
    self
  }

  pub fn with_rate(mut self, rate: Decimal) -> Self {
    self.rate = Some(rate);
    self
  }
}

// ─── Document shape ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryRecord {
  customer_id: CustomerId,
  quantity:    Decimal,
  rate:        Decimal,
  amount:      Decimal,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  date:        Option<DateTime<Utc>>,
}

fn decode(doc: &Document) -> Result<Delivery, BackendError> {
  let record: DeliveryRecord = doc.decode()?;
  let date = record.date.ok_or_else(|| BackendError::Malformed {
    collection: doc.collection,
    id:         doc.id.clone(),
    reason:     format!("missing {DATE}"),
  })?;
  Ok(Delivery {
    id: doc.id.clone().into(),
    customer_id: record.customer_id,
    quantity: record.quantity,
    rate: record.rate,
    amount: record.amount,
    date,
  })
}

// ─── Recorder ────────────────────────────────────────────────────────────────

/// Records and lists deliveries.
pub struct DeliveryRecorder<S> {
  store:     Arc<S>,
  customers: CustomerRegistry<S>,
  config:    LedgerConfig,
}

impl<S> Clone for DeliveryRecorder<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      customers: self.customers.clone(),
      config:    self.config.clone(),
    }
  }
}

impl<S: DocumentStore> DeliveryRecorder<S> {
  pub fn new(store: Arc<S>, customers: CustomerRegistry<S>, config: LedgerConfig) -> Self {
    Self { store, customers, config }
  }

  /// Validate, fill in customer defaults, compute the amount and persist.
  ///
  /// The customer is only looked up when a default is needed or when
  /// [`LedgerConfig::enforce_customer_refs`] is set; otherwise the id is
  /// stored as given.
  pub async fn record_delivery(&self, input: NewDelivery) -> Result<Delivery> {
    let record = self.prepare(input).await.inspect_err(|e| {
      if e.is_validation() {
        tracing::warn!(error = %e, "rejected delivery");
      }
    })?;

    let fields = document::encode(Collection::Deliveries, &record)?;
    let inserted = store::call(
      self.config.store_timeout(),
      self.store.insert(Collection::Deliveries, fields, DATE),
    )
    .await?;

    let delivery = Delivery {
      id:          inserted.id.into(),
      customer_id: record.customer_id,
      quantity:    record.quantity,
      rate:        record.rate,
      amount:      record.amount,
      date:        inserted.stamped_at,
    };
    tracing::info!(
      delivery_id = %delivery.id,
      customer_id = %delivery.customer_id,
      amount = %delivery.amount,
      "delivery recorded"
    );
    Ok(delivery)
  }

  async fn prepare(&self, input: NewDelivery) -> Result<DeliveryRecord> {
    if input.customer_id.is_blank() {
      return Err(ValidationError::Missing("customer").into());
    }
    // Explicit overrides are checked before any lookup.
    if let Some(q) = input.quantity {
      require_positive("quantity", Some(q))?;
    }
    if let Some(r) = input.rate {
      require_positive("rate", Some(r))?;
    }

    let needs_defaults = input.quantity.is_none() || input.rate.is_none();
    let customer = if needs_defaults || self.config.enforce_customer_refs {
      self.customers.get_customer(&input.customer_id).await?
    } else {
      None
    };
    if customer.is_none() && self.config.enforce_customer_refs {
      return Err(ValidationError::UnknownCustomer(input.customer_id).into());
    }

    let quantity = require_positive(
      "quantity",
      input.quantity.or(customer.as_ref().map(|c| c.daily_qty)),
    )?;
    let rate = require_positive("rate", input.rate.or(customer.as_ref().map(|c| c.rate_per_ltr)))?;
    let amount = quantity
      .checked_mul(rate)
      .ok_or(ValidationError::Overflow("amount"))?;

    Ok(DeliveryRecord {
      customer_id: input.customer_id,
      quantity,
      rate,
      amount,
      date: None,
    })
  }

  /// All deliveries, newest first.
  pub async fn list_deliveries(&self) -> Result<Vec<Delivery>> {
    self.query(Query::newest_first(Collection::Deliveries, DATE)).await
  }

  /// The `limit` most recent deliveries, newest first.
  pub async fn recent(&self, limit: usize) -> Result<Vec<Delivery>> {
    self
      .query(Query::newest_first(Collection::Deliveries, DATE).limit(limit))
      .await
  }

  async fn query(&self, query: Query) -> Result<Vec<Delivery>> {
    let docs = store::call(self.config.store_timeout(), self.store.query_ordered_desc(&query)).await?;
    tracing::debug!(count = docs.len(), limit = ?query.limit, "loaded deliveries");
    Ok(docs.iter().map(decode).collect::<Result<_, _>>()?)
  }
}

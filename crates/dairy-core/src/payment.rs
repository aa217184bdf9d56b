//! Payment Ledger — loose entries of money received from a customer.
//!
//! A payment is not allocated against any delivery. Reconciling what a
//! customer owes is left to whoever reads the ledger.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  LedgerConfig, Result, ValidationError,
  customer::{CustomerId, CustomerRegistry},
  document::{self, Collection, Document, Query},
  error::BackendError,
  input::{optional_text, require_positive},
  store::{self, DocumentStore},
};

crate::id::opaque_id! {
  /// Identifies a [`Payment`].
  PaymentId
}

pub const DATE: &str = "date";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
  pub id:          PaymentId,
  pub customer_id: CustomerId,
  pub amount_paid: Decimal,
  pub notes:       Option<String>,
  pub date:        DateTime<Utc>,
}

impl fmt::Display for Payment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} — {:.2}", self.customer_id, self.amount_paid)?;
    if let Some(notes) = &self.notes {
      write!(f, " ({notes})")?;
    }
    Ok(())
  }
}

/// Input for [`PaymentLedger::record_payment`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPayment {
  pub customer_id: CustomerId,
  pub amount_paid: Option<Decimal>,
  pub notes:       Option<String>,
}

impl NewPayment {
  pub fn new(customer_id: impl Into<CustomerId>, amount_paid: Decimal) -> Self {
    Self {
      customer_id: customer_id.into(),
      amount_paid: Some(amount_paid),
      notes:       None,
    }
  }

  pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
    self.notes = Some(notes.into());
    self
  }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentRecord {
  customer_id: CustomerId,
  amount_paid: Decimal,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  notes:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  date:        Option<DateTime<Utc>>,
}

fn decode(doc: &Document) -> Result<Payment, BackendError> {
  let record: PaymentRecord = doc.decode()?;
  let date = record.date.ok_or_else(|| BackendError::Malformed {
    collection: doc.collection,
    id:         doc.id.clone(),
    reason:     format!("missing {DATE}"),
  })?;
  Ok(Payment {
    id: doc.id.clone().into(),
    customer_id: record.customer_id,
    amount_paid: record.amount_paid,
    // Older documents carry an empty string when no note was given.
    notes: optional_text(record.notes),
    date,
  })
}

/// Records and lists payments.
pub struct PaymentLedger<S> {
  store:     Arc<S>,
  customers: CustomerRegistry<S>,
  config:    LedgerConfig,
}

impl<S> Clone for PaymentLedger<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      customers: self.customers.clone(),
      config:    self.config.clone(),
    }
  }
}

impl<S: DocumentStore> PaymentLedger<S> {
  pub fn new(store: Arc<S>, customers: CustomerRegistry<S>, config: LedgerConfig) -> Self {
    Self { store, customers, config }
  }

  pub async fn record_payment(&self, input: NewPayment) -> Result<Payment> {
    let record = self.prepare(input).await.inspect_err(|e| {
      if e.is_validation() {
        tracing::warn!(error = %e, "rejected payment");
      }
    })?;

    let fields = document::encode(Collection::Payments, &record)?;
    let inserted = store::call(
      self.config.store_timeout(),
      self.store.insert(Collection::Payments, fields, DATE),
    )
    .await?;

    let payment = Payment {
      id:          inserted.id.into(),
      customer_id: record.customer_id,
      amount_paid: record.amount_paid,
      notes:       record.notes,
      date:        inserted.stamped_at,
    };
    tracing::info!(
      payment_id = %payment.id,
      customer_id = %payment.customer_id,
      amount = %payment.amount_paid,
      "payment recorded"
    );
    Ok(payment)
  }

  async fn prepare(&self, input: NewPayment) -> Result<PaymentRecord> {
    if input.customer_id.is_blank() {
      return Err(ValidationError::Missing("customer").into());
    }
    let amount_paid = require_positive("amount paid", input.amount_paid)?;

    if self.config.enforce_customer_refs
      && self.customers.get_customer(&input.customer_id).await?.is_none()
    {
      return Err(ValidationError::UnknownCustomer(input.customer_id).into());
    }

    Ok(PaymentRecord {
      customer_id: input.customer_id,
      amount_paid,
      notes: optional_text(input.notes),
      date: None,
    })
  }

  /// All payments, newest first.
  pub async fn list_payments(&self) -> Result<Vec<Payment>> {
    self.query(Query::newest_first(Collection::Payments, DATE)).await
  }

  pub async fn recent(&self, limit: usize) -> Result<Vec<Payment>> {
    self
      .query(Query::newest_first(Collection::Payments, DATE).limit(limit))
      .await
  }

  async fn query(&self, query: Query) -> Result<Vec<Payment>> {
    let docs = store::call(self.config.store_timeout(), self.store.query_ordered_desc(&query)).await?;
    tracing::debug!(count = docs.len(), limit = ?query.limit, "loaded payments");
    Ok(docs.iter().map(decode).collect::<Result<_, _>>()?)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::{Error, customer::NewCustomer, memory::MemoryStore};

  fn dec(s: &str) -> Decimal { s.parse().unwrap() }

  fn ledger_with(config: LedgerConfig) -> (Arc<MemoryStore>, CustomerRegistry<MemoryStore>, PaymentLedger<MemoryStore>) {
    let store     = Arc::new(MemoryStore::new());
    let customers = CustomerRegistry::new(Arc::clone(&store), config.clone());
    let ledger    = PaymentLedger::new(Arc::clone(&store), customers.clone(), config);
    (store, customers, ledger)
  }

  #[tokio::test]
  async fn record_and_list_newest_first() {
    let (_, _, ledger) = ledger_with(LedgerConfig::default());
    let first = ledger
      .record_payment(NewPayment::new("cust-1", dec("500")).with_notes("week 1"))
      .await
      .unwrap();
    let second = ledger.record_payment(NewPayment::new("cust-2", dec("120.50"))).await.unwrap();

    let listed = ledger.list_payments().await.unwrap();
    assert_eq!(listed, vec![second, first]);
    assert!(listed.windows(2).all(|w| w[0].date >= w[1].date));
    assert_eq!(listed[1].notes.as_deref(), Some("week 1"));
  }

  #[tokio::test]
  async fn blank_notes_are_dropped() {
    let (store, _, ledger) = ledger_with(LedgerConfig::default());
    let payment = ledger
      .record_payment(NewPayment::new("cust-1", dec("10")).with_notes("  "))
      .await
      .unwrap();
    assert_eq!(payment.notes, None);

    let doc = store.get(Collection::Payments, payment.id.into()).await.unwrap().unwrap();
    assert!(!doc.fields.contains_key("notes"));
  }

  #[tokio::test]
  async fn empty_string_notes_read_back_as_none() {
    let (store, _, ledger) = ledger_with(LedgerConfig::default());
    let mut fields = document::Fields::new();
    fields.insert("customerId".into(), json!("cust-1"));
    fields.insert("amountPaid".into(), json!(300));
    fields.insert("notes".into(), json!(""));
    store.insert(Collection::Payments, fields, DATE).await.unwrap();

    let listed = ledger.list_payments().await.unwrap();
    assert_eq!(listed[0].notes, None);
    assert_eq!(listed[0].amount_paid, dec("300"));
  }

  #[tokio::test]
  async fn missing_fields_are_rejected() {
    let (_, _, ledger) = ledger_with(LedgerConfig::default());

    let err = ledger.record_payment(NewPayment::new("", dec("10"))).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::Missing("customer"))));

    let no_amount = NewPayment { amount_paid: None, ..NewPayment::new("cust-1", dec("1")) };
    let err = ledger.record_payment(no_amount).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::Missing("amount paid"))));

    let err = ledger.record_payment(NewPayment::new("cust-1", Decimal::ZERO)).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::NotPositive { .. })));

    assert!(ledger.list_payments().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn enforced_refs_accept_known_customers_only() {
    let config = LedgerConfig { enforce_customer_refs: true, ..Default::default() };
    let (_, customers, ledger) = ledger_with(config);
    let known = customers
      .add_customer(NewCustomer::new("Asha", "555", dec("1"), dec("48")))
      .await
      .unwrap();

    ledger.record_payment(NewPayment::new(known.id, dec("48"))).await.unwrap();
    let err = ledger.record_payment(NewPayment::new("ghost", dec("48"))).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::UnknownCustomer(_))));
  }

  #[test]
  fn display_includes_notes_when_present() {
    let payment = Payment {
      id:          PaymentId::new("p1"),
      customer_id: CustomerId::new("c1"),
      amount_paid: dec("500"),
      notes:       Some("cash".into()),
      date:        Utc::now(),
    };
    assert_eq!(payment.to_string(), "c1 — 500.00 (cash)");
  }
}

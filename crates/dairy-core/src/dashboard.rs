//! Dashboard Aggregator — the most recent entries of each ledger.
//!
//! The three reads are independent and run concurrently. The summary is all
//! or nothing: if any read fails, [`Dashboard::summarize`] returns that error
//! and no partial data.

use serde::Serialize;

use crate::{
  Result,
  customer::{Customer, CustomerRegistry},
  delivery::{Delivery, DeliveryRecorder},
  payment::{Payment, PaymentLedger},
  store::DocumentStore,
};

/// Snapshot of the newest records, each list newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
  pub customers:  Vec<Customer>,
  pub deliveries: Vec<Delivery>,
  pub payments:   Vec<Payment>,
}

/// How many records each section of a [`Summary`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
  pub customers:  usize,
  pub deliveries: usize,
  pub payments:   usize,
}

impl Summary {
  pub fn counts(&self) -> SummaryCounts {
    SummaryCounts {
      customers:  self.customers.len(),
      deliveries: self.deliveries.len(),
      payments:   self.payments.len(),
    }
  }
}

pub struct Dashboard<S> {
  customers:  CustomerRegistry<S>,
  deliveries: DeliveryRecorder<S>,
  payments:   PaymentLedger<S>,
  limit:      usize,
}

impl<S> Clone for Dashboard<S> {
  fn clone(&self) -> Self {
    Self {
      customers:  self.customers.clone(),
      deliveries: self.deliveries.clone(),
      payments:   self.payments.clone(),
      limit:      self.limit,
    }
  }
}

impl<S: DocumentStore> Dashboard<S> {
  pub fn new(
    customers: CustomerRegistry<S>,
    deliveries: DeliveryRecorder<S>,
    payments: PaymentLedger<S>,
    limit: usize,
  ) -> Self {
    Self { customers, deliveries, payments, limit }
  }

  pub async fn summarize(&self) -> Result<Summary> {
    let (customers, deliveries, payments) = tokio::try_join!(
      self.customers.recent(self.limit),
      self.deliveries.recent(self.limit),
      self.payments.recent(self.limit),
    )
    .inspect_err(|e| tracing::error!(error = %e, "dashboard load failed"))?;

    let summary = Summary { customers, deliveries, payments };
    let counts = summary.counts();
    tracing::debug!(
      customers = counts.customers,
      deliveries = counts.deliveries,
      payments = counts.payments,
      "dashboard loaded"
    );
    Ok(summary)
  }
}

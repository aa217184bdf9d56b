//! [`Ledger`] — the four ledger components wired to one store.

use std::sync::Arc;

use crate::{
  LedgerConfig,
  customer::CustomerRegistry,
  dashboard::Dashboard,
  delivery::DeliveryRecorder,
  payment::PaymentLedger,
  store::DocumentStore,
};

/// Owns one instance of each component, all sharing the injected store.
pub struct Ledger<S> {
  pub customers:  CustomerRegistry<S>,
  pub deliveries: DeliveryRecorder<S>,
  pub payments:   PaymentLedger<S>,
  pub dashboard:  Dashboard<S>,
}

impl<S> Clone for Ledger<S> {
  fn clone(&self) -> Self {
    Self {
      customers:  self.customers.clone(),
      deliveries: self.deliveries.clone(),
      payments:   self.payments.clone(),
      dashboard:  self.dashboard.clone(),
    }
  }
}

impl<S: DocumentStore> Ledger<S> {
  pub fn new(store: Arc<S>, config: LedgerConfig) -> Self {
    let customers  = CustomerRegistry::new(Arc::clone(&store), config.clone());
    let deliveries = DeliveryRecorder::new(Arc::clone(&store), customers.clone(), config.clone());
    let payments   = PaymentLedger::new(store, customers.clone(), config.clone());
    let dashboard  = Dashboard::new(
      customers.clone(),
      deliveries.clone(),
      payments.clone(),
      config.dashboard_limit,
    );
    Self { customers, deliveries, payments, dashboard }
  }
}

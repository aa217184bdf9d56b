//! Subcommand definitions and their execution against the ledger.

use std::io::{self, BufRead as _, Write as _};

use anyhow::Context as _;
use clap::{Args, Subcommand};
use dairy_api::AppState;
use dairy_core::{
  account::{Role, SignUp},
  customer::{CustomerId, NewCustomer},
  delivery::NewDelivery,
  input::parse_decimal,
  payment::NewPayment,
  store::{DocumentStore, IdentityProvider},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::settings::AppConfig;

// ─── CLI shape ───────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Register a new account.
  Signup {
    #[arg(long)]
    email:    String,
    /// Read from stdin when omitted.
    #[arg(long)]
    password: Option<String>,
    /// One of `seller`, `getter`, `admin`.
    #[arg(long, default_value = "getter")]
    role:     Role,
  },
  /// Check credentials and show the account profile.
  Login {
    #[arg(long)]
    email:    String,
    #[arg(long)]
    password: Option<String>,
  },
  #[command(subcommand)]
  Customers(CustomerCommand),
  #[command(subcommand)]
  Deliveries(DeliveryCommand),
  #[command(subcommand)]
  Payments(PaymentCommand),
  /// Show the newest customers, deliveries and payments.
  Dashboard,
  /// Serve the JSON API.
  Serve,
}

#[derive(Args, Debug)]
pub struct ListArgs {
  /// Only show the newest `n` records.
  #[arg(long)]
  limit: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum CustomerCommand {
  Add {
    #[arg(long)]
    name:      String,
    #[arg(long)]
    phone:     String,
    /// Usual litres per day.
    #[arg(long)]
    daily_qty: Option<String>,
    /// Price per litre.
    #[arg(long)]
    rate:      Option<String>,
  },
  List(ListArgs),
}

#[derive(Subcommand, Debug)]
pub enum DeliveryCommand {
  /// Record a delivery. Quantity and rate default to the customer's usual.
  Record {
    #[arg(long)]
    customer: String,
    #[arg(long)]
    quantity: Option<String>,
    #[arg(long)]
    rate:     Option<String>,
  },
  List(ListArgs),
}

#[derive(Subcommand, Debug)]
pub enum PaymentCommand {
  Record {
    #[arg(long)]
    customer: String,
    #[arg(long)]
    amount:   Option<String>,
    #[arg(long)]
    notes:    Option<String>,
  },
  List(ListArgs),
}

// ─── Execution ───────────────────────────────────────────────────────────────

pub async fn run<S, I>(command: Command, state: AppState<S, I>, cfg: &AppConfig) -> anyhow::Result<()>
where
  S: DocumentStore + 'static,
  I: IdentityProvider + 'static,
{
  let ledger = &state.ledger;

  match command {
    Command::Signup { email, password, role } => {
      let password = password_or_stdin(password)?;
      let user = state.accounts.sign_up(SignUp { email, password, role }).await?;
      println!("{}  {} ({})", user.id, user.email, user.role);
    }
    Command::Login { email, password } => {
      let password = password_or_stdin(password)?;
      let user = state.accounts.log_in(&email, &password).await?;
      println!("{}  {} ({})", user.id, user.email, user.role);
    }

    Command::Customers(CustomerCommand::Add { name, phone, daily_qty, rate }) => {
      let input = NewCustomer {
        name,
        phone,
        daily_qty:    parse_decimal("daily quantity", flag(daily_qty.as_deref()))?,
        rate_per_ltr: parse_decimal("rate", flag(rate.as_deref()))?,
      };
      let customer = ledger.customers.add_customer(input).await?;
      println!("{}  {customer}", customer.id);
    }
    Command::Customers(CustomerCommand::List(args)) => {
      let customers = match args.limit {
        Some(n) => ledger.customers.recent(n).await?,
        None => ledger.customers.list_customers().await?,
      };
      print_rows(customers.iter().map(|c| (c.id.as_str(), c)));
    }

    Command::Deliveries(DeliveryCommand::Record { customer, quantity, rate }) => {
      let input = NewDelivery {
        customer_id: CustomerId::new(customer),
        quantity:    parse_decimal("quantity", flag(quantity.as_deref()))?,
        rate:        parse_decimal("rate", flag(rate.as_deref()))?,
      };
      let delivery = ledger.deliveries.record_delivery(input).await?;
      println!("{}  {delivery}", delivery.id);
    }
    Command::Deliveries(DeliveryCommand::List(args)) => {
      let deliveries = match args.limit {
        Some(n) => ledger.deliveries.recent(n).await?,
        None => ledger.deliveries.list_deliveries().await?,
      };
      print_rows(deliveries.iter().map(|d| (d.id.as_str(), d)));
    }

    Command::Payments(PaymentCommand::Record { customer, amount, notes }) => {
      let input = NewPayment {
        customer_id: CustomerId::new(customer),
        amount_paid: parse_decimal("amount paid", flag(amount.as_deref()))?,
        notes,
      };
      let payment = ledger.payments.record_payment(input).await?;
      println!("{}  {payment}", payment.id);
    }
    Command::Payments(PaymentCommand::List(args)) => {
      let payments = match args.limit {
        Some(n) => ledger.payments.recent(n).await?,
        None => ledger.payments.list_payments().await?,
      };
      print_rows(payments.iter().map(|p| (p.id.as_str(), p)));
    }

    Command::Dashboard => {
      let summary = ledger.dashboard.summarize().await?;
      let counts  = summary.counts();
      println!("{}", section_header("Customers", counts.customers));
      print_rows(summary.customers.iter().map(|c| (c.id.as_str(), c)));
      println!("\n{}", section_header("Deliveries", counts.deliveries));
      print_rows(summary.deliveries.iter().map(|d| (d.id.as_str(), d)));
      println!("\n{}", section_header("Payments", counts.payments));
      print_rows(summary.payments.iter().map(|p| (p.id.as_str(), p)));
    }

    Command::Serve => serve(state, cfg).await?,
  }

  Ok(())
}

async fn serve<S, I>(state: AppState<S, I>, cfg: &AppConfig) -> anyhow::Result<()>
where
  S: DocumentStore + 'static,
  I: IdentityProvider + 'static,
{
  let app     = dairy_api::api_router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

/// An omitted flag reads as blank input, which the ledger reports as missing.
fn flag(value: Option<&str>) -> &str { value.unwrap_or_default() }

fn section_header(title: &str, count: usize) -> String { format!("{title} ({count})") }

fn print_rows<'a, T>(rows: impl Iterator<Item = (&'a str, &'a T)>)
where
  T: std::fmt::Display + 'a,
{
  let mut empty = true;
  for (id, row) in rows {
    empty = false;
    println!("{id}  {row}");
  }
  if empty {
    println!("  (none)");
  }
}

/// Use the flag value if given, otherwise read a line from stdin.
fn password_or_stdin(password: Option<String>) -> anyhow::Result<String> {
  if let Some(password) = password {
    return Ok(password);
  }
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

#[cfg(test)]
mod tests {
  use clap::Parser;

  use super::*;

  #[derive(Parser, Debug)]
  struct TestCli {
    #[command(subcommand)]
    command: Command,
  }

  #[test]
  fn role_accepts_short_names() {
    let cli = TestCli::try_parse_from(["dairy", "signup", "--email", "a@b.c", "--role", "seller"]).unwrap();
    assert!(matches!(cli.command, Command::Signup { role: Role::Seller, .. }));
  }

  #[test]
  fn delivery_overrides_are_optional() {
    let cli = TestCli::try_parse_from(["dairy", "deliveries", "record", "--customer", "c1"]).unwrap();
    let Command::Deliveries(DeliveryCommand::Record { quantity, rate, .. }) = cli.command else {
      panic!("wrong command");
    };
    assert_eq!(parse_decimal("quantity", flag(quantity.as_deref())), Ok(None));
    assert_eq!(parse_decimal("rate", flag(rate.as_deref())), Ok(None));
  }

  #[test]
  fn dashboard_headers_carry_counts() {
    assert_eq!(section_header("Payments", 5), "Payments (5)");
  }

  #[test]
  fn list_takes_a_limit() {
    let cli = TestCli::try_parse_from(["dairy", "payments", "list", "--limit", "3"]).unwrap();
    assert!(matches!(cli.command, Command::Payments(PaymentCommand::List(ListArgs { limit: Some(3) }))));
  }
}

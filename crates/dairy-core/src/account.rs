//! Account Directory — registered users and their roles.
//!
//! Credentials never touch this module beyond being handed to the
//! [`IdentityProvider`]. The directory stores one profile document per user,
//! keyed by the id the provider issued.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, LedgerConfig, Result, ValidationError,
  document::{self, Collection, Document},
  error::BackendError,
  input::require_text,
  store::{self, DocumentStore, IdentityProvider},
};

crate::id::opaque_id! {
  /// The opaque id the identity provider issued for a user.
  UserId
}

pub const CREATED_AT: &str = "createdAt";

/// What a user does in the business.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
pub enum Role {
  #[serde(rename = "milk_seller")]
  #[strum(to_string = "milk_seller", serialize = "seller")]
  Seller,
  /// Receives deliveries.
  #[default]
  #[serde(rename = "milk_getter")]
  #[strum(to_string = "milk_getter", serialize = "getter")]
  Getter,
  #[serde(rename = "admin")]
  #[strum(to_string = "admin")]
  Admin,
}

/// A registered user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id:         UserId,
  pub email:      String,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
}

/// Input for [`AccountDirectory::sign_up`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUp {
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub password: String,
  #[serde(default)]
  pub role:     Role,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
  email:      String,
  user_type:  Role,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  created_at: Option<DateTime<Utc>>,
}

fn decode(doc: &Document) -> Result<User, BackendError> {
  let record: UserRecord = doc.decode()?;
  let created_at = record.created_at.ok_or_else(|| BackendError::Malformed {
    collection: doc.collection,
    id:         doc.id.clone(),
    reason:     format!("missing {CREATED_AT}"),
  })?;
  Ok(User {
    id: doc.id.clone().into(),
    email: record.email,
    role: record.user_type,
    created_at,
  })
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// Registers users with the identity provider and keeps their profiles.
pub struct AccountDirectory<S, I> {
  store:    Arc<S>,
  identity: Arc<I>,
  config:   LedgerConfig,
}

impl<S, I> Clone for AccountDirectory<S, I> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      identity: Arc::clone(&self.identity),
      config:   self.config.clone(),
    }
  }
}

impl<S, I> AccountDirectory<S, I>
where
  S: DocumentStore,
  I: IdentityProvider,
{
  pub fn new(store: Arc<S>, identity: Arc<I>, config: LedgerConfig) -> Self {
    Self { store, identity, config }
  }

  /// Create credentials with the identity provider, then write the profile
  /// document under the issued id.
  pub async fn sign_up(&self, input: SignUp) -> Result<User> {
    let email = require_text("email", &input.email)?;
    if input.password.is_empty() {
      tracing::warn!("rejected sign-up without password");
      return Err(ValidationError::Missing("password").into());
    }

    let user_id = self
      .identity
      .create_account(&email, &input.password)
      .await
      .map_err(|e| Error::Auth(Box::new(e)))?;

    let record = UserRecord { email, user_type: input.role, created_at: None };
    let fields = document::encode(Collection::Users, &record)?;
    let inserted = match store::call(
      self.config.store_timeout(),
      self
        .store
        .insert_with_id(Collection::Users, user_id.clone().into(), fields, CREATED_AT),
    )
    .await
    {
      Ok(inserted) => inserted,
      Err(e) => {
        // Credentials without a profile would lock the email out for good.
        if let Err(undo) = self.identity.remove_account(&user_id).await {
          tracing::error!(user_id = %user_id, error = %undo, "could not roll back credentials");
        }
        tracing::warn!(user_id = %user_id, error = %e, "profile write failed; sign-up rolled back");
        return Err(e.into());
      }
    };

    tracing::info!(user_id = %user_id, role = %record.user_type, "account created");
    Ok(User {
      id:         user_id,
      email:      record.email,
      role:       record.user_type,
      created_at: inserted.stamped_at,
    })
  }

  /// Verify credentials and load the matching profile.
  pub async fn log_in(&self, email: &str, password: &str) -> Result<User> {
    let email = require_text("email", email)?;
    if password.is_empty() {
      return Err(ValidationError::Missing("password").into());
    }

    let user_id = self
      .identity
      .verify(&email, password)
      .await
      .map_err(|e| {
        tracing::warn!(error = %e, "log-in refused");
        Error::Auth(Box::new(e))
      })?;

    let user = self
      .get_user(&user_id)
      .await?
      .ok_or(Error::AccountNotFound(user_id))?;
    tracing::info!(user_id = %user.id, "logged in");
    Ok(user)
  }

  pub async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
    let doc = store::call(
      self.config.store_timeout(),
      self.store.get(Collection::Users, id.clone().into()),
    )
    .await?;
    Ok(doc.as_ref().map(decode).transpose()?)
  }
}

#[cfg(test)]
mod tests {
  use std::{collections::HashMap, io, sync::Mutex};

  use thiserror::Error;

  use super::*;
  use crate::{
    document::{DocumentId, Fields, Inserted, Query},
    memory::MemoryStore,
  };

  #[derive(Debug, Error)]
  enum FakeIdentityError {
    #[error("email already registered")]
    Taken,
    #[error("invalid credentials")]
    Invalid,
  }

  /// Keeps plaintext pairs in memory; good enough to drive the directory.
  #[derive(Default)]
  struct FakeIdentity {
    accounts: Mutex<HashMap<String, (String, UserId)>>,
  }

  impl IdentityProvider for FakeIdentity {
    type Error = FakeIdentityError;

    async fn create_account(&self, email: &str, password: &str) -> Result<UserId, FakeIdentityError> {
      let mut accounts = self.accounts.lock().unwrap();
      if accounts.contains_key(email) {
        return Err(FakeIdentityError::Taken);
      }
      let id = UserId::new(format!("uid-{}", accounts.len() + 1));
      accounts.insert(email.to_owned(), (password.to_owned(), id.clone()));
      Ok(id)
    }

    async fn verify(&self, email: &str, password: &str) -> Result<UserId, FakeIdentityError> {
      match self.accounts.lock().unwrap().get(email) {
        Some((stored, id)) if stored == password => Ok(id.clone()),
        _ => Err(FakeIdentityError::Invalid),
      }
    }

    async fn remove_account(&self, user_id: &UserId) -> Result<(), FakeIdentityError> {
      self.accounts.lock().unwrap().retain(|_, (_, id)| id != user_id);
      Ok(())
    }
  }

  /// Delegates to a [`MemoryStore`] but refuses every keyed insert.
  #[derive(Default)]
  struct FailingProfiles {
    inner: MemoryStore,
  }

  impl DocumentStore for FailingProfiles {
    type Error = io::Error;

    async fn insert(&self, c: Collection, f: Fields, s: &'static str) -> Result<Inserted, io::Error> {
      self.inner.insert(c, f, s).await.map_err(io::Error::other)
    }

    async fn insert_with_id(
      &self,
      _: Collection,
      _: DocumentId,
      _: Fields,
      _: &'static str,
    ) -> Result<Inserted, io::Error> {
      Err(io::Error::other("disk full"))
    }

    async fn get(&self, c: Collection, id: DocumentId) -> Result<Option<Document>, io::Error> {
      self.inner.get(c, id).await.map_err(io::Error::other)
    }

    async fn query_ordered_desc(&self, query: &Query) -> Result<Vec<Document>, io::Error> {
      self.inner.query_ordered_desc(query).await.map_err(io::Error::other)
    }
  }

  fn directory() -> AccountDirectory<MemoryStore, FakeIdentity> {
    AccountDirectory::new(
      Arc::new(MemoryStore::new()),
      Arc::new(FakeIdentity::default()),
      LedgerConfig::default(),
    )
  }

  fn sign_up(email: &str, password: &str, role: Role) -> SignUp {
    SignUp { email: email.into(), password: password.into(), role }
  }

  #[tokio::test]
  async fn sign_up_then_log_in() {
    let dir  = directory();
    let user = dir.sign_up(sign_up("seller@example.com", "pw", Role::Seller)).await.unwrap();
    assert_eq!(user.id.as_str(), "uid-1");
    assert_eq!(user.role, Role::Seller);

    let logged_in = dir.log_in("seller@example.com", "pw").await.unwrap();
    assert_eq!(logged_in, user);
  }

  #[tokio::test]
  async fn profile_uses_camel_case_field_names() {
    let store = Arc::new(MemoryStore::new());
    let dir   = AccountDirectory::new(
      Arc::clone(&store),
      Arc::new(FakeIdentity::default()),
      LedgerConfig::default(),
    );
    let user = dir.sign_up(sign_up("a@example.com", "pw", Role::Getter)).await.unwrap();

    let doc = store.get(Collection::Users, user.id.into()).await.unwrap().unwrap();
    assert_eq!(doc.fields["userType"], "milk_getter");
    assert_eq!(doc.fields["email"], "a@example.com");
    assert!(doc.fields.contains_key("createdAt"));
  }

  #[tokio::test]
  async fn blank_credentials_never_reach_the_provider() {
    let dir = directory();
    let err = dir.sign_up(sign_up("", "pw", Role::Admin)).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::Missing("email"))));
    let err = dir.sign_up(sign_up("x@example.com", "", Role::Admin)).await.unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::Missing("password"))));
  }

  #[tokio::test]
  async fn wrong_password_is_an_auth_error() {
    let dir = directory();
    dir.sign_up(sign_up("a@example.com", "right", Role::Seller)).await.unwrap();
    let err = dir.log_in("a@example.com", "wrong").await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
  }

  #[tokio::test]
  async fn duplicate_email_is_an_auth_error() {
    let dir = directory();
    dir.sign_up(sign_up("a@example.com", "pw", Role::Seller)).await.unwrap();
    let err = dir.sign_up(sign_up("a@example.com", "pw", Role::Seller)).await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
  }

  #[tokio::test]
  async fn failed_profile_write_releases_the_email() {
    let identity = Arc::new(FakeIdentity::default());
    let broken   = AccountDirectory::new(
      Arc::new(FailingProfiles::default()),
      Arc::clone(&identity),
      LedgerConfig::default(),
    );
    let err = broken
      .sign_up(sign_up("a@example.com", "pw", Role::Seller))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Backend(BackendError::Store(_))));
    assert!(identity.accounts.lock().unwrap().is_empty());

    let healthy = AccountDirectory::new(Arc::new(MemoryStore::new()), identity, LedgerConfig::default());
    let user = healthy
      .sign_up(sign_up("a@example.com", "pw", Role::Seller))
      .await
      .unwrap();
    let logged_in = healthy.log_in("a@example.com", "pw").await.unwrap();
    assert_eq!(logged_in, user);
  }

  #[test]
  fn role_parses_short_and_stored_names() {
    assert_eq!("seller".parse::<Role>().unwrap(), Role::Seller);
    assert_eq!("milk_getter".parse::<Role>().unwrap(), Role::Getter);
    assert_eq!(Role::Admin.to_string(), "admin");
    assert_eq!(Role::default(), Role::Getter);
  }
}

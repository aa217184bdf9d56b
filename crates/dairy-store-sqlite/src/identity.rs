//! Local [`IdentityProvider`] backed by the `credentials` table.
//!
//! Passwords are hashed with argon2; only the PHC string is stored. Emails
//! are compared case-insensitively.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use dairy_core::{
  account::UserId,
  document::{encode_stamp, server_now},
  store::IdentityProvider,
};
use rand_core::OsRng;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{Error, Result, SqliteStore};

fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

impl IdentityProvider for SqliteStore {
  type Error = Error;

  async fn create_account(&self, email: &str, password: &str) -> Result<UserId> {
    let email = normalize_email(email);
    let salt  = SaltString::generate(&mut OsRng);
    let hash  = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| Error::PasswordHash(e.to_string()))?
      .to_string();

    let user_id     = Uuid::new_v4().simple().to_string();
    let at_str      = encode_stamp(server_now());
    let email_row   = email.clone();
    let user_id_row = user_id.clone();

    let created: bool = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM credentials WHERE email = ?1",
            rusqlite::params![email_row],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO credentials (email, user_id, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![email_row, user_id_row, hash, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !created {
      return Err(Error::EmailTaken(email));
    }
    tracing::debug!(user_id = %user_id, "credentials stored");
    Ok(UserId::new(user_id))
  }

  async fn verify(&self, email: &str, password: &str) -> Result<UserId> {
    let email = normalize_email(email);

    let row: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, password_hash FROM credentials WHERE email = ?1",
              rusqlite::params![email],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    let (user_id, hash) = row.ok_or(Error::InvalidCredentials)?;
    let parsed = PasswordHash::new(&hash).map_err(|e| Error::PasswordHash(e.to_string()))?;
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .map_err(|_| Error::InvalidCredentials)?;

    Ok(UserId::new(user_id))
  }

  async fn remove_account(&self, user_id: &UserId) -> Result<()> {
    let id = user_id.as_str().to_owned();
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM credentials WHERE user_id = ?1", rusqlite::params![id])?)
      })
      .await?;
    tracing::debug!(user_id = %user_id, removed, "credentials removed");
    Ok(())
  }
}

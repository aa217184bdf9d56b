//! Field validation shared by the write paths.
//!
//! Blank input is *missing*; `0` is *present but not positive*. Both are
//! rejected, with different errors, so the operator can tell them apart.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::ValidationError;

/// Parse raw operator input into a decimal. Blank input yields `None`.
pub fn parse_decimal(field: &'static str, input: &str) -> Result<Option<Decimal>, ValidationError> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Ok(None);
  }
  Decimal::from_str(trimmed)
    .map(Some)
    .map_err(|_| ValidationError::Malformed { field, input: input.to_owned() })
}

/// Require a non-blank text field and return it trimmed.
pub fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(ValidationError::Missing(field));
  }
  Ok(trimmed.to_owned())
}

/// Require a present, strictly positive decimal.
pub fn require_positive(field: &'static str, value: Option<Decimal>) -> Result<Decimal, ValidationError> {
  let value = value.ok_or(ValidationError::Missing(field))?;
  if value <= Decimal::ZERO {
    return Err(ValidationError::NotPositive { field, value });
  }
  Ok(value)
}

/// Collapse blank optional text to `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

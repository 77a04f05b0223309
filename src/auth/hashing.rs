// src/auth/hashing.rs

//! PIN and phone hashing helpers.
//!
//! The access PIN is verified interactively at login, so it gets a salted
//! argon2 hash. The phone hash must be a deterministic value the guard can
//! compare for equality, so it stays a plain SHA-256 over the normalized
//! digits.

use crate::errors::AppError;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use sha2::{Digest, Sha256};
use tracing::{debug, error};

/// Strips everything that is not a digit.
pub fn normalize_phone_loose(raw: &str) -> String {
  raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// SHA-256 hex of the normalized phone digits. Stored on the order so the
/// ownership check never needs the raw phone.
pub fn hash_phone(phone_norm: &str) -> String {
  let digest = Sha256::digest(phone_norm.trim().to_lowercase().as_bytes());
  hex::encode(digest)
}

/// Hashes the customer's access PIN with argon2.
pub fn hash_pin(pin: &str) -> Result<String, AppError> {
  if pin.is_empty() {
    return Err(AppError::Validation("PIN cannot be empty for hashing.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  let argon2_hasher = Argon2::default();

  match argon2_hasher.hash_password(pin.as_bytes(), &salt) {
    Ok(password_hash_obj) => Ok(password_hash_obj.to_string()),
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 PIN hashing failed.");
      Err(AppError::Internal(format!("PIN hashing process failed: {}", argon_err)))
    }
  }
}

/// Verifies a presented PIN against a stored argon2 hash.
pub fn verify_pin(stored_hash: &str, provided_pin: &str) -> Result<bool, AppError> {
  if stored_hash.is_empty() || provided_pin.is_empty() {
    return Ok(false);
  }

  let parsed_hash = match PasswordHash::new(stored_hash) {
    Ok(ph) => ph,
    Err(parse_err) => {
      error!(error = %parse_err, "Failed to parse stored PIN hash string.");
      return Err(AppError::Internal(format!(
        "Invalid stored PIN hash format: {}",
        parse_err
      )));
    }
  };

  match Argon2::default().verify_password(provided_pin.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("PIN verification failed: mismatch.");
      Ok(false)
    }
    Err(other_argon_err) => {
      error!(error = %other_argon_err, "Argon2 PIN verification encountered an error.");
      Err(AppError::Internal(format!(
        "PIN verification process failed: {}",
        other_argon_err
      )))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_strips_everything_but_digits() {
    assert_eq!(normalize_phone_loose("090-1234-5678"), "09012345678");
    assert_eq!(normalize_phone_loose("+81 90 1234 5678"), "819012345678");
    assert_eq!(normalize_phone_loose("abc"), "");
  }

  #[test]
  fn phone_hash_is_stable_hex() {
    let h = hash_phone("09012345678");
    assert_eq!(h.len(), 64);
    assert_eq!(h, hash_phone("09012345678"));
    assert_ne!(h, hash_phone("09012345679"));
  }

  #[test]
  fn pin_round_trip() {
    let hash = hash_pin("1234").unwrap();
    assert!(verify_pin(&hash, "1234").unwrap());
    assert!(!verify_pin(&hash, "4321").unwrap());
  }

  #[test]
  fn empty_inputs_never_verify() {
    let hash = hash_pin("1234").unwrap();
    assert!(!verify_pin(&hash, "").unwrap());
    assert!(!verify_pin("", "1234").unwrap());
  }
}

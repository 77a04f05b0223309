// src/auth/session.rs

//! Customer session codec.
//!
//! A session token is a self-contained bearer credential scoping a customer
//! to exactly one order: `base64url(payload) + "." + hex(hmac_sha256)`. The
//! server holds no session table, so there is no revocation before expiry.

use crate::auth::hashing::{hash_phone, normalize_phone_loose};
use crate::errors::AppError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SESSION_VERSION: u32 = 1;
const DEFAULT_TTL_MS: i64 = 7 * 24 * 60 * 60 * 1000;
const MIN_TTL_MS: i64 = 60 * 1000;
/// Hard ceiling on total lifetime, enforced at verification even if a signed
/// token claims a longer span.
const MAX_LIFETIME_MS: i64 = 30 * 24 * 60 * 60 * 1000;
/// Tolerated clock skew for the issued-at instant.
const MAX_FUTURE_IAT_MS: i64 = 5 * 60 * 1000;

const MIN_ORDER_ID_LEN: usize = 6;
const MAX_ORDER_ID_LEN: usize = 128;
const MIN_PHONE_DIGITS: usize = 8;
const MAX_PHONE_DIGITS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
  pub order_id: String,
  /// Normalized phone digits.
  pub phone: String,
  pub phone_hash: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SignOptions {
  /// Requested lifetime; defaults to 7 days, floored at 1 minute. The 30-day
  /// ceiling is applied at verification, not here.
  pub ttl: Option<Duration>,
  pub include_phone_hash: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionPayload {
  v: u32,
  #[serde(rename = "orderId")]
  order_id: String,
  phone: String,
  #[serde(rename = "phoneHash", skip_serializing_if = "Option::is_none", default)]
  phone_hash: Option<String>,
  /// Milliseconds since epoch.
  iat: i64,
  exp: i64,
}

/// Signs `{order_id, phone}` into an opaque bearer token.
///
/// Claim syntax is validated here and again at verification; a violation
/// fails with `InvalidClaim`.
pub fn sign_session(secret: &[u8], order_id: &str, phone: &str, opts: SignOptions) -> Result<String, AppError> {
  let order_id = validate_order_id(order_id)
    .ok_or_else(|| AppError::InvalidClaim("invalid order id".to_string()))?;
  let phone = validate_phone(phone).ok_or_else(|| AppError::InvalidClaim("invalid phone".to_string()))?;

  let now = Utc::now().timestamp_millis();
  let ttl_ms = match opts.ttl {
    Some(requested) => requested.num_milliseconds().max(MIN_TTL_MS),
    None => DEFAULT_TTL_MS,
  };

  let payload = SessionPayload {
    v: SESSION_VERSION,
    phone_hash: opts.include_phone_hash.then(|| hash_phone(&phone)),
    order_id,
    phone,
    iat: now,
    exp: now + ttl_ms,
  };

  let data = serde_json::to_vec(&payload).map_err(|e| AppError::Internal(format!("session encode: {}", e)))?;
  seal(&data, secret)
}

/// Verifies a possibly-absent token. Total and side-effect-free: any
/// structural, signature, syntactic or temporal problem yields `None`.
pub fn verify_session(secret: &[u8], token: Option<&str>) -> Option<SessionClaims> {
  let token = token?;
  let data = open(token, secret)?;
  let payload: SessionPayload = serde_json::from_slice(&data).ok()?;

  if payload.v != SESSION_VERSION {
    return None;
  }

  let order_id = validate_order_id(&payload.order_id)?;
  let phone = validate_phone(&payload.phone)?;

  let now = Utc::now().timestamp_millis();
  if payload.exp <= now {
    return None;
  }
  if payload.iat > now + MAX_FUTURE_IAT_MS {
    return None;
  }
  if payload.exp - payload.iat > MAX_LIFETIME_MS {
    return None;
  }

  let phone_hash = payload
    .phone_hash
    .filter(|h| h.len() == 64 && h.chars().all(|c| c.is_ascii_hexdigit()));

  Some(SessionClaims {
    order_id,
    phone,
    phone_hash,
  })
}

/// `base64url(payload) + "." + hex(hmac_sha256(payload))`.
pub(crate) fn seal(payload: &[u8], secret: &[u8]) -> Result<String, AppError> {
  let mut mac =
    HmacSha256::new_from_slice(secret).map_err(|e| AppError::Internal(format!("hmac init: {}", e)))?;
  mac.update(payload);
  let sig = mac.finalize().into_bytes();
  Ok(format!("{}.{}", URL_SAFE_NO_PAD.encode(payload), hex::encode(sig)))
}

/// Inverse of [`seal`]. Signature comparison is constant-time via
/// `Mac::verify_slice`. Any structural problem yields `None`.
pub(crate) fn open(token: &str, secret: &[u8]) -> Option<Vec<u8>> {
  let (b64, sig_hex) = token.split_once('.')?;
  if b64.is_empty() || sig_hex.is_empty() || sig_hex.contains('.') {
    return None;
  }

  let payload = URL_SAFE_NO_PAD.decode(b64).ok()?;
  let sig = hex::decode(sig_hex).ok()?;

  let mut mac = HmacSha256::new_from_slice(secret).ok()?;
  mac.update(&payload);
  mac.verify_slice(&sig).ok()?;

  Some(payload)
}

fn validate_order_id(raw: &str) -> Option<String> {
  let id = raw.trim();
  if id.is_empty() || id.len() < MIN_ORDER_ID_LEN || id.len() > MAX_ORDER_ID_LEN {
    return None;
  }
  // never allow anything path-like into storage keys
  if id.contains('/') || id.contains('\\') {
    return None;
  }
  Some(id.to_string())
}

fn validate_phone(raw: &str) -> Option<String> {
  let digits = normalize_phone_loose(raw);
  if digits.len() < MIN_PHONE_DIGITS || digits.len() > MAX_PHONE_DIGITS {
    return None;
  }
  Some(digits)
}

#[cfg(test)]
mod tests {
  use super::*;

  const SECRET: &[u8] = b"unit-test-secret-0123456789abcdef";
  const OTHER_SECRET: &[u8] = b"other-test-secret-0123456789abcd";

  fn forged_token(iat: i64, exp: i64) -> String {
    let payload = SessionPayload {
      v: SESSION_VERSION,
      order_id: "order-abc123".into(),
      phone: "09012345678".into(),
      phone_hash: None,
      iat,
      exp,
    };
    seal(&serde_json::to_vec(&payload).unwrap(), SECRET).unwrap()
  }

  #[test]
  fn round_trip_preserves_claims() {
    let token = sign_session(SECRET, "order-abc123", "090-1234-5678", SignOptions::default()).unwrap();
    let claims = verify_session(SECRET, Some(&token)).unwrap();
    assert_eq!(claims.order_id, "order-abc123");
    assert_eq!(claims.phone, "09012345678");
    assert_eq!(claims.phone_hash, None);
  }

  #[test]
  fn round_trip_with_phone_hash() {
    let opts = SignOptions {
      include_phone_hash: true,
      ..Default::default()
    };
    let token = sign_session(SECRET, "order-abc123", "09012345678", opts).unwrap();
    let claims = verify_session(SECRET, Some(&token)).unwrap();
    assert_eq!(claims.phone_hash, Some(hash_phone("09012345678")));
  }

  #[test]
  fn rejects_invalid_claims_at_signing() {
    assert!(sign_session(SECRET, "", "09012345678", SignOptions::default()).is_err());
    assert!(sign_session(SECRET, "ab", "09012345678", SignOptions::default()).is_err());
    assert!(sign_session(SECRET, "a/b/c-order", "09012345678", SignOptions::default()).is_err());
    assert!(sign_session(SECRET, &"x".repeat(129), "09012345678", SignOptions::default()).is_err());
    assert!(sign_session(SECRET, "order-abc123", "1234567", SignOptions::default()).is_err());
    assert!(sign_session(SECRET, "order-abc123", "1234567890123456", SignOptions::default()).is_err());
  }

  #[test]
  fn tampered_tokens_are_rejected() {
    let token = sign_session(SECRET, "order-abc123", "09012345678", SignOptions::default()).unwrap();

    // flip one character in every position of the token
    for i in 0..token.len() {
      let mut bytes = token.clone().into_bytes();
      bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
      if let Ok(mutated) = String::from_utf8(bytes) {
        if mutated == token {
          continue;
        }
        assert!(
          verify_session(SECRET, Some(&mutated)).is_none(),
          "mutation at byte {} was accepted",
          i
        );
      }
    }
  }

  #[test]
  fn wrong_secret_is_rejected() {
    let token = sign_session(SECRET, "order-abc123", "09012345678", SignOptions::default()).unwrap();
    assert!(verify_session(OTHER_SECRET, Some(&token)).is_none());
  }

  #[test]
  fn structural_garbage_yields_none() {
    for junk in [
      "",
      ".",
      "abc",
      "abc.def.ghi",
      "!!!.deadbeef",
      "bm90LWpzb24.deadbeef",
    ] {
      assert!(verify_session(SECRET, Some(junk)).is_none(), "accepted {junk:?}");
    }
    assert!(verify_session(SECRET, None).is_none());
  }

  #[test]
  fn expired_token_is_rejected() {
    let now = Utc::now().timestamp_millis();
    let token = forged_token(now - 10_000, now - 1_000);
    assert!(verify_session(SECRET, Some(&token)).is_none());
  }

  #[test]
  fn lifetime_over_thirty_days_is_rejected_even_if_unexpired() {
    let now = Utc::now().timestamp_millis();
    let thirty_one_days = 31 * 24 * 60 * 60 * 1000;
    let token = forged_token(now - thirty_one_days, now + 24 * 60 * 60 * 1000);
    assert!(verify_session(SECRET, Some(&token)).is_none());
  }

  #[test]
  fn long_requested_ttl_signs_but_fails_verification() {
    let opts = SignOptions {
      ttl: Some(Duration::days(31)),
      ..Default::default()
    };
    let token = sign_session(SECRET, "order-abc123", "09012345678", opts).unwrap();
    assert!(verify_session(SECRET, Some(&token)).is_none());
  }

  #[test]
  fn implausibly_future_iat_is_rejected() {
    let now = Utc::now().timestamp_millis();
    let token = forged_token(now + 10 * 60 * 1000, now + 7 * 24 * 60 * 60 * 1000);
    assert!(verify_session(SECRET, Some(&token)).is_none());
  }

  #[test]
  fn wrong_version_is_rejected() {
    let payload = serde_json::json!({
      "v": 2,
      "orderId": "order-abc123",
      "phone": "09012345678",
      "iat": Utc::now().timestamp_millis(),
      "exp": Utc::now().timestamp_millis() + 60_000,
    });
    let token = seal(payload.to_string().as_bytes(), SECRET).unwrap();
    assert!(verify_session(SECRET, Some(&token)).is_none());
  }

  #[test]
  fn malformed_phone_hash_is_dropped_not_fatal() {
    let now = Utc::now().timestamp_millis();
    let payload = serde_json::json!({
      "v": 1,
      "orderId": "order-abc123",
      "phone": "09012345678",
      "phoneHash": "not-hex",
      "iat": now,
      "exp": now + 60_000,
    });
    let token = seal(payload.to_string().as_bytes(), SECRET).unwrap();
    let claims = verify_session(SECRET, Some(&token)).unwrap();
    assert_eq!(claims.phone_hash, None);
  }
}

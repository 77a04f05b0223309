// src/auth/identity.rs

//! Boundary adapter for the identity provider.
//!
//! The core never issues admin identities; it only verifies tokens it is
//! handed and extracts a subject id plus a privileged-role flag. The provider
//! in this deployment signs tokens with a shared HMAC secret using the same
//! envelope as customer sessions, but callers only ever see the
//! [`IdentityVerifier`] port.

use crate::auth::session::{open, seal};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

const IDENTITY_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
  pub subject_id: String,
  pub privileged: bool,
}

/// Verifies a presented identity credential. Implementations must never
/// error: any failure is an absent identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
  async fn verify(&self, token: &str) -> Option<IdentityClaims>;

  /// Like [`verify`](Self::verify), but additionally requires the elevated
  /// role claim.
  async fn verify_privileged(&self, token: &str) -> Option<IdentityClaims> {
    self.verify(token).await.filter(|claims| claims.privileged)
  }
}

#[derive(Debug, Serialize, Deserialize)]
struct IdentityPayload {
  v: u32,
  sub: String,
  #[serde(default)]
  admin: bool,
  iat: i64,
  exp: i64,
}

pub struct HmacIdentityVerifier {
  secret: Vec<u8>,
}

impl HmacIdentityVerifier {
  pub fn new(secret: impl Into<Vec<u8>>) -> Self {
    Self { secret: secret.into() }
  }

  /// Mints a provider-side token. Lives here so tests and operator tooling
  /// can produce credentials the verifier accepts; the storefront itself
  /// never calls this on a request path.
  pub fn issue(secret: &[u8], subject_id: &str, privileged: bool, ttl: Duration) -> Option<String> {
    let now = Utc::now().timestamp_millis();
    let payload = IdentityPayload {
      v: IDENTITY_VERSION,
      sub: subject_id.to_string(),
      admin: privileged,
      iat: now,
      exp: now + ttl.num_milliseconds(),
    };
    let data = serde_json::to_vec(&payload).ok()?;
    seal(&data, secret).ok()
  }
}

#[async_trait]
impl IdentityVerifier for HmacIdentityVerifier {
  async fn verify(&self, token: &str) -> Option<IdentityClaims> {
    let data = open(token, &self.secret)?;
    let payload: IdentityPayload = serde_json::from_slice(&data).ok()?;

    if payload.v != IDENTITY_VERSION {
      return None;
    }

    let subject_id = payload.sub.trim().to_string();
    if subject_id.is_empty() {
      return None;
    }

    let now = Utc::now().timestamp_millis();
    if payload.exp <= now {
      warn!("identity token expired");
      return None;
    }

    Some(IdentityClaims {
      subject_id,
      privileged: payload.admin,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SECRET: &[u8] = b"identity-test-secret-0123456789ab";

  #[tokio::test]
  async fn verifies_a_privileged_token() {
    let verifier = HmacIdentityVerifier::new(SECRET);
    let token = HmacIdentityVerifier::issue(SECRET, "admin-1", true, Duration::hours(1)).unwrap();

    let claims = verifier.verify_privileged(&token).await.unwrap();
    assert_eq!(claims.subject_id, "admin-1");
    assert!(claims.privileged);
  }

  #[tokio::test]
  async fn unprivileged_token_fails_the_privileged_check_but_still_verifies() {
    let verifier = HmacIdentityVerifier::new(SECRET);
    let token = HmacIdentityVerifier::issue(SECRET, "customer-7", false, Duration::hours(1)).unwrap();

    assert!(verifier.verify_privileged(&token).await.is_none());
    let claims = verifier.verify(&token).await.unwrap();
    assert!(!claims.privileged);
  }

  #[tokio::test]
  async fn expired_or_garbage_tokens_are_absent() {
    let verifier = HmacIdentityVerifier::new(SECRET);
    let expired = HmacIdentityVerifier::issue(SECRET, "admin-1", true, Duration::milliseconds(-1000)).unwrap();

    assert!(verifier.verify(&expired).await.is_none());
    assert!(verifier.verify("garbage").await.is_none());
    assert!(verifier.verify("").await.is_none());
  }

  #[tokio::test]
  async fn wrong_secret_is_absent() {
    let verifier = HmacIdentityVerifier::new(SECRET);
    let token =
      HmacIdentityVerifier::issue(b"another-secret-0123456789abcdef00", "admin-1", true, Duration::hours(1))
        .unwrap();
    assert!(verifier.verify(&token).await.is_none());
  }
}

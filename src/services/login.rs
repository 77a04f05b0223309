// src/services/login.rs

//! Customer login flows. Both paths resolve "who is this" to the most recent
//! order and mint a session token scoped to exactly that order.

use crate::auth::hashing::{normalize_phone_loose, verify_pin};
use crate::auth::session::{sign_session, SignOptions};
use crate::errors::{AppError, Result};
use crate::models::Order;
use crate::state::AppState;
use tracing::{info, instrument, warn};

/// Successful login: the minted token plus the order it is scoped to.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
  pub token: String,
  pub order: Order,
}

/// Phone + 4-digit PIN against the most recent order for that phone.
///
/// The PIN space is tiny and there is no rate limiting here; that weakness
/// is a recorded product decision, not an oversight (see DESIGN.md).
#[instrument(name = "login::customer_login", skip_all)]
pub async fn customer_login(state: &AppState, phone: &str, pin: &str) -> Result<LoginOutcome> {
  let phone_norm = normalize_phone_loose(phone);
  let pin = pin.trim();

  if phone_norm.is_empty() || pin.is_empty() {
    return Err(AppError::Validation("Missing phone/pin".to_string()));
  }
  if pin.len() != 4 || !pin.chars().all(|c| c.is_ascii_digit()) {
    return Err(AppError::Validation("PIN must be 4 digits".to_string()));
  }

  let order = state
    .store
    .latest_order_by_phone(&phone_norm)
    .await?
    .ok_or_else(|| AppError::NotFound("No order found for this phone".to_string()))?;

  if order.customer.pin_hash.trim().is_empty() {
    return Err(AppError::Validation("Order has no access PIN configured".to_string()));
  }

  if !verify_pin(&order.customer.pin_hash, pin)? {
    warn!(order_id = %order.id, "customer login: PIN mismatch");
    return Err(AppError::Unauthenticated);
  }

  let token = sign_session(
    state.config.session_secret.as_bytes(),
    &order.id,
    &phone_norm,
    SignOptions::default(),
  )?;

  info!(order_id = %order.id, "customer session issued");
  Ok(LoginOutcome { token, order })
}

/// Federated login: verify the identity token, then resolve the subject to
/// its most recent order. The privileged claim is not required here.
#[instrument(name = "login::federated_login", skip_all)]
pub async fn federated_login(state: &AppState, id_token: &str) -> Result<LoginOutcome> {
  let id_token = id_token.trim();
  if id_token.is_empty() {
    return Err(AppError::Validation("Missing idToken".to_string()));
  }

  let claims = state
    .identity
    .verify(id_token)
    .await
    .ok_or(AppError::Unauthenticated)?;

  let order = state
    .store
    .latest_order_by_subject(&claims.subject_id)
    .await?
    .ok_or_else(|| AppError::NotFound("No order found for this account".to_string()))?;

  let phone_norm = normalize_phone_loose(&order.customer.phone_norm);
  if phone_norm.is_empty() {
    return Err(AppError::Validation("Order has no normalized phone".to_string()));
  }

  let token = sign_session(
    state.config.session_secret.as_bytes(),
    &order.id,
    &phone_norm,
    SignOptions::default(),
  )?;

  info!(order_id = %order.id, subject_id = %claims.subject_id, "federated customer session issued");
  Ok(LoginOutcome { token, order })
}

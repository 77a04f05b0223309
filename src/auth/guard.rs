// src/auth/guard.rs

//! Order access guard.
//!
//! Callers are resolved once at the web boundary into a tagged union and
//! passed explicitly into every core operation; nothing below the boundary
//! re-derives identity.

use crate::auth::hashing::{hash_phone, normalize_phone_loose};
use crate::auth::session::SessionClaims;
use crate::errors::AppError;
use crate::models::{Order, SenderRole};

#[derive(Debug, Clone)]
pub enum Caller {
  /// Admin authenticated through the identity provider with the elevated
  /// role claim.
  Privileged { subject_id: String },
  /// Customer carrying a session token scoped to one order.
  CustomerSession(SessionClaims),
  Unauthenticated,
}

impl Caller {
  pub fn is_privileged(&self) -> bool {
    matches!(self, Caller::Privileged { .. })
  }

  pub fn sender_role(&self) -> SenderRole {
    match self {
      Caller::Privileged { .. } => SenderRole::Admin,
      _ => SenderRole::Customer,
    }
  }

  /// Identity subject recorded on admin-sent messages.
  pub fn sender_id(&self) -> Option<String> {
    match self {
      Caller::Privileged { subject_id } => Some(subject_id.clone()),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  Allowed,
  Denied,
}

impl Access {
  pub fn require(self) -> Result<(), AppError> {
    match self {
      Access::Allowed => Ok(()),
      Access::Denied => Err(AppError::Forbidden),
    }
  }
}

/// Decides whether `caller` may read/write `order`.
///
/// Privileged callers may act on any order. A customer session is scoped to
/// exactly one order at mint time: the session's order id must equal the
/// target's id AND the session phone must match the order's stored phone:
/// against the stored one-way phone hash when present, else a loose
/// normalized-digit equality. Strict equality only; cross-order access stays
/// structurally impossible even if another order's id leaks.
pub fn authorize(caller: &Caller, order: &Order) -> Access {
  match caller {
    Caller::Privileged { .. } => Access::Allowed,
    Caller::CustomerSession(session) => {
      if session.order_id != order.id {
        return Access::Denied;
      }

      let session_phone = normalize_phone_loose(&session.phone);
      if session_phone.is_empty() {
        return Access::Denied;
      }

      let stored_hash = order.customer.phone_hash.trim();
      if !stored_hash.is_empty() {
        if hash_phone(&session_phone) == stored_hash {
          Access::Allowed
        } else {
          Access::Denied
        }
      } else if normalize_phone_loose(&order.customer.phone) == session_phone {
        Access::Allowed
      } else {
        Access::Denied
      }
    }
    Caller::Unauthenticated => Access::Denied,
  }
}

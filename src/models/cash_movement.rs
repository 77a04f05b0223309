// src/models/cash_movement.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
  In,
  Out,
}

impl MovementKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      MovementKind::In => "in",
      MovementKind::Out => "out",
    }
  }
}

impl fmt::Display for MovementKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for MovementKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "in" => Ok(MovementKind::In),
      "out" => Ok(MovementKind::Out),
      other => Err(format!("unknown movement kind '{}'", other)),
    }
  }
}

/// A ledger line. Sale entries are created exactly once per paid order and
/// carry the deterministic id `order_{order_id}`; manual entries get a UUID.
#[derive(Debug, Clone, Serialize)]
pub struct CashMovement {
  pub id: String,
  pub kind: MovementKind,
  pub category: String,
  pub amount_cents: i64,
  pub items_summary: Option<String>,
  pub note: Option<String>,
  pub order_id: Option<String>,
  pub occurred_at: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
}

/// Deterministic ledger id for the sale entry of an order. Keying by order id
/// is what guarantees at-most-one sale entry regardless of retries.
pub fn sale_movement_id(order_id: &str) -> String {
  format!("order_{}", order_id)
}

#[derive(Debug, Clone)]
pub struct NewCashMovement {
  pub id: String,
  pub kind: MovementKind,
  pub category: String,
  pub amount_cents: i64,
  pub items_summary: Option<String>,
  pub note: Option<String>,
  pub order_id: Option<String>,
  pub occurred_at: Option<DateTime<Utc>>,
}

impl NewCashMovement {
  /// A manual adjustment entered from the back office.
  pub fn manual(kind: MovementKind, category: String, amount_cents: i64, note: Option<String>) -> Self {
    Self {
      id: uuid::Uuid::new_v4().simple().to_string(),
      kind,
      category,
      amount_cents,
      items_summary: None,
      note,
      order_id: None,
      occurred_at: None,
    }
  }
}

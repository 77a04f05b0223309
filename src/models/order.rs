// src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of an order. Transitions are monotonic: `pending` may move to
/// `paid` or `cancelled`, `paid` may move to `delivered`. Re-marking a paid
/// order as paid is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Paid,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Paid => "paid",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pending" => Ok(OrderStatus::Pending),
      "paid" => Ok(OrderStatus::Paid),
      "delivered" => Ok(OrderStatus::Delivered),
      "cancelled" => Ok(OrderStatus::Cancelled),
      other => Err(format!("unknown order status '{}'", other)),
    }
  }
}

/// Customer descriptor captured at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
  pub name: String,
  /// Raw phone as typed by the customer.
  pub phone: String,
  /// Digits-only form, the value session tokens carry.
  pub phone_norm: String,
  /// SHA-256 hex of `phone_norm`; the guard prefers this over raw comparison.
  pub phone_hash: String,
  /// Argon2 hash of the 4-digit access PIN. Never leaves the server.
  #[serde(skip_serializing_if = "String::is_empty", default)]
  pub pin_hash: String,
  /// Federated identity subject, when the customer checked out signed in.
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub subject_id: Option<String>,
}

/// One line item, snapshotted at checkout. Prices and names are immutable
/// copies, never re-read from the live catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
  pub product_id: String,
  pub name_snapshot: String,
  pub qty: u32,
  pub unit_price_cents: i64,
  pub unit_cost_cents: i64,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub custom_text: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub note: Option<String>,
}

impl OrderItem {
  /// The customization string shown next to the item, if any.
  pub fn customization(&self) -> Option<&str> {
    resolve_customization(&[self.custom_text.as_deref(), self.note.as_deref()])
  }
}

/// Resolves a customization string from an ordered list of candidate fields:
/// first non-empty (after trimming) wins.
pub fn resolve_customization<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
  for candidate in candidates {
    if let Some(raw) = candidate {
      let trimmed = raw.trim();
      if !trimmed.is_empty() {
        return Some(trimmed);
      }
    }
  }
  None
}

/// Totals computed once at checkout from the item snapshots.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderTotals {
  pub revenue_cents: i64,
  pub cost_cents: i64,
  pub profit_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
  pub id: String,
  pub status: OrderStatus,
  pub customer: Customer,
  pub items: Vec<OrderItem>,
  pub totals: OrderTotals,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub paid_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
  pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
  /// "Latte x2 (oat milk), Bagel x1". Used by the chat order summary and
  /// the ledger note for a sale.
  pub fn items_summary(&self) -> String {
    let parts: Vec<String> = self
      .items
      .iter()
      .filter(|it| !it.name_snapshot.trim().is_empty())
      .map(|it| {
        let name = it.name_snapshot.trim();
        let base = if it.qty > 0 {
          format!("{} x{}", name, it.qty)
        } else {
          name.to_string()
        };
        match it.customization() {
          Some(custom) => format!("{} ({})", base, custom),
          None => base,
        }
      })
      .collect();
    parts.join(", ")
  }
}

/// Input for `OrderStore::create_order`; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub customer: Customer,
  pub items: Vec<OrderItem>,
  pub totals: OrderTotals,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(name: &str, qty: u32, custom: Option<&str>, note: Option<&str>) -> OrderItem {
    OrderItem {
      product_id: "prod-1".into(),
      name_snapshot: name.into(),
      qty,
      unit_price_cents: 500,
      unit_cost_cents: 200,
      custom_text: custom.map(Into::into),
      note: note.map(Into::into),
    }
  }

  fn order_with(items: Vec<OrderItem>) -> Order {
    Order {
      id: "order-1".into(),
      status: OrderStatus::Pending,
      customer: Customer {
        name: "Aki".into(),
        phone: "090-1234-5678".into(),
        phone_norm: "09012345678".into(),
        phone_hash: String::new(),
        pin_hash: String::new(),
        subject_id: None,
      },
      items,
      totals: OrderTotals {
        revenue_cents: 1000,
        cost_cents: 400,
        profit_cents: 600,
      },
      created_at: Utc::now(),
      updated_at: Utc::now(),
      paid_at: None,
      delivered_at: None,
      cancelled_at: None,
    }
  }

  #[test]
  fn resolver_picks_first_non_empty_candidate() {
    assert_eq!(resolve_customization(&[None, Some("  "), Some("no onions")]), Some("no onions"));
    assert_eq!(resolve_customization(&[Some(" gift wrap ")]), Some("gift wrap"));
    assert_eq!(resolve_customization(&[None, Some("")]), None);
  }

  #[test]
  fn customization_prefers_custom_text_over_note() {
    let it = item("Latte", 1, Some("oat milk"), Some("extra hot"));
    assert_eq!(it.customization(), Some("oat milk"));
    let it = item("Latte", 1, Some("   "), Some("extra hot"));
    assert_eq!(it.customization(), Some("extra hot"));
  }

  #[test]
  fn items_summary_includes_quantities_and_customizations() {
    let order = order_with(vec![
      item("Latte", 2, Some("oat milk"), None),
      item("Bagel", 1, None, None),
      item("  ", 3, None, None), // nameless items are skipped
    ]);
    assert_eq!(order.items_summary(), "Latte x2 (oat milk), Bagel x1");
  }

  #[test]
  fn status_round_trips_through_strings() {
    for status in [
      OrderStatus::Pending,
      OrderStatus::Paid,
      OrderStatus::Delivered,
      OrderStatus::Cancelled,
    ] {
      assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
    }
    assert!("shipped".parse::<OrderStatus>().is_err());
  }
}

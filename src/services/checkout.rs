// src/services/checkout.rs

//! Checkout: turns a cart into a pending order with immutable snapshots.

use crate::auth::hashing::{hash_phone, hash_pin, normalize_phone_loose};
use crate::errors::{AppError, Result};
use crate::models::{Customer, NewOrder, Order, OrderItem, OrderTotals};
use crate::state::AppState;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct CheckoutItem {
  pub product_id: String,
  pub qty: u32,
  pub custom_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
  pub name: String,
  pub phone: String,
  pub pin: String,
  /// Federated identity subject when the customer checked out signed in.
  pub subject_id: Option<String>,
  pub items: Vec<CheckoutItem>,
}

fn is_four_digit_pin(pin: &str) -> bool {
  pin.len() == 4 && pin.chars().all(|c| c.is_ascii_digit())
}

/// Creates a pending order. Prices, costs and names are copied out of the
/// catalog here and never re-read; totals are computed once from those
/// snapshots.
#[instrument(name = "checkout::place_order", skip(state, request), fields(items = request.items.len()))]
pub async fn place_order(state: &AppState, request: CheckoutRequest) -> Result<Order> {
  let name = request.name.trim().to_string();
  if name.is_empty() {
    return Err(AppError::Validation("Customer name is required".to_string()));
  }

  let phone_norm = normalize_phone_loose(&request.phone);
  if phone_norm.len() < 8 || phone_norm.len() > 15 {
    return Err(AppError::Validation("Phone must normalize to 8-15 digits".to_string()));
  }

  let pin = request.pin.trim();
  if !is_four_digit_pin(pin) {
    return Err(AppError::Validation("PIN must be 4 digits".to_string()));
  }

  if request.items.is_empty() {
    return Err(AppError::Validation("Order needs at least one item".to_string()));
  }

  let mut items = Vec::with_capacity(request.items.len());
  for cart_item in &request.items {
    if cart_item.qty < 1 {
      return Err(AppError::Validation("Item quantity must be at least 1".to_string()));
    }

    let product = state
      .catalog
      .find_product(&cart_item.product_id)
      .await?
      .filter(|p| p.active)
      .ok_or_else(|| AppError::NotFound(format!("Product {} not found", cart_item.product_id)))?;

    items.push(OrderItem {
      product_id: product.id,
      name_snapshot: product.name,
      qty: cart_item.qty,
      unit_price_cents: product.sale_price_cents,
      unit_cost_cents: product.unit_cost_cents,
      custom_text: cart_item
        .custom_text
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from),
      note: None,
    });
  }

  let revenue_cents: i64 = items.iter().map(|it| it.unit_price_cents * i64::from(it.qty)).sum();
  let cost_cents: i64 = items.iter().map(|it| it.unit_cost_cents * i64::from(it.qty)).sum();
  let totals = OrderTotals {
    revenue_cents,
    cost_cents,
    profit_cents: revenue_cents - cost_cents,
  };

  let customer = Customer {
    name,
    phone: request.phone.trim().to_string(),
    phone_hash: hash_phone(&phone_norm),
    phone_norm,
    pin_hash: hash_pin(pin)?,
    subject_id: request.subject_id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
  };

  let order = state
    .store
    .create_order(NewOrder {
      customer,
      items,
      totals,
    })
    .await?;

  info!(order_id = %order.id, revenue_cents, "order placed");
  Ok(order)
}

// src/db/memory.rs

//! In-memory store adapter.
//!
//! Every method takes the single mutex for its whole body, which makes each
//! operation atomic the same way the Postgres adapter's transactions do,
//! including the mark-paid read-modify-write.

use crate::db::{MarkPaidOutcome, OrderStore, ProductCatalog};
use crate::errors::{AppError, Result};
use crate::models::cash_movement::sale_movement_id;
use crate::models::{
  CashMovement, ChatMessage, MovementKind, NewCashMovement, NewMessage, NewOrder, NewProduct, Order, OrderStatus,
  Product, ProductUpdate,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
struct MemoryInner {
  orders: HashMap<String, Order>,
  /// Messages per order, in insertion order.
  messages: HashMap<String, Vec<ChatMessage>>,
  movements: Vec<CashMovement>,
  products: HashMap<String, Product>,
}

#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<MemoryInner>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn mint_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn create_order(&self, new_order: NewOrder) -> Result<Order> {
    let now = Utc::now();
    let order = Order {
      id: Self::mint_id(),
      status: OrderStatus::Pending,
      customer: new_order.customer,
      items: new_order.items,
      totals: new_order.totals,
      created_at: now,
      updated_at: now,
      paid_at: None,
      delivered_at: None,
      cancelled_at: None,
    };

    let mut inner = self.inner.lock();
    inner.messages.entry(order.id.clone()).or_default();
    inner.orders.insert(order.id.clone(), order.clone());
    Ok(order)
  }

  async fn find_order(&self, order_id: &str) -> Result<Option<Order>> {
    Ok(self.inner.lock().orders.get(order_id).cloned())
  }

  async fn latest_order_by_phone(&self, phone_norm: &str) -> Result<Option<Order>> {
    let inner = self.inner.lock();
    let latest = inner
      .orders
      .values()
      .filter(|o| o.customer.phone_norm == phone_norm)
      .max_by_key(|o| o.created_at);
    Ok(latest.cloned())
  }

  async fn latest_order_by_subject(&self, subject_id: &str) -> Result<Option<Order>> {
    let inner = self.inner.lock();
    let latest = inner
      .orders
      .values()
      .filter(|o| o.customer.subject_id.as_deref() == Some(subject_id))
      .max_by_key(|o| o.created_at);
    Ok(latest.cloned())
  }

  async fn list_recent_orders(&self, limit: usize) -> Result<Vec<Order>> {
    let inner = self.inner.lock();
    let mut orders: Vec<Order> = inner.orders.values().cloned().collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders.truncate(limit);
    Ok(orders)
  }

  async fn mark_paid(&self, order_id: &str) -> Result<MarkPaidOutcome> {
    // single lock scope = the whole transaction
    let mut inner = self.inner.lock();

    let order = inner
      .orders
      .get(order_id)
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

    if order.status == OrderStatus::Paid {
      return Ok(MarkPaidOutcome::AlreadyPaid);
    }

    let amount = order.totals.revenue_cents;
    if amount <= 0 {
      return Err(AppError::InvalidTotals(format!(
        "order {} has non-positive revenue {}",
        order_id, amount
      )));
    }

    let ledger_id = sale_movement_id(order_id);
    let items_summary = order.items_summary();
    let now = Utc::now();

    if !inner.movements.iter().any(|m| m.id == ledger_id) {
      let note = if items_summary.is_empty() {
        format!("Sale for order {}", order_id)
      } else {
        format!("Sale: {}", items_summary)
      };
      inner.movements.push(CashMovement {
        id: ledger_id,
        kind: MovementKind::In,
        category: "sale".to_string(),
        amount_cents: amount,
        items_summary: Some(items_summary).filter(|s| !s.is_empty()),
        note: Some(note),
        order_id: Some(order_id.to_string()),
        occurred_at: now,
        created_at: now,
      });
    }

    let order = inner
      .orders
      .get_mut(order_id)
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
    order.status = OrderStatus::Paid;
    order.paid_at = Some(now);
    order.updated_at = now;

    Ok(MarkPaidOutcome::Paid)
  }

  async fn mark_delivered(&self, order_id: &str) -> Result<Order> {
    let mut inner = self.inner.lock();
    let order = inner
      .orders
      .get_mut(order_id)
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

    match order.status {
      OrderStatus::Delivered => Ok(order.clone()),
      OrderStatus::Paid => {
        let now = Utc::now();
        order.status = OrderStatus::Delivered;
        order.delivered_at = Some(now);
        order.updated_at = now;
        Ok(order.clone())
      }
      other => Err(AppError::Validation(format!(
        "cannot deliver an order in status '{}'",
        other
      ))),
    }
  }

  async fn mark_cancelled(&self, order_id: &str) -> Result<Order> {
    let mut inner = self.inner.lock();
    let order = inner
      .orders
      .get_mut(order_id)
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

    match order.status {
      OrderStatus::Cancelled => Ok(order.clone()),
      OrderStatus::Pending => {
        let now = Utc::now();
        order.status = OrderStatus::Cancelled;
        order.cancelled_at = Some(now);
        order.updated_at = now;
        Ok(order.clone())
      }
      other => Err(AppError::Validation(format!(
        "cannot cancel an order in status '{}'",
        other
      ))),
    }
  }

  async fn append_message(&self, order_id: &str, message: NewMessage) -> Result<ChatMessage> {
    let mut inner = self.inner.lock();

    let now = Utc::now();
    {
      let order = inner
        .orders
        .get_mut(order_id)
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;
      order.updated_at = now;
    }

    let log = inner.messages.entry(order_id.to_string()).or_default();
    if log.iter().any(|m| m.id == message.id) {
      return Err(AppError::Internal(format!("duplicate message id {}", message.id)));
    }

    let stored = ChatMessage {
      id: message.id,
      order_id: order_id.to_string(),
      sender_role: message.sender_role,
      sender_id: message.sender_id,
      text: message.text,
      image_url: message.image_url,
      image_path: message.image_path,
      created_at: now,
    };
    log.push(stored.clone());
    Ok(stored)
  }

  async fn list_messages(&self, order_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
    let inner = self.inner.lock();
    let log = inner.messages.get(order_id).cloned().unwrap_or_default();
    // insertion order already is creation order with insertion tie-break
    Ok(log.into_iter().take(limit).collect())
  }

  async fn insert_cash_movement(&self, movement: NewCashMovement) -> Result<CashMovement> {
    let mut inner = self.inner.lock();
    if inner.movements.iter().any(|m| m.id == movement.id) {
      return Err(AppError::Validation(format!("cash movement {} already exists", movement.id)));
    }

    let now = Utc::now();
    let stored = CashMovement {
      id: movement.id,
      kind: movement.kind,
      category: movement.category,
      amount_cents: movement.amount_cents,
      items_summary: movement.items_summary,
      note: movement.note,
      order_id: movement.order_id,
      occurred_at: movement.occurred_at.unwrap_or(now),
      created_at: now,
    };
    inner.movements.push(stored.clone());
    Ok(stored)
  }

  async fn list_cash_movements(&self, limit: usize) -> Result<Vec<CashMovement>> {
    let inner = self.inner.lock();
    let mut movements = inner.movements.clone();
    movements.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    movements.truncate(limit);
    Ok(movements)
  }
}

#[async_trait]
impl ProductCatalog for MemoryStore {
  async fn create_product(&self, new_product: NewProduct) -> Result<Product> {
    let product = Product {
      id: Self::mint_id(),
      name: new_product.name,
      sale_price_cents: new_product.sale_price_cents,
      unit_cost_cents: new_product.unit_cost_cents,
      photos: new_product.photos,
      active: new_product.active,
      created_at: Utc::now(),
    };
    self.inner.lock().products.insert(product.id.clone(), product.clone());
    Ok(product)
  }

  async fn update_product(&self, product_id: &str, update: ProductUpdate) -> Result<Product> {
    let mut inner = self.inner.lock();
    let product = inner
      .products
      .get_mut(product_id)
      .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;

    if let Some(name) = update.name {
      product.name = name;
    }
    if let Some(price) = update.sale_price_cents {
      product.sale_price_cents = price;
    }
    if let Some(cost) = update.unit_cost_cents {
      product.unit_cost_cents = cost;
    }
    if let Some(photos) = update.photos {
      product.photos = photos;
    }
    if let Some(active) = update.active {
      product.active = active;
    }
    Ok(product.clone())
  }

  async fn find_product(&self, product_id: &str) -> Result<Option<Product>> {
    Ok(self.inner.lock().products.get(product_id).cloned())
  }

  async fn list_active_products(&self) -> Result<Vec<Product>> {
    let inner = self.inner.lock();
    let mut products: Vec<Product> = inner.products.values().filter(|p| p.active).cloned().collect();
    products.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(products)
  }
}

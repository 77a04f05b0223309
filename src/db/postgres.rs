// src/db/postgres.rs

//! Postgres adapter for the store ports.
//!
//! Orders keep their customer descriptor and item snapshots as JSONB
//! documents; messages live in a subordinate table ordered by creation
//! timestamp with a serial tie-break. The mark-paid transition runs as a
//! single transaction with a row lock so concurrent duplicate calls cannot
//! double-write the ledger.

use crate::db::{MarkPaidOutcome, OrderStore, ProductCatalog};
use crate::errors::{AppError, Result};
use crate::models::cash_movement::sale_movement_id;
use crate::models::{
  CashMovement, ChatMessage, MovementKind, NewCashMovement, NewMessage, NewOrder, NewProduct, Order, OrderStatus,
  Product, ProductUpdate, SenderRole,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  fn mint_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
  }
}

#[derive(Debug, FromRow)]
struct OrderRow {
  id: String,
  status: String,
  customer: Json<crate::models::Customer>,
  items: Json<Vec<crate::models::OrderItem>>,
  revenue_cents: i64,
  cost_cents: i64,
  profit_cents: i64,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
  paid_at: Option<DateTime<Utc>>,
  delivered_at: Option<DateTime<Utc>>,
  cancelled_at: Option<DateTime<Utc>>,
}

impl OrderRow {
  fn into_order(self) -> Result<Order> {
    let status = self
      .status
      .parse::<OrderStatus>()
      .map_err(AppError::Internal)?;
    Ok(Order {
      id: self.id,
      status,
      customer: self.customer.0,
      items: self.items.0,
      totals: crate::models::OrderTotals {
        revenue_cents: self.revenue_cents,
        cost_cents: self.cost_cents,
        profit_cents: self.profit_cents,
      },
      created_at: self.created_at,
      updated_at: self.updated_at,
      paid_at: self.paid_at,
      delivered_at: self.delivered_at,
      cancelled_at: self.cancelled_at,
    })
  }
}

const SELECT_ORDER: &str = "SELECT id, status, customer, items, revenue_cents, cost_cents, profit_cents, \
   created_at, updated_at, paid_at, delivered_at, cancelled_at FROM orders";

#[derive(Debug, FromRow)]
struct MessageRow {
  id: String,
  order_id: String,
  sender_role: String,
  sender_id: Option<String>,
  text: String,
  image_url: Option<String>,
  image_path: Option<String>,
  created_at: DateTime<Utc>,
}

impl MessageRow {
  fn into_message(self) -> ChatMessage {
    ChatMessage {
      id: self.id,
      order_id: self.order_id,
      // unknown roles degrade to customer, matching the read path's
      // tolerance for historical rows
      sender_role: if self.sender_role == "admin" {
        SenderRole::Admin
      } else {
        SenderRole::Customer
      },
      sender_id: self.sender_id,
      text: self.text,
      image_url: self.image_url,
      image_path: self.image_path,
      created_at: self.created_at,
    }
  }
}

#[derive(Debug, FromRow)]
struct MovementRow {
  id: String,
  kind: String,
  category: String,
  amount_cents: i64,
  items_summary: Option<String>,
  note: Option<String>,
  order_id: Option<String>,
  occurred_at: DateTime<Utc>,
  created_at: DateTime<Utc>,
}

impl MovementRow {
  fn into_movement(self) -> Result<CashMovement> {
    let kind = self.kind.parse::<MovementKind>().map_err(AppError::Internal)?;
    Ok(CashMovement {
      id: self.id,
      kind,
      category: self.category,
      amount_cents: self.amount_cents,
      items_summary: self.items_summary,
      note: self.note,
      order_id: self.order_id,
      occurred_at: self.occurred_at,
      created_at: self.created_at,
    })
  }
}

#[derive(Debug, FromRow)]
struct ProductRow {
  id: String,
  name: String,
  sale_price_cents: i64,
  unit_cost_cents: i64,
  photos: Json<Vec<String>>,
  active: bool,
  created_at: DateTime<Utc>,
}

impl ProductRow {
  fn into_product(self) -> Product {
    Product {
      id: self.id,
      name: self.name,
      sale_price_cents: self.sale_price_cents,
      unit_cost_cents: self.unit_cost_cents,
      photos: self.photos.0,
      active: self.active,
      created_at: self.created_at,
    }
  }
}

#[async_trait]
impl OrderStore for PgStore {
  async fn create_order(&self, new_order: NewOrder) -> Result<Order> {
    let id = Self::mint_id();
    let now = Utc::now();

    sqlx::query(
      "INSERT INTO orders (id, status, customer, items, revenue_cents, cost_cents, profit_cents, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)",
    )
    .bind(&id)
    .bind(OrderStatus::Pending.as_str())
    .bind(Json(&new_order.customer))
    .bind(Json(&new_order.items))
    .bind(new_order.totals.revenue_cents)
    .bind(new_order.totals.cost_cents)
    .bind(new_order.totals.profit_cents)
    .bind(now)
    .execute(&self.pool)
    .await?;

    Ok(Order {
      id,
      status: OrderStatus::Pending,
      customer: new_order.customer,
      items: new_order.items,
      totals: new_order.totals,
      created_at: now,
      updated_at: now,
      paid_at: None,
      delivered_at: None,
      cancelled_at: None,
    })
  }

  async fn find_order(&self, order_id: &str) -> Result<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!("{} WHERE id = $1", SELECT_ORDER))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    row.map(OrderRow::into_order).transpose()
  }

  async fn latest_order_by_phone(&self, phone_norm: &str) -> Result<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
      "{} WHERE customer->>'phone_norm' = $1 ORDER BY created_at DESC LIMIT 1",
      SELECT_ORDER
    ))
    .bind(phone_norm)
    .fetch_optional(&self.pool)
    .await?;
    row.map(OrderRow::into_order).transpose()
  }

  async fn latest_order_by_subject(&self, subject_id: &str) -> Result<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
      "{} WHERE customer->>'subject_id' = $1 ORDER BY created_at DESC LIMIT 1",
      SELECT_ORDER
    ))
    .bind(subject_id)
    .fetch_optional(&self.pool)
    .await?;
    row.map(OrderRow::into_order).transpose()
  }

  async fn list_recent_orders(&self, limit: usize) -> Result<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
      "{} ORDER BY created_at DESC LIMIT $1",
      SELECT_ORDER
    ))
    .bind(limit as i64)
    .fetch_all(&self.pool)
    .await?;
    rows.into_iter().map(OrderRow::into_order).collect()
  }

  async fn mark_paid(&self, order_id: &str) -> Result<MarkPaidOutcome> {
    let mut tx = self.pool.begin().await?;

    let row = sqlx::query_as::<_, OrderRow>(&format!("{} WHERE id = $1 FOR UPDATE", SELECT_ORDER))
      .bind(order_id)
      .fetch_optional(&mut *tx)
      .await?;
    let order = row
      .map(OrderRow::into_order)
      .transpose()?
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

    if order.status == OrderStatus::Paid {
      // idempotent: commit with no writes
      tx.commit().await?;
      return Ok(MarkPaidOutcome::AlreadyPaid);
    }

    let amount = order.totals.revenue_cents;
    if amount <= 0 {
      // dropping the transaction rolls it back; nothing was written
      return Err(AppError::InvalidTotals(format!(
        "order {} has non-positive revenue {}",
        order_id, amount
      )));
    }

    let items_summary = order.items_summary();
    let note = if items_summary.is_empty() {
      format!("Sale for order {}", order_id)
    } else {
      format!("Sale: {}", items_summary)
    };

    // keyed by order id: at most one sale entry no matter how often this runs
    sqlx::query(
      "INSERT INTO cash_movements (id, kind, category, amount_cents, items_summary, note, order_id, occurred_at, created_at) \
       VALUES ($1, 'in', 'sale', $2, $3, $4, $5, now(), now()) \
       ON CONFLICT (id) DO NOTHING",
    )
    .bind(sale_movement_id(order_id))
    .bind(amount)
    .bind(Some(items_summary).filter(|s| !s.is_empty()))
    .bind(&note)
    .bind(order_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE orders SET status = 'paid', paid_at = now(), updated_at = now() WHERE id = $1")
      .bind(order_id)
      .execute(&mut *tx)
      .await?;

    tx.commit().await?;
    Ok(MarkPaidOutcome::Paid)
  }

  async fn mark_delivered(&self, order_id: &str) -> Result<Order> {
    let mut tx = self.pool.begin().await?;

    let row = sqlx::query_as::<_, OrderRow>(&format!("{} WHERE id = $1 FOR UPDATE", SELECT_ORDER))
      .bind(order_id)
      .fetch_optional(&mut *tx)
      .await?;
    let mut order = row
      .map(OrderRow::into_order)
      .transpose()?
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

    match order.status {
      OrderStatus::Delivered => {
        tx.commit().await?;
        Ok(order)
      }
      OrderStatus::Paid => {
        let now = Utc::now();
        sqlx::query("UPDATE orders SET status = 'delivered', delivered_at = $2, updated_at = $2 WHERE id = $1")
          .bind(order_id)
          .bind(now)
          .execute(&mut *tx)
          .await?;
        tx.commit().await?;
        order.status = OrderStatus::Delivered;
        order.delivered_at = Some(now);
        order.updated_at = now;
        Ok(order)
      }
      other => Err(AppError::Validation(format!(
        "cannot deliver an order in status '{}'",
        other
      ))),
    }
  }

  async fn mark_cancelled(&self, order_id: &str) -> Result<Order> {
    let mut tx = self.pool.begin().await?;

    let row = sqlx::query_as::<_, OrderRow>(&format!("{} WHERE id = $1 FOR UPDATE", SELECT_ORDER))
      .bind(order_id)
      .fetch_optional(&mut *tx)
      .await?;
    let mut order = row
      .map(OrderRow::into_order)
      .transpose()?
      .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

    match order.status {
      OrderStatus::Cancelled => {
        tx.commit().await?;
        Ok(order)
      }
      OrderStatus::Pending => {
        let now = Utc::now();
        sqlx::query("UPDATE orders SET status = 'cancelled', cancelled_at = $2, updated_at = $2 WHERE id = $1")
          .bind(order_id)
          .bind(now)
          .execute(&mut *tx)
          .await?;
        tx.commit().await?;
        order.status = OrderStatus::Cancelled;
        order.cancelled_at = Some(now);
        order.updated_at = now;
        Ok(order)
      }
      other => Err(AppError::Validation(format!(
        "cannot cancel an order in status '{}'",
        other
      ))),
    }
  }

  async fn append_message(&self, order_id: &str, message: NewMessage) -> Result<ChatMessage> {
    let mut tx = self.pool.begin().await?;

    let touched = sqlx::query("UPDATE orders SET updated_at = now() WHERE id = $1")
      .bind(order_id)
      .execute(&mut *tx)
      .await?;
    if touched.rows_affected() == 0 {
      return Err(AppError::NotFound(format!("Order {} not found", order_id)));
    }

    let created_at: DateTime<Utc> = sqlx::query_scalar(
      "INSERT INTO messages (id, order_id, sender_role, sender_id, text, image_url, image_path, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, now()) RETURNING created_at",
    )
    .bind(&message.id)
    .bind(order_id)
    .bind(message.sender_role.as_str())
    .bind(&message.sender_id)
    .bind(&message.text)
    .bind(&message.image_url)
    .bind(&message.image_path)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(ChatMessage {
      id: message.id,
      order_id: order_id.to_string(),
      sender_role: message.sender_role,
      sender_id: message.sender_id,
      text: message.text,
      image_url: message.image_url,
      image_path: message.image_path,
      created_at,
    })
  }

  async fn list_messages(&self, order_id: &str, limit: usize) -> Result<Vec<ChatMessage>> {
    let rows = sqlx::query_as::<_, MessageRow>(
      "SELECT id, order_id, sender_role, sender_id, text, image_url, image_path, created_at \
       FROM messages WHERE order_id = $1 ORDER BY created_at ASC, seq ASC LIMIT $2",
    )
    .bind(order_id)
    .bind(limit as i64)
    .fetch_all(&self.pool)
    .await?;
    Ok(rows.into_iter().map(MessageRow::into_message).collect())
  }

  async fn insert_cash_movement(&self, movement: NewCashMovement) -> Result<CashMovement> {
    let now = Utc::now();
    let occurred_at = movement.occurred_at.unwrap_or(now);

    sqlx::query(
      "INSERT INTO cash_movements (id, kind, category, amount_cents, items_summary, note, order_id, occurred_at, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(&movement.id)
    .bind(movement.kind.as_str())
    .bind(&movement.category)
    .bind(movement.amount_cents)
    .bind(&movement.items_summary)
    .bind(&movement.note)
    .bind(&movement.order_id)
    .bind(occurred_at)
    .bind(now)
    .execute(&self.pool)
    .await?;

    Ok(CashMovement {
      id: movement.id,
      kind: movement.kind,
      category: movement.category,
      amount_cents: movement.amount_cents,
      items_summary: movement.items_summary,
      note: movement.note,
      order_id: movement.order_id,
      occurred_at,
      created_at: now,
    })
  }

  async fn list_cash_movements(&self, limit: usize) -> Result<Vec<CashMovement>> {
    let rows = sqlx::query_as::<_, MovementRow>(
      "SELECT id, kind, category, amount_cents, items_summary, note, order_id, occurred_at, created_at \
       FROM cash_movements ORDER BY occurred_at DESC LIMIT $1",
    )
    .bind(limit as i64)
    .fetch_all(&self.pool)
    .await?;
    rows.into_iter().map(MovementRow::into_movement).collect()
  }
}

#[async_trait]
impl ProductCatalog for PgStore {
  async fn create_product(&self, new_product: NewProduct) -> Result<Product> {
    let id = Self::mint_id();
    let now = Utc::now();

    sqlx::query(
      "INSERT INTO products (id, name, sale_price_cents, unit_cost_cents, photos, active, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(&id)
    .bind(&new_product.name)
    .bind(new_product.sale_price_cents)
    .bind(new_product.unit_cost_cents)
    .bind(Json(&new_product.photos))
    .bind(new_product.active)
    .bind(now)
    .execute(&self.pool)
    .await?;

    Ok(Product {
      id,
      name: new_product.name,
      sale_price_cents: new_product.sale_price_cents,
      unit_cost_cents: new_product.unit_cost_cents,
      photos: new_product.photos,
      active: new_product.active,
      created_at: now,
    })
  }

  async fn update_product(&self, product_id: &str, update: ProductUpdate) -> Result<Product> {
    let mut tx = self.pool.begin().await?;

    let row = sqlx::query_as::<_, ProductRow>(
      "SELECT id, name, sale_price_cents, unit_cost_cents, photos, active, created_at \
       FROM products WHERE id = $1 FOR UPDATE",
    )
    .bind(product_id)
    .fetch_optional(&mut *tx)
    .await?;
    let mut product = row
      .map(ProductRow::into_product)
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

    sqlx::query(
      "UPDATE products SET name = $2, sale_price_cents = $3, unit_cost_cents = $4, photos = $5, active = $6 \
       WHERE id = $1",
    )
    .bind(product_id)
    .bind(&product.name)
    .bind(product.sale_price_cents)
    .bind(product.unit_cost_cents)
    .bind(Json(&product.photos))
    .bind(product.active)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(product)
  }

  async fn find_product(&self, product_id: &str) -> Result<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(
      "SELECT id, name, sale_price_cents, unit_cost_cents, photos, active, created_at \
       FROM products WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(row.map(ProductRow::into_product))
  }

  async fn list_active_products(&self) -> Result<Vec<Product>> {
    let rows = sqlx::query_as::<_, ProductRow>(
      "SELECT id, name, sale_price_cents, unit_cost_cents, photos, active, created_at \
       FROM products WHERE active ORDER BY created_at ASC",
    )
    .fetch_all(&self.pool)
    .await?;
    Ok(rows.into_iter().map(ProductRow::into_product).collect())
  }
}

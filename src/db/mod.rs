// src/db/mod.rs

//! Persistence ports.
//!
//! The document database is an external collaborator; the core talks to it
//! through these traits. `postgres` is the production adapter, `memory` backs
//! the test suite and local runs without a database.

pub mod memory;
pub mod postgres;

use crate::errors::Result;
use crate::models::{
  CashMovement, ChatMessage, NewCashMovement, NewMessage, NewOrder, NewProduct, Order, Product, ProductUpdate,
};
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Messages returned per fetch, oldest first.
pub const MESSAGE_FETCH_LIMIT: usize = 300;

/// Result of the pending→paid transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkPaidOutcome {
  /// Status flipped and the sale ledger entry was created.
  Paid,
  /// The order was already paid; the transaction committed with no writes.
  AlreadyPaid,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  async fn create_order(&self, new_order: NewOrder) -> Result<Order>;

  async fn find_order(&self, order_id: &str) -> Result<Option<Order>>;

  /// Most recent order for a normalized phone number.
  async fn latest_order_by_phone(&self, phone_norm: &str) -> Result<Option<Order>>;

  /// Most recent order for a federated identity subject.
  async fn latest_order_by_subject(&self, subject_id: &str) -> Result<Option<Order>>;

  async fn list_recent_orders(&self, limit: usize) -> Result<Vec<Order>>;

  /// Applies the pending→paid transition as one atomic unit: read order,
  /// read-or-create the `order_{id}` ledger entry, write status + paid
  /// timestamp. Already-paid orders commit unchanged. Fails with `NotFound`
  /// for unknown orders and `InvalidTotals` (no mutation) when the recorded
  /// revenue is not positive. Safe under concurrent duplicate invocation.
  async fn mark_paid(&self, order_id: &str) -> Result<MarkPaidOutcome>;

  /// paid → delivered. Re-marking a delivered order is a no-op.
  async fn mark_delivered(&self, order_id: &str) -> Result<Order>;

  /// pending → cancelled. Re-cancelling is a no-op.
  async fn mark_cancelled(&self, order_id: &str) -> Result<Order>;

  /// Appends an immutable message and touches the order's `updated_at`.
  async fn append_message(&self, order_id: &str, message: NewMessage) -> Result<ChatMessage>;

  /// Oldest-first, capped at `limit`; ties on creation timestamp break by
  /// insertion order.
  async fn list_messages(&self, order_id: &str, limit: usize) -> Result<Vec<ChatMessage>>;

  async fn insert_cash_movement(&self, movement: NewCashMovement) -> Result<CashMovement>;

  async fn list_cash_movements(&self, limit: usize) -> Result<Vec<CashMovement>>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
  async fn create_product(&self, new_product: NewProduct) -> Result<Product>;

  async fn update_product(&self, product_id: &str, update: ProductUpdate) -> Result<Product>;

  async fn find_product(&self, product_id: &str) -> Result<Option<Product>>;

  async fn list_active_products(&self) -> Result<Vec<Product>>;
}

// src/models/mod.rs

//! Data structures representing persisted entities.

pub mod cash_movement;
pub mod message;
pub mod order;
pub mod product;

pub use cash_movement::{sale_movement_id, CashMovement, MovementKind, NewCashMovement};
pub use message::{ChatMessage, NewMessage, SenderRole};
pub use order::{resolve_customization, Customer, NewOrder, Order, OrderItem, OrderStatus, OrderTotals};
pub use product::{NewProduct, Product, ProductUpdate};

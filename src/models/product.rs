// src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog record. The storefront core only reads these to snapshot prices
/// at checkout; the CRUD surface is thin back-office plumbing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
  pub id: String,
  pub name: String,
  pub sale_price_cents: i64,
  pub unit_cost_cents: i64,
  pub photos: Vec<String>,
  pub active: bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
  pub name: String,
  pub sale_price_cents: i64,
  pub unit_cost_cents: i64,
  pub photos: Vec<String>,
  pub active: bool,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
  pub name: Option<String>,
  pub sale_price_cents: Option<i64>,
  pub unit_cost_cents: Option<i64>,
  pub photos: Option<Vec<String>>,
  pub active: Option<bool>,
}

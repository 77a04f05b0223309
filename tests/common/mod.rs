// tests/common/mod.rs

//! Shared fixtures for the integration tests: an `AppState` wired to the
//! in-memory adapters, plus seeding helpers.

#![allow(dead_code)] // not every test binary uses every helper

use std::sync::Arc;

use storefront::auth::hashing::{hash_phone, hash_pin, normalize_phone_loose};
use storefront::auth::session::SessionClaims;
use storefront::auth::{Caller, HmacIdentityVerifier};
use storefront::config::AppConfig;
use storefront::db::{MemoryStore, OrderStore, ProductCatalog};
use storefront::models::{Customer, NewOrder, NewProduct, Order, OrderItem, OrderTotals, Product};
use storefront::state::AppState;
use storefront::storage::MemoryBlobStore;

pub const SESSION_SECRET: &str = "integration-test-session-secret-0001";
pub const IDENTITY_SECRET: &str = "integration-test-identity-secret-001";

pub fn setup_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

pub struct TestHarness {
  pub state: AppState,
  pub store: Arc<MemoryStore>,
  pub blobs: Arc<MemoryBlobStore>,
}

pub fn test_state() -> TestHarness {
  setup_tracing();

  let store = Arc::new(MemoryStore::new());
  let blobs = Arc::new(MemoryBlobStore::new());
  let identity = Arc::new(HmacIdentityVerifier::new(IDENTITY_SECRET.as_bytes()));

  let config = Arc::new(AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    database_url: "postgres://unused-in-tests".to_string(),
    app_base_url: "http://localhost".to_string(),
    session_secret: SESSION_SECRET.to_string(),
    identity_secret: IDENTITY_SECRET.to_string(),
    max_chat_image_mb: 1,
    media_root: std::env::temp_dir(),
    media_base_url: "http://localhost/media".to_string(),
    production: false,
  });

  let state = AppState {
    store: store.clone(),
    catalog: store.clone(),
    blobs: blobs.clone(),
    identity,
    config,
  };

  TestHarness { state, store, blobs }
}

pub fn order_item(name: &str, qty: u32, unit_price_cents: i64) -> OrderItem {
  OrderItem {
    product_id: "prod-fixture".to_string(),
    name_snapshot: name.to_string(),
    qty,
    unit_price_cents,
    unit_cost_cents: unit_price_cents / 2,
    custom_text: None,
    note: None,
  }
}

/// Creates a pending order directly through the store, the way checkout does.
pub async fn seed_order(store: &dyn OrderStore, phone: &str, pin: &str, items: Vec<OrderItem>) -> Order {
  seed_order_for_subject(store, phone, pin, None, items).await
}

pub async fn seed_order_for_subject(
  store: &dyn OrderStore,
  phone: &str,
  pin: &str,
  subject_id: Option<&str>,
  items: Vec<OrderItem>,
) -> Order {
  let phone_norm = normalize_phone_loose(phone);
  let revenue_cents: i64 = items.iter().map(|it| it.unit_price_cents * i64::from(it.qty)).sum();
  let cost_cents: i64 = items.iter().map(|it| it.unit_cost_cents * i64::from(it.qty)).sum();

  store
    .create_order(NewOrder {
      customer: Customer {
        name: "Test Customer".to_string(),
        phone: phone.to_string(),
        phone_hash: hash_phone(&phone_norm),
        phone_norm,
        pin_hash: hash_pin(pin).expect("hash pin"),
        subject_id: subject_id.map(String::from),
      },
      items,
      totals: OrderTotals {
        revenue_cents,
        cost_cents,
        profit_cents: revenue_cents - cost_cents,
      },
    })
    .await
    .expect("seed order")
}

pub async fn seed_product(catalog: &dyn ProductCatalog, name: &str, price_cents: i64) -> Product {
  catalog
    .create_product(NewProduct {
      name: name.to_string(),
      sale_price_cents: price_cents,
      unit_cost_cents: price_cents / 2,
      photos: vec![],
      active: true,
    })
    .await
    .expect("seed product")
}

pub fn customer_caller(order: &Order) -> Caller {
  Caller::CustomerSession(SessionClaims {
    order_id: order.id.clone(),
    phone: order.customer.phone_norm.clone(),
    phone_hash: None,
  })
}

pub fn admin_caller() -> Caller {
  Caller::Privileged {
    subject_id: "admin-test".to_string(),
  }
}

pub fn admin_bearer_token() -> String {
  HmacIdentityVerifier::issue(IDENTITY_SECRET.as_bytes(), "admin-test", true, chrono::Duration::hours(1))
    .expect("issue admin token")
}

// src/web/handlers/admin_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::db::MarkPaidOutcome;
use crate::errors::AppError;
use crate::models::{MovementKind, NewCashMovement, NewProduct, ProductUpdate};
use crate::services::payment;
use crate::state::AppState;
use crate::web::handlers::require_privileged;

const ORDER_LIST_LIMIT: usize = 200;
const MOVEMENT_LIST_LIMIT: usize = 500;

#[instrument(name = "handler::admin_mark_paid", skip(req, state))]
pub async fn mark_paid_handler(
  req: HttpRequest,
  state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  require_privileged(&req, &state).await?;
  let order_id = path.into_inner();

  // AlreadyPaid responds identically: re-attesting a payment changes nothing.
  let _outcome: MarkPaidOutcome = payment::mark_paid(&state, &order_id).await?;

  Ok(HttpResponse::Ok().json(json!({"ok": true, "orderId": order_id})))
}

#[instrument(name = "handler::admin_mark_delivered", skip(req, state))]
pub async fn mark_delivered_handler(
  req: HttpRequest,
  state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  require_privileged(&req, &state).await?;
  let order_id = path.into_inner();

  let order = state.store.mark_delivered(&order_id).await?;
  Ok(HttpResponse::Ok().json(json!({"ok": true, "orderId": order.id, "status": order.status})))
}

#[instrument(name = "handler::admin_cancel_order", skip(req, state))]
pub async fn cancel_order_handler(
  req: HttpRequest,
  state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  require_privileged(&req, &state).await?;
  let order_id = path.into_inner();

  let order = state.store.mark_cancelled(&order_id).await?;
  Ok(HttpResponse::Ok().json(json!({"ok": true, "orderId": order.id, "status": order.status})))
}

#[instrument(name = "handler::admin_list_orders", skip(req, state))]
pub async fn list_orders_handler(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  require_privileged(&req, &state).await?;

  let orders = state.store.list_recent_orders(ORDER_LIST_LIMIT).await?;
  let views: Vec<_> = orders
    .iter()
    .map(|o| {
      json!({
        "id": o.id,
        "status": o.status,
        "customerName": o.customer.name,
        "itemsSummary": o.items_summary(),
        "totalCents": o.totals.revenue_cents,
        "createdAt": o.created_at,
        "paidAt": o.paid_at,
        "deliveredAt": o.delivered_at,
        "cancelledAt": o.cancelled_at,
      })
    })
    .collect();

  Ok(HttpResponse::Ok().json(json!({"ok": true, "orders": views})))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovementPayload {
  pub kind: String,
  pub category: String,
  pub amount_cents: i64,
  pub note: Option<String>,
  pub occurred_at: Option<DateTime<Utc>>,
}

#[instrument(name = "handler::admin_create_movement", skip(req, state, payload))]
pub async fn create_movement_handler(
  req: HttpRequest,
  state: web::Data<AppState>,
  payload: web::Json<CreateMovementPayload>,
) -> Result<HttpResponse, AppError> {
  require_privileged(&req, &state).await?;

  let kind = payload
    .kind
    .parse::<MovementKind>()
    .map_err(AppError::Validation)?;
  if payload.amount_cents <= 0 {
    return Err(AppError::Validation("Amount must be positive".to_string()));
  }
  let category = payload.category.trim().to_string();
  if category.is_empty() {
    return Err(AppError::Validation("Category is required".to_string()));
  }

  let mut movement = NewCashMovement::manual(kind, category, payload.amount_cents, payload.note.clone());
  movement.occurred_at = payload.occurred_at;

  let stored = state.store.insert_cash_movement(movement).await?;
  Ok(HttpResponse::Ok().json(json!({"ok": true, "movement": stored})))
}

#[instrument(name = "handler::admin_list_movements", skip(req, state))]
pub async fn list_movements_handler(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  require_privileged(&req, &state).await?;

  let movements = state.store.list_cash_movements(MOVEMENT_LIST_LIMIT).await?;
  Ok(HttpResponse::Ok().json(json!({"ok": true, "movements": movements})))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
  pub name: String,
  pub sale_price_cents: i64,
  pub unit_cost_cents: i64,
  #[serde(default)]
  pub photos: Vec<String>,
  #[serde(default = "default_active")]
  pub active: bool,
}

fn default_active() -> bool {
  true
}

#[instrument(name = "handler::admin_create_product", skip(req, state, payload))]
pub async fn create_product_handler(
  req: HttpRequest,
  state: web::Data<AppState>,
  payload: web::Json<CreateProductPayload>,
) -> Result<HttpResponse, AppError> {
  require_privileged(&req, &state).await?;

  let name = payload.name.trim().to_string();
  if name.is_empty() {
    return Err(AppError::Validation("Product name is required".to_string()));
  }
  if payload.sale_price_cents < 0 || payload.unit_cost_cents < 0 {
    return Err(AppError::Validation("Prices cannot be negative".to_string()));
  }

  let product = state
    .catalog
    .create_product(NewProduct {
      name,
      sale_price_cents: payload.sale_price_cents,
      unit_cost_cents: payload.unit_cost_cents,
      photos: payload.photos.clone(),
      active: payload.active,
    })
    .await?;

  Ok(HttpResponse::Created().json(json!({"ok": true, "product": product})))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
  pub name: Option<String>,
  pub sale_price_cents: Option<i64>,
  pub unit_cost_cents: Option<i64>,
  pub photos: Option<Vec<String>>,
  pub active: Option<bool>,
}

#[instrument(name = "handler::admin_update_product", skip(req, state, payload))]
pub async fn update_product_handler(
  req: HttpRequest,
  state: web::Data<AppState>,
  path: web::Path<String>,
  payload: web::Json<UpdateProductPayload>,
) -> Result<HttpResponse, AppError> {
  require_privileged(&req, &state).await?;

  let product = state
    .catalog
    .update_product(
      &path.into_inner(),
      ProductUpdate {
        name: payload.name.clone().map(|n| n.trim().to_string()),
        sale_price_cents: payload.sale_price_cents,
        unit_cost_cents: payload.unit_cost_cents,
        photos: payload.photos.clone(),
        active: payload.active,
      },
    )
    .await?;

  Ok(HttpResponse::Ok().json(json!({"ok": true, "product": product})))
}

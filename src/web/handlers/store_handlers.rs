// src/web/handlers/store_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::services::checkout::{self, CheckoutItem, CheckoutRequest};
use crate::state::AppState;

#[instrument(name = "handler::list_products", skip(state))]
pub async fn list_products_handler(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let products = state.catalog.list_active_products().await?;
  Ok(HttpResponse::Ok().json(json!({"ok": true, "products": products})))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItemPayload {
  pub product_id: String,
  pub qty: u32,
  pub custom_text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
  pub name: String,
  pub phone: String,
  pub pin: String,
  pub subject_id: Option<String>,
  pub items: Vec<CheckoutItemPayload>,
}

#[instrument(name = "handler::checkout", skip(state, payload), fields(items = payload.items.len()))]
pub async fn checkout_handler(
  state: web::Data<AppState>,
  payload: web::Json<CheckoutPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let order = checkout::place_order(
    &state,
    CheckoutRequest {
      name: payload.name,
      phone: payload.phone,
      pin: payload.pin,
      subject_id: payload.subject_id,
      items: payload
        .items
        .into_iter()
        .map(|it| CheckoutItem {
          product_id: it.product_id,
          qty: it.qty,
          custom_text: it.custom_text,
        })
        .collect(),
    },
  )
  .await?;

  Ok(HttpResponse::Created().json(json!({"ok": true, "orderId": order.id})))
}

// src/web/handlers/customer_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::login;
use crate::state::AppState;
use crate::web::handlers::{clear_session_cookie, session_cookie};

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
  pub phone: String,
  pub pin: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct FederatedLoginPayload {
  pub id_token: String,
}

#[instrument(name = "handler::customer_login", skip(state, payload))]
pub async fn login_handler(
  state: web::Data<AppState>,
  payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, AppError> {
  let outcome = login::customer_login(&state, &payload.phone, &payload.pin).await?;

  info!(order_id = %outcome.order.id, "customer logged in");
  Ok(
    HttpResponse::Ok()
      .cookie(session_cookie(&state, outcome.token))
      .json(json!({"ok": true, "orderId": outcome.order.id})),
  )
}

#[instrument(name = "handler::customer_login_federated", skip(state, payload))]
pub async fn login_federated_handler(
  state: web::Data<AppState>,
  payload: web::Json<FederatedLoginPayload>,
) -> Result<HttpResponse, AppError> {
  let outcome = login::federated_login(&state, &payload.id_token).await?;

  info!(order_id = %outcome.order.id, "customer logged in via federated identity");
  Ok(
    HttpResponse::Ok()
      .cookie(session_cookie(&state, outcome.token))
      .json(json!({"ok": true, "orderId": outcome.order.id})),
  )
}

/// The token is self-contained, so logout is purely "make the client forget
/// it": the cookie is cleared, nothing server-side to revoke.
#[instrument(name = "handler::customer_logout", skip(state))]
pub async fn logout_handler(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  Ok(
    HttpResponse::Ok()
      .cookie(clear_session_cookie(&state))
      .json(json!({"ok": true})),
  )
}

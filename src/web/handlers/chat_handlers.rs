// src/web/handlers/chat_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::auth::Caller;
use crate::errors::AppError;
use crate::services::chat;
use crate::state::AppState;
use crate::web::handlers::resolve_caller;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
  pub order_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
  pub text: Option<String>,
  pub image_data_url: Option<String>,
  /// Admin callers name the order here; customer callers get it from their
  /// session, always.
  pub order_id: Option<String>,
}

/// Admins pass the order id explicitly; a customer session only ever yields
/// the one order baked into its token.
fn effective_order_id(caller: &Caller, supplied: Option<&str>) -> Result<String, AppError> {
  match caller {
    Caller::Privileged { .. } => {
      let id = supplied.unwrap_or_default().trim().to_string();
      if id.is_empty() {
        return Err(AppError::Validation("Missing orderId".to_string()));
      }
      Ok(id)
    }
    Caller::CustomerSession(session) => Ok(session.order_id.clone()),
    Caller::Unauthenticated => Err(AppError::Unauthenticated),
  }
}

#[instrument(name = "handler::list_messages", skip_all)]
pub async fn list_messages_handler(
  req: HttpRequest,
  state: web::Data<AppState>,
  query: web::Query<MessagesQuery>,
) -> Result<HttpResponse, AppError> {
  let caller = resolve_caller(&req, &state).await;
  if matches!(caller, Caller::Unauthenticated) {
    return Err(AppError::Unauthenticated);
  }

  let order_id = effective_order_id(&caller, query.order_id.as_deref())?;
  let log = chat::list_messages(&state, &caller, &order_id).await?;

  Ok(HttpResponse::Ok().json(json!({
    "ok": true,
    "order": log.order,
    "messages": log.messages,
  })))
}

#[instrument(name = "handler::send_message", skip_all)]
pub async fn send_message_handler(
  req: HttpRequest,
  state: web::Data<AppState>,
  payload: web::Json<SendMessagePayload>,
) -> Result<HttpResponse, AppError> {
  let caller = resolve_caller(&req, &state).await;
  if matches!(caller, Caller::Unauthenticated) {
    return Err(AppError::Unauthenticated);
  }

  let order_id = effective_order_id(&caller, payload.order_id.as_deref())?;
  chat::send_message(
    &state,
    &caller,
    &order_id,
    payload.text.as_deref(),
    payload.image_data_url.as_deref(),
  )
  .await?;

  Ok(HttpResponse::Ok().json(json!({"ok": true})))
}

// src/services/chat.rs

//! Chat exchange: the append-only conversation attached to an order.

use crate::auth::guard::{authorize, Caller};
use crate::db::MESSAGE_FETCH_LIMIT;
use crate::errors::{AppError, Result};
use crate::models::{ChatMessage, NewMessage, Order, SenderRole};
use crate::services::images::parse_data_url_image;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use futures_util::future::try_join;
use serde::Serialize;
use tracing::instrument;

pub const MAX_TEXT_LEN: usize = 2000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
  pub name_snapshot: String,
  pub qty: u32,
  pub custom_text: String,
}

/// The order header shown above the conversation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
  pub id: String,
  pub status: String,
  pub items_summary: String,
  pub items: Vec<OrderItemView>,
  pub total_cents: i64,
  pub customer_name: String,
  pub created_at: DateTime<Utc>,
  pub paid_at: Option<DateTime<Utc>>,
  pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
  pub id: String,
  pub sender_role: SenderRole,
  pub text: String,
  pub image_url: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLog {
  pub order: OrderSummary,
  pub messages: Vec<MessageView>,
}

fn order_summary(order: &Order) -> OrderSummary {
  let items_summary = {
    let s = order.items_summary();
    if s.is_empty() {
      "Order items".to_string()
    } else {
      s
    }
  };

  OrderSummary {
    id: order.id.clone(),
    status: order.status.to_string(),
    items_summary,
    items: order
      .items
      .iter()
      .map(|it| OrderItemView {
        name_snapshot: it.name_snapshot.trim().to_string(),
        qty: it.qty,
        custom_text: it.customization().unwrap_or_default().to_string(),
      })
      .collect(),
    total_cents: order.totals.revenue_cents,
    customer_name: order.customer.name.trim().to_string(),
    created_at: order.created_at,
    paid_at: order.paid_at,
    delivered_at: order.delivered_at,
  }
}

fn message_view(message: ChatMessage) -> MessageView {
  MessageView {
    id: message.id,
    sender_role: message.sender_role,
    text: message.text,
    image_url: message.image_url,
    created_at: message.created_at,
  }
}

/// Read-only: the order summary plus up to 300 messages, oldest first.
#[instrument(name = "chat::list_messages", skip(state, caller), fields(order_id = %order_id))]
pub async fn list_messages(state: &AppState, caller: &Caller, order_id: &str) -> Result<ChatLog> {
  let (order, messages) = try_join(
    state.store.find_order(order_id),
    state.store.list_messages(order_id, MESSAGE_FETCH_LIMIT),
  )
  .await?;

  let order = order.ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  authorize(caller, &order).require()?;

  Ok(ChatLog {
    order: order_summary(&order),
    messages: messages.into_iter().map(message_view).collect(),
  })
}

/// Appends one immutable message, uploading the inline image first when one
/// is present. Sender role comes from the caller's kind, never the payload.
#[instrument(
  name = "chat::send_message",
  skip(state, caller, text, image_data_url),
  fields(order_id = %order_id, has_image = image_data_url.is_some())
)]
pub async fn send_message(
  state: &AppState,
  caller: &Caller,
  order_id: &str,
  text: Option<&str>,
  image_data_url: Option<&str>,
) -> Result<ChatMessage> {
  let text: String = text.unwrap_or_default().trim().chars().take(MAX_TEXT_LEN).collect();
  let image_data_url = image_data_url.map(str::trim).filter(|s| !s.is_empty());

  if text.is_empty() && image_data_url.is_none() {
    return Err(AppError::Validation("Missing text or image".to_string()));
  }

  let order = state
    .store
    .find_order(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  authorize(caller, &order).require()?;

  let message_id = NewMessage::mint_id();

  let (image_url, image_path) = match image_data_url {
    Some(data_url) => {
      let image = parse_data_url_image(data_url, state.config.max_image_bytes())?;
      let path = format!("orders/{}/messages/{}.{}", order.id, message_id, image.ext);
      let blob = state.blobs.put(&path, &image.content_type, &image.bytes).await?;
      (Some(blob.url), Some(blob.path))
    }
    None => (None, None),
  };

  state
    .store
    .append_message(
      &order.id,
      NewMessage {
        id: message_id,
        sender_role: caller.sender_role(),
        sender_id: caller.sender_id(),
        text,
        image_url,
        image_path,
      },
    )
    .await
}

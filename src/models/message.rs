// src/models/message.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
  Admin,
  Customer,
}

impl SenderRole {
  pub fn as_str(&self) -> &'static str {
    match self {
      SenderRole::Admin => "admin",
      SenderRole::Customer => "customer",
    }
  }
}

impl fmt::Display for SenderRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One entry in an order's conversation. Immutable once appended; there is no
/// edit or delete operation anywhere in the system.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
  pub id: String,
  pub order_id: String,
  pub sender_role: SenderRole,
  /// Identity subject of the sender; present only for admin-sent messages.
  pub sender_id: Option<String>,
  pub text: String,
  pub image_url: Option<String>,
  pub image_path: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Input for `OrderStore::append_message`. The id is minted by the chat
/// exchange before the blob upload so the stored object path can be scoped to
/// it; the store still enforces uniqueness.
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub id: String,
  pub sender_role: SenderRole,
  pub sender_id: Option<String>,
  pub text: String,
  pub image_url: Option<String>,
  pub image_path: Option<String>,
}

impl NewMessage {
  pub fn mint_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
  }
}

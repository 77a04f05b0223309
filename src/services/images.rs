// src/services/images.rs

//! Inline chat image handling: data-URL decoding, type allow-list, size
//! ceiling.

use crate::errors::{AppError, Result};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

const ALLOWED_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp", "image/gif"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
  pub content_type: String,
  pub bytes: Vec<u8>,
  pub ext: &'static str,
}

/// Parses a `data:image/...;base64,...` URL into raw bytes.
///
/// `ImageTooLarge` is distinct from other failures on purpose: the client
/// turns it into an actionable "shrink your photo" message.
pub fn parse_data_url_image(data_url: &str, max_bytes: usize) -> Result<InlineImage> {
  let trimmed = data_url.trim();
  let rest = trimmed
    .strip_prefix("data:")
    .ok_or_else(|| AppError::Validation("invalid inline image format".to_string()))?;
  let (content_type, b64) = rest
    .split_once(";base64,")
    .ok_or_else(|| AppError::Validation("invalid inline image format".to_string()))?;

  let content_type = content_type.trim().to_ascii_lowercase();
  if !ALLOWED_TYPES.contains(&content_type.as_str()) {
    return Err(AppError::UnsupportedImageType(content_type));
  }

  let bytes = BASE64_STANDARD
    .decode(b64)
    .map_err(|_| AppError::Validation("invalid inline image encoding".to_string()))?;

  if bytes.len() > max_bytes {
    return Err(AppError::ImageTooLarge {
      max_mb: (max_bytes / (1024 * 1024)) as u64,
    });
  }

  let ext = if content_type.contains("png") {
    "png"
  } else if content_type.contains("webp") {
    "webp"
  } else if content_type.contains("gif") {
    "gif"
  } else {
    "jpg"
  };

  Ok(InlineImage {
    content_type,
    bytes,
    ext,
  })
}

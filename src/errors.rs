// src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Invalid session claim: {0}")]
  InvalidClaim(String),

  #[error("Not authenticated")]
  Unauthenticated,

  #[error("Forbidden")]
  Forbidden,

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Image too large (max {max_mb}MB). Compress it before sending.")]
  ImageTooLarge { max_mb: u64 },

  #[error("Unsupported image type: {0}")]
  UnsupportedImageType(String),

  #[error("Invalid order totals: {0}")]
  InvalidTotals(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Blob Storage Error: {0}")]
  Storage(String),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

// Allow anyhow::Error to be converted into AppError::Internal for convenience
// in handlers that use `?` on functions returning anyhow::Result.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    if err.is::<sqlx::Error>() {
      return AppError::Sqlx(err.downcast::<sqlx::Error>().unwrap());
    }
    AppError::Internal(err.to_string())
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"ok": false, "error": m})),
      AppError::InvalidClaim(m) => HttpResponse::BadRequest().json(json!({"ok": false, "error": m})),
      AppError::Unauthenticated => {
        HttpResponse::Unauthorized().json(json!({"ok": false, "error": "Not authenticated"}))
      }
      // Deliberately generic: does not reveal whether the target order exists.
      AppError::Forbidden => HttpResponse::Forbidden().json(json!({"ok": false, "error": "Forbidden"})),
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"ok": false, "error": m})),
      AppError::ImageTooLarge { .. } => {
        HttpResponse::PayloadTooLarge().json(json!({"ok": false, "error": self.to_string()}))
      }
      AppError::UnsupportedImageType(m) => {
        HttpResponse::UnsupportedMediaType().json(json!({"ok": false, "error": m}))
      }
      AppError::InvalidTotals(m) => {
        HttpResponse::UnprocessableEntity().json(json!({"ok": false, "error": m}))
      }
      AppError::Config(m) => HttpResponse::InternalServerError()
        .json(json!({"ok": false, "error": "Configuration issue", "detail": m})),
      AppError::Sqlx(_) => {
        HttpResponse::InternalServerError().json(json!({"ok": false, "error": "Database operation failed"}))
      }
      AppError::Storage(m) => HttpResponse::InternalServerError()
        .json(json!({"ok": false, "error": "Blob storage error", "detail": m})),
      AppError::Internal(m) => HttpResponse::InternalServerError()
        .json(json!({"ok": false, "error": "An internal error occurred", "detail": m})),
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;

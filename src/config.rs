// src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Secrets shorter than this refuse to sign anything. Checked once at startup,
/// not per request.
const MIN_SECRET_LEN: usize = 32;
const DEFAULT_MAX_CHAT_IMAGE_MB: u64 = 8;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub app_base_url: String,

  /// HMAC key for customer session tokens. Fatal at startup if absent or weak.
  pub session_secret: String,
  /// Shared secret the identity provider signs admin/federated tokens with.
  pub identity_secret: String,

  /// Ceiling for decoded inline chat images.
  pub max_chat_image_mb: u64,

  /// Where the filesystem blob adapter writes uploaded chat images.
  pub media_root: PathBuf,
  /// Public prefix the stored objects are reachable under.
  pub media_base_url: String,

  /// Enables the Secure attribute on the session cookie.
  pub production: bool,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let app_base_url = get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));

    let session_secret = get_env("SESSION_SECRET")?;
    Self::check_secret("SESSION_SECRET", &session_secret)?;
    let identity_secret = get_env("IDENTITY_SECRET")?;
    Self::check_secret("IDENTITY_SECRET", &identity_secret)?;

    let max_chat_image_mb = match get_env("MAX_CHAT_IMAGE_MB") {
      Ok(raw) => match raw.parse::<u64>() {
        Ok(mb) if mb > 0 => mb,
        _ => DEFAULT_MAX_CHAT_IMAGE_MB,
      },
      Err(_) => DEFAULT_MAX_CHAT_IMAGE_MB,
    };

    let media_root = PathBuf::from(get_env("MEDIA_ROOT").unwrap_or_else(|_| "./media".to_string()));
    let media_base_url = get_env("MEDIA_BASE_URL").unwrap_or_else(|_| format!("{}/media", app_base_url));

    let production = get_env("APP_ENV")
      .map(|v| v.eq_ignore_ascii_case("production"))
      .unwrap_or(false);

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      app_base_url,
      session_secret,
      identity_secret,
      max_chat_image_mb,
      media_root,
      media_base_url,
      production,
    })
  }

  fn check_secret(name: &str, value: &str) -> Result<()> {
    if value.len() < MIN_SECRET_LEN {
      return Err(AppError::Config(format!(
        "{} is too weak (use >= {} chars)",
        name, MIN_SECRET_LEN
      )));
    }
    Ok(())
  }

  pub fn max_image_bytes(&self) -> usize {
    (self.max_chat_image_mb as usize) * 1024 * 1024
  }
}

// src/main.rs

use std::sync::Arc;

use actix_web::{web as actix_data, App, HttpServer};
use sqlx::PgPool;
use storefront::auth::HmacIdentityVerifier;
use storefront::config::AppConfig;
use storefront::db::PgStore;
use storefront::state::AppState;
use storefront::storage::FsBlobStore;
use storefront::web::configure_app_routes;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting storefront server...");

  // A weak or missing signing secret is a fatal startup condition, never a
  // per-request error.
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      panic!("Configuration error: {}", e);
    }
  };

  let db_pool = match PgPool::connect(&app_config.database_url).await {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      panic!("Database connection error: {}", e);
    }
  };

  let store = Arc::new(PgStore::new(db_pool));
  let blobs = Arc::new(FsBlobStore::new(
    app_config.media_root.clone(),
    app_config.media_base_url.clone(),
  ));
  let identity = Arc::new(HmacIdentityVerifier::new(app_config.identity_secret.as_bytes()));

  let app_state = AppState {
    store: store.clone(),
    catalog: store,
    blobs,
    identity,
    config: app_config.clone(),
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  // Inline images arrive base64-encoded inside JSON bodies; leave headroom
  // above the configured ceiling for the encoding overhead.
  let json_limit = app_state.config.max_image_bytes() * 2;

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .app_data(actix_data::JsonConfig::default().limit(json_limit))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}

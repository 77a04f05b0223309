// src/state.rs

use crate::auth::IdentityVerifier;
use crate::config::AppConfig;
use crate::db::{OrderStore, ProductCatalog};
use crate::storage::BlobStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn OrderStore>,
  pub catalog: Arc<dyn ProductCatalog>,
  pub blobs: Arc<dyn BlobStore>,
  pub identity: Arc<dyn IdentityVerifier>,
  pub config: Arc<AppConfig>,
}

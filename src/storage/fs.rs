// src/storage/fs.rs

use crate::errors::{AppError, Result};
use crate::storage::{BlobStore, StoredBlob};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// Filesystem adapter. Objects land under `root` and are expected to be
/// served by whatever fronts `public_base_url` (a static file server or CDN,
/// outside this process).
pub struct FsBlobStore {
  root: PathBuf,
  public_base_url: String,
}

impl FsBlobStore {
  pub fn new(root: PathBuf, public_base_url: impl Into<String>) -> Self {
    Self {
      root,
      public_base_url: public_base_url.into(),
    }
  }

  fn resolve(&self, path: &str) -> Result<PathBuf> {
    let relative = Path::new(path);
    // refuse absolute paths and any traversal component
    let safe = relative.components().all(|c| matches!(c, Component::Normal(_)));
    if path.is_empty() || !safe {
      return Err(AppError::Storage(format!("unsafe blob path '{}'", path)));
    }
    Ok(self.root.join(relative))
  }
}

#[async_trait]
impl BlobStore for FsBlobStore {
  async fn put(&self, path: &str, content_type: &str, bytes: &[u8]) -> Result<StoredBlob> {
    let target = self.resolve(path)?;
    if let Some(parent) = target.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| AppError::Storage(format!("create {}: {}", parent.display(), e)))?;
    }

    tokio::fs::write(&target, bytes)
      .await
      .map_err(|e| AppError::Storage(format!("write {}: {}", target.display(), e)))?;

    info!(path, content_type, bytes = bytes.len(), "stored blob");

    Ok(StoredBlob {
      url: format!("{}/{}", self.public_base_url.trim_end_matches('/'), path),
      path: path.to_string(),
    })
  }
}

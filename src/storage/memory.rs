// src/storage/memory.rs

use crate::errors::Result;
use crate::storage::{BlobStore, StoredBlob};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// In-memory adapter for tests: records every object it is handed.
#[derive(Default)]
pub struct MemoryBlobStore {
  objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
}

impl MemoryBlobStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn object(&self, path: &str) -> Option<(String, Vec<u8>)> {
    self.objects.lock().get(path).cloned()
  }

  pub fn object_count(&self) -> usize {
    self.objects.lock().len()
  }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
  async fn put(&self, path: &str, content_type: &str, bytes: &[u8]) -> Result<StoredBlob> {
    self
      .objects
      .lock()
      .insert(path.to_string(), (content_type.to_string(), bytes.to_vec()));
    Ok(StoredBlob {
      url: format!("memory://{}", path),
      path: path.to_string(),
    })
  }
}

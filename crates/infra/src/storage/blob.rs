//! Filesystem-backed blob store for product imagery.

use std::path::PathBuf;

use async_trait::async_trait;
use mktsync_core::BlobStore;
use mktsync_domain::{MarketplaceError, Result};
use tracing::debug;

/// Local-disk implementation of `BlobStore`.
///
/// Keys are relative paths (`{user}/{uuid}.{ext}`); the public URL is the
/// configured base joined with the key.
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self { root: root.into(), base_url: base_url.into().trim_end_matches('/').to_string() }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MarketplaceError::Storage(format!("create blob dir failed: {e}")))?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| MarketplaceError::Storage(format!("write blob failed: {e}")))?;

        debug!(key, content_type, "blob stored");
        Ok(key.to_string())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

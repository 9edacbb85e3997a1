//! Port interface for blob storage (product imagery)

use async_trait::async_trait;
use mktsync_domain::Result;

/// Trait for storing opaque blobs and resolving public URLs
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob under `key`, returning the stored key
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Public URL for a stored key
    fn public_url(&self, key: &str) -> String;
}

/// Build a collision-free object key scoped to one user: `{user}/{uuid}.{ext}`.
pub fn object_key(user_id: &str, extension: &str) -> String {
    format!("{}/{}.{}", user_id, uuid::Uuid::new_v4(), extension)
}

#[cfg(test)]
mod tests {
    //! Unit tests for storage::ports.
    use super::*;

    #[test]
    fn object_key_is_user_scoped_and_unique() {
        let a = object_key("user-1", "jpg");
        let b = object_key("user-1", "jpg");

        assert!(a.starts_with("user-1/"));
        assert!(a.ends_with(".jpg"));
        assert_ne!(a, b);
    }
}

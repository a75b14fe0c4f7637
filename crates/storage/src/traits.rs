//! Storage trait definitions.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use ota_core::Platform;
use time::OffsetDateTime;

/// Object store holding published manifests and assets.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get an object's metadata without fetching content.
    async fn head(&self, key: &str) -> StorageResult<ObjectMeta>;

    /// Get an object's content.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Put an object atomically.
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Static identifier of the backend type, used for logging.
    fn backend_name(&self) -> &'static str;

    /// Verify the backend is reachable. Called once at startup.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }

    /// Fetch an object's content together with its last-modified time.
    ///
    /// Both requests run concurrently. An object without a timestamp is
    /// treated as missing.
    async fn get_object(&self, key: &str) -> StorageResult<StoredObject> {
        let (bytes, meta) = tokio::try_join!(self.get(key), self.head(key))?;
        let last_modified = meta
            .last_modified
            .ok_or_else(|| StorageError::NotFound(format!("{key} not found")))?;
        Ok(StoredObject {
            bytes,
            last_modified,
        })
    }
}

/// Metadata about a stored object.
#[derive(Clone, Debug)]
pub struct ObjectMeta {
    /// Object size in bytes.
    pub size: u64,
    /// Last modification time (if available).
    pub last_modified: Option<OffsetDateTime>,
    /// Content type (if available).
    pub content_type: Option<String>,
}

/// Object content with the time it was last written.
#[derive(Clone, Debug)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub last_modified: OffsetDateTime,
}

/// Key of a platform manifest within a publish.
pub fn manifest_key(runtime_version: &str, ota_update_version: &str, platform: Platform) -> String {
    format!("{runtime_version}/{ota_update_version}/manifests/{platform}.json")
}

/// Key of an asset within a publish, given its path relative to the export directory.
pub fn asset_key(runtime_version: &str, ota_update_version: &str, path: &str) -> String {
    format!(
        "{runtime_version}/{ota_update_version}/{}",
        path.trim_start_matches('/')
    )
}

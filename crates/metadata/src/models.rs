//! Database models mapping to the metadata schema.

use ota_core::{Manifest, Platform, partition_key};
use sqlx::FromRow;
use time::OffsetDateTime;

/// One published version of an update lineage.
///
/// `(partition_key, sort_key)` is unique. Rows are written once at publish
/// time; `mandatory`, `enabled` and `active_devices` are administered
/// outside the request path.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct UpdateRow {
    /// `<platform>-<runtime version>`.
    pub partition_key: String,
    /// Version number within the lineage, starting at 1.
    pub sort_key: i64,
    /// Copied from the manifest id.
    pub id: String,
    pub platform: String,
    /// Serialized manifest JSON.
    pub manifest: String,
    pub runtime_version: String,
    /// String form of `sort_key`.
    pub ota_update_version: String,
    pub mandatory: bool,
    pub active_devices: i64,
    pub enabled: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl UpdateRow {
    /// Build a record for a published manifest.
    pub fn from_manifest(
        platform: Platform,
        sort_key: i64,
        manifest: &Manifest,
        created_at: OffsetDateTime,
    ) -> ota_core::Result<Self> {
        Ok(Self {
            partition_key: partition_key(platform, &manifest.runtime_version),
            sort_key,
            id: manifest.id.clone(),
            platform: platform.as_str().to_string(),
            manifest: manifest.to_json_string()?,
            runtime_version: manifest.runtime_version.clone(),
            ota_update_version: sort_key.to_string(),
            mandatory: manifest.extra.mandatory,
            active_devices: 0,
            enabled: true,
            created_at,
            updated_at: OffsetDateTime::now_utc(),
        })
    }

    /// Decode the stored manifest.
    pub fn manifest(&self) -> ota_core::Result<Manifest> {
        Manifest::from_json(self.manifest.as_bytes())
    }
}

//! Update manifests and their generation from an exported bundle.

use crate::asset::{AssetLocation, AssetMetadata};
use crate::config::PublishConfig;
use crate::hash::ContentHash;
use crate::update::{Platform, UploadPath};
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, instrument};

/// Descriptor file emitted by the bundler, relative to the export directory.
pub const METADATA_FILE: &str = "metadata.json";

/// App configuration file emitted alongside the descriptor.
pub const EXPO_CONFIG_FILE: &str = "expoConfig.json";

/// A platform-specific update manifest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub created_at: String,
    pub runtime_version: String,
    pub assets: Vec<AssetMetadata>,
    pub launch_asset: AssetMetadata,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub extra: ManifestExtra,
}

/// Publisher-defined manifest fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestExtra {
    #[serde(default)]
    pub expo_client: Map<String, Value>,
    #[serde(default)]
    pub mandatory: bool,
    pub ota_update_version: String,
}

impl Manifest {
    /// Parse a stored manifest document.
    pub fn from_json(bytes: &[u8]) -> crate::Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| crate::Error::Serialization(e.to_string()))
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> crate::Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| crate::Error::Serialization(e.to_string()))
    }

    /// Serialize to a compact JSON string.
    pub fn to_json_string(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(|e| crate::Error::Serialization(e.to_string()))
    }

    /// Keys of every asset, launch asset included.
    pub fn asset_keys(&self) -> impl Iterator<Item = &str> {
        self.assets
            .iter()
            .chain(std::iter::once(&self.launch_asset))
            .map(|asset| asset.key.as_str())
    }
}

/// Bundler output describing the files of each platform.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleMetadata {
    pub file_metadata: BTreeMap<String, PlatformBundle>,
}

/// Files making up one platform's export.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PlatformBundle {
    /// Path of the launch bundle.
    pub bundle: String,
    #[serde(default)]
    pub assets: Vec<BundleAsset>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BundleAsset {
    pub path: String,
    pub ext: String,
}

impl BundleMetadata {
    pub fn from_slice(bytes: &[u8]) -> crate::Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| crate::Error::InvalidDescriptor(e.to_string()))
    }

    /// Files for a platform.
    pub fn platform(&self, platform: Platform) -> crate::Result<&PlatformBundle> {
        self.file_metadata.get(platform.as_str()).ok_or_else(|| {
            crate::Error::InvalidDescriptor(format!("no file metadata for platform {platform}"))
        })
    }
}

/// Read access to an exported bundle directory.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Read a file by its path relative to the export directory.
    async fn read(&self, path: &str) -> std::io::Result<Bytes>;

    /// Creation time of a file.
    async fn created_at(&self, path: &str) -> std::io::Result<OffsetDateTime>;
}

/// Inputs shared by every platform's manifest in one publish.
#[derive(Clone, Debug)]
pub struct ManifestInputs {
    pub descriptor: BundleMetadata,
    /// Derived from the SHA-256 of the raw descriptor bytes.
    pub id: String,
    pub created_at: String,
    pub expo_config: Map<String, Value>,
}

/// Builds manifests for one publish.
#[derive(Clone, Debug)]
pub struct ManifestBuilder {
    upload_path: UploadPath,
    mandatory: bool,
    location: AssetLocation,
}

impl ManifestBuilder {
    pub fn new(config: &PublishConfig, upload_path: UploadPath) -> Self {
        let location = AssetLocation::new(&config.assets_base_url, &upload_path.to_string());
        Self {
            upload_path,
            mandatory: config.mandatory,
            location,
        }
    }

    /// Load the descriptor and app config. Either one missing fails the whole publish.
    #[instrument(skip(self, source), fields(runtime_version = %self.upload_path.runtime_version))]
    pub async fn load_inputs(&self, source: &dyn AssetSource) -> crate::Result<ManifestInputs> {
        let runtime_version = &self.upload_path.runtime_version;
        let missing = |what: &'static str, reason: String| crate::Error::ConfigMissing {
            what,
            runtime_version: runtime_version.clone(),
            reason,
        };

        let raw = source
            .read(METADATA_FILE)
            .await
            .map_err(|e| missing("update", e.to_string()))?;
        let descriptor = BundleMetadata::from_slice(&raw).map_err(|e| missing("update", e.to_string()))?;
        let created = source
            .created_at(METADATA_FILE)
            .await
            .map_err(|e| missing("update", e.to_string()))?;

        let config_raw = source
            .read(EXPO_CONFIG_FILE)
            .await
            .map_err(|e| missing("expo config json", e.to_string()))?;
        let expo_config: Map<String, Value> = serde_json::from_slice(&config_raw)
            .map_err(|e| missing("expo config json", e.to_string()))?;

        Ok(ManifestInputs {
            descriptor,
            id: ContentHash::compute(&raw).to_uuid(),
            created_at: format_created_at(created)?,
            expo_config,
        })
    }

    /// Build the manifest for one platform.
    ///
    /// Assets are hashed concurrently; their order follows the descriptor.
    #[instrument(skip(self, inputs, source), fields(upload_path = %self.upload_path))]
    pub async fn build(
        &self,
        inputs: &ManifestInputs,
        platform: Platform,
        source: &dyn AssetSource,
    ) -> crate::Result<Manifest> {
        let files = inputs.descriptor.platform(platform)?;

        let assets = try_join_all(
            files
                .assets
                .iter()
                .map(|asset| self.describe(source, &asset.path, Some(&asset.ext), false)),
        );
        let launch_asset = self.describe(source, &files.bundle, None, true);
        let (assets, launch_asset) = futures::try_join!(assets, launch_asset)?;

        debug!(%platform, assets = assets.len(), "built manifest");

        Ok(Manifest {
            id: inputs.id.clone(),
            created_at: inputs.created_at.clone(),
            runtime_version: self.upload_path.runtime_version.clone(),
            assets,
            launch_asset,
            metadata: Map::new(),
            extra: ManifestExtra {
                expo_client: inputs.expo_config.clone(),
                mandatory: self.mandatory,
                ota_update_version: self.upload_path.ota_update_version.clone(),
            },
        })
    }

    /// Build manifests for every platform, in publish order.
    pub async fn build_all(
        &self,
        source: &dyn AssetSource,
    ) -> crate::Result<Vec<(Platform, Manifest)>> {
        let inputs = self.load_inputs(source).await?;
        let mut manifests = Vec::with_capacity(Platform::ALL.len());
        for platform in Platform::ALL {
            manifests.push((platform, self.build(&inputs, platform, source).await?));
        }
        Ok(manifests)
    }

    async fn describe(
        &self,
        source: &dyn AssetSource,
        path: &str,
        ext: Option<&str>,
        is_launch_asset: bool,
    ) -> crate::Result<AssetMetadata> {
        let bytes = source.read(path).await.map_err(|e| crate::Error::AssetRead {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(AssetMetadata::describe(
            &bytes,
            ext,
            is_launch_asset,
            self.location.url_for(path),
        ))
    }
}

/// Format a timestamp as `YYYY-MM-DDTHH:MM:SS.mmmZ` in UTC.
pub fn format_created_at(at: OffsetDateTime) -> crate::Result<String> {
    let format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");
    at.to_offset(UtcOffset::UTC)
        .format(format)
        .map_err(|e| crate::Error::Serialization(e.to_string()))
}

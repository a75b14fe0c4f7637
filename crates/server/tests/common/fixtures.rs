//! Test fixtures: manifests, records and a failing metadata store.

use async_trait::async_trait;
use bytes::Bytes;
use ota_core::manifest::ManifestExtra;
use ota_core::multipart::{Part, boundary_from_content_type, parse_multipart};
use ota_core::{AssetMetadata, Manifest, Platform};
use ota_metadata::{
    MetadataError, MetadataResult, MetadataStore, SortOrder, UpdateRepo, UpdateRow,
};
use ota_storage::manifest_key;
use serde_json::Map;
use time::macros::datetime;

use super::{TestResponse, TestServer};

#[allow(dead_code)]
pub fn sample_manifest(id: &str, runtime_version: &str, version: i64) -> Manifest {
    let asset = |key: &str, ext: &str, content_type: &str| AssetMetadata {
        hash: format!("hash-{key}"),
        key: key.to_string(),
        file_extension: ext.to_string(),
        content_type: content_type.to_string(),
        url: format!("https://cdn.example.com/{runtime_version}/{version}/{key}"),
    };
    Manifest {
        id: id.to_string(),
        created_at: "2024-03-01T12:00:00.000Z".to_string(),
        runtime_version: runtime_version.to_string(),
        assets: vec![
            asset("asset-b", ".png", "image/png"),
            asset("asset-a", ".ttf", "font/ttf"),
        ],
        launch_asset: asset("bundle", ".bundle", "application/javascript"),
        metadata: Map::new(),
        extra: ManifestExtra {
            expo_client: Map::new(),
            mandatory: false,
            ota_update_version: version.to_string(),
        },
    }
}

/// Insert an update record directly into the store.
#[allow(dead_code)]
pub async fn seed_update(
    server: &TestServer,
    platform: Platform,
    runtime_version: &str,
    sort_key: i64,
    id: &str,
) -> Manifest {
    let manifest = sample_manifest(id, runtime_version, sort_key);
    seed_manifest(server, platform, sort_key, &manifest).await;
    manifest
}

#[allow(dead_code)]
pub async fn seed_manifest(server: &TestServer, platform: Platform, sort_key: i64, manifest: &Manifest) {
    let row = UpdateRow::from_manifest(
        platform,
        sort_key,
        manifest,
        datetime!(2024-03-01 12:00:00 UTC),
    )
    .unwrap();
    server.state.metadata.create_update(&row).await.unwrap();
}

/// Upload a manifest object the way the publish pipeline does.
#[allow(dead_code)]
pub async fn put_manifest(server: &TestServer, platform: Platform, manifest: &Manifest) {
    let key = manifest_key(
        &manifest.runtime_version,
        &manifest.extra.ota_update_version,
        platform,
    );
    server
        .state
        .storage
        .put(&key, Bytes::from(manifest.to_json().unwrap()))
        .await
        .unwrap();
}

/// Decode a multipart response body.
#[allow(dead_code)]
pub fn multipart_parts(response: &TestResponse) -> Vec<Part> {
    let content_type = response.header("content-type").expect("content-type");
    let boundary = boundary_from_content_type(content_type).expect("boundary");
    parse_multipart(&response.body, boundary).unwrap()
}

/// A metadata store whose every call fails.
#[allow(dead_code)]
pub struct UnreachableStore;

#[async_trait]
impl UpdateRepo for UnreachableStore {
    async fn create_update(&self, _update: &UpdateRow) -> MetadataResult<()> {
        Err(unreachable_error())
    }

    async fn create_updates(&self, _updates: &[UpdateRow]) -> MetadataResult<()> {
        Err(unreachable_error())
    }

    async fn find_latest(
        &self,
        _partition_key: &str,
        _order: SortOrder,
        _limit: u32,
    ) -> MetadataResult<Vec<UpdateRow>> {
        Err(unreachable_error())
    }

    async fn get_update(
        &self,
        _partition_key: &str,
        _sort_key: i64,
    ) -> MetadataResult<Option<UpdateRow>> {
        Err(unreachable_error())
    }
}

#[async_trait]
impl MetadataStore for UnreachableStore {
    async fn migrate(&self) -> MetadataResult<()> {
        Err(unreachable_error())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        Err(unreachable_error())
    }
}

fn unreachable_error() -> MetadataError {
    MetadataError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "update store unreachable",
    ))
}

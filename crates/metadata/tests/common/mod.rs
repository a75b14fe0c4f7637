use ota_core::manifest::ManifestExtra;
use ota_core::{AssetMetadata, Manifest, Platform};
use ota_metadata::{SqliteStore, UpdateRow};
use serde_json::Map;
use tempfile::TempDir;
use time::OffsetDateTime;
use time::macros::datetime;

/// A store backed by a file in a temp directory that lives as long as the store.
#[allow(dead_code)]
pub struct TestStore {
    pub store: SqliteStore,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
pub async fn test_store() -> TestStore {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteStore::new(temp_dir.path().join("metadata.db"), None)
        .await
        .unwrap();
    TestStore {
        store,
        _temp_dir: temp_dir,
    }
}

#[allow(dead_code)]
pub fn sample_manifest(id: &str, runtime_version: &str, version: i64) -> Manifest {
    let asset = |key: &str| AssetMetadata {
        hash: "47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU".to_string(),
        key: key.to_string(),
        file_extension: ".png".to_string(),
        content_type: "image/png".to_string(),
        url: format!("https://cdn.example.com/{runtime_version}/{version}/assets/{key}"),
    };
    Manifest {
        id: id.to_string(),
        created_at: "2024-03-01T12:00:00.000Z".to_string(),
        runtime_version: runtime_version.to_string(),
        assets: vec![asset("a1")],
        launch_asset: asset("bundle"),
        metadata: Map::new(),
        extra: ManifestExtra {
            expo_client: Map::new(),
            mandatory: false,
            ota_update_version: version.to_string(),
        },
    }
}

#[allow(dead_code)]
pub fn sample_row(platform: Platform, runtime_version: &str, sort_key: i64) -> UpdateRow {
    let id = format!("00000000-0000-0000-0000-{sort_key:012}");
    let manifest = sample_manifest(&id, runtime_version, sort_key);
    UpdateRow::from_manifest(platform, sort_key, &manifest, created_at()).unwrap()
}

#[allow(dead_code)]
pub fn created_at() -> OffsetDateTime {
    datetime!(2024-03-01 12:00:00 UTC)
}

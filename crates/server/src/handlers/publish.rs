//! Publish endpoints: upload path allocation and record sync.

use super::params::{OTA_UPDATE_VERSION_HEADER, UpdateQuery, header_or_query, runtime_version};
use crate::error::{ApiError, ApiResult};
use crate::metrics::record_sync_outcome;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use ota_core::{Manifest, Platform, UploadPath};
use ota_metadata::{UpdateRepo, UpdateRow, next_update_version};
use ota_storage::manifest_key;
use serde::Serialize;
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
pub struct UploadPathResponse {
    pub path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedUpdate {
    pub id: String,
    pub platform: Platform,
    pub sort_key: i64,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub updates: Vec<SyncedUpdate>,
}

/// GET /get-upload-path
///
/// Allocates the next version for the runtime version. Both platform
/// lineages are published together, so the path uses the larger of their
/// next versions.
pub async fn get_upload_path(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UpdateQuery>,
) -> ApiResult<Json<UploadPathResponse>> {
    let runtime_version = runtime_version(&headers, &query)?;
    let repo = state.metadata.as_ref();

    let (android, ios) = tokio::try_join!(
        next_update_version(repo, Platform::Android, runtime_version),
        next_update_version(repo, Platform::Ios, runtime_version),
    )?;
    let path = UploadPath::new(runtime_version, android.max(ios).to_string());

    info!(path = %path, "allocated upload path");
    Ok(Json(UploadPathResponse {
        path: path.to_string(),
    }))
}

/// GET /sync-with-db
///
/// Records the manifests already uploaded under `<rv>/<version>/manifests/`
/// as the newest update of each platform lineage.
pub async fn sync_with_db(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UpdateQuery>,
) -> ApiResult<Json<SyncResponse>> {
    let runtime_version = runtime_version(&headers, &query)?;
    let version = header_or_query(
        &headers,
        OTA_UPDATE_VERSION_HEADER,
        query.ota_update_version.as_deref(),
    )
    .filter(|v| !v.is_empty())
    .ok_or_else(|| ApiError::BadRequest("No otaUpdateVersion provided.".to_string()))?;
    let sort_key = version
        .parse::<i64>()
        .ok()
        .filter(|v| *v >= 1)
        // Keys are built from the number, so "01" must not stand in for "1".
        .filter(|v| v.to_string() == version)
        .ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Invalid otaUpdateVersion: {version}. Expected a positive integer without leading zeros."
            ))
        })?;

    match sync_records(&state, runtime_version, sort_key).await {
        Ok(updates) => {
            record_sync_outcome("created");
            Ok(Json(SyncResponse { updates }))
        }
        Err(e) => {
            record_sync_outcome("failed");
            Err(e.into_not_found(state.config.server.expose_error_details))
        }
    }
}

#[instrument(skip(state))]
async fn sync_records(
    state: &AppState,
    runtime_version: &str,
    sort_key: i64,
) -> ApiResult<Vec<SyncedUpdate>> {
    let version = sort_key.to_string();
    let ios_key = manifest_key(runtime_version, &version, Platform::Ios);
    let android_key = manifest_key(runtime_version, &version, Platform::Android);

    let (ios, android) = tokio::try_join!(
        state.storage.get_object(&ios_key),
        state.storage.get_object(&android_key),
    )?;

    let mut rows = Vec::with_capacity(2);
    for (platform, object) in [(Platform::Ios, ios), (Platform::Android, android)] {
        let manifest = Manifest::from_json(&object.bytes)?;
        if manifest.runtime_version != runtime_version {
            return Err(ApiError::NotFound(format!(
                "{platform} manifest has runtime version {}, expected {runtime_version}",
                manifest.runtime_version
            )));
        }
        rows.push(UpdateRow::from_manifest(
            platform,
            sort_key,
            &manifest,
            object.last_modified,
        )?);
    }

    state.metadata.create_updates(&rows).await?;

    let synced = [Platform::Ios, Platform::Android]
        .into_iter()
        .zip(rows)
        .map(|(platform, row)| {
            info!(id = %row.id, partition_key = %row.partition_key, sort_key, "synced update");
            SyncedUpdate {
                id: row.id,
                platform,
                sort_key,
            }
        })
        .collect();
    Ok(synced)
}

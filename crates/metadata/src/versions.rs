//! Version allocation for update lineages.
//!
//! Allocation reads the latest record and adds one. It is not atomic: two
//! publishers racing on one lineage can pick the same version, and the
//! second insert then fails with `AlreadyExists`.

use crate::error::MetadataResult;
use crate::models::UpdateRow;
use crate::repos::{SortOrder, UpdateRepo};
use ota_core::{Platform, partition_key};
use tracing::instrument;

/// Latest record of the `(platform, runtime version)` lineage, if any.
pub async fn latest_update<R: UpdateRepo + ?Sized>(
    repo: &R,
    platform: Platform,
    runtime_version: &str,
) -> MetadataResult<Option<UpdateRow>> {
    let key = partition_key(platform, runtime_version);
    let mut rows = repo.find_latest(&key, SortOrder::Descending, 1).await?;
    Ok(rows.pop())
}

/// Next version number for a lineage: 1 when empty, otherwise latest + 1.
#[instrument(skip(repo))]
pub async fn next_update_version<R: UpdateRepo + ?Sized>(
    repo: &R,
    platform: Platform,
    runtime_version: &str,
) -> MetadataResult<i64> {
    let latest = latest_update(repo, platform, runtime_version).await?;
    Ok(latest.map_or(1, |row| row.sort_key + 1))
}

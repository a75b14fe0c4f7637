//! Update record store for OTA update lineages.
//!
//! A lineage is every published version for one `(platform, runtime version)`
//! pair, keyed by `<platform>-<runtime version>` and ordered by an integer
//! sort key. This crate stores the records and allocates the next version.

pub mod error;
pub mod models;
pub mod repos;
pub mod store;
pub mod versions;

pub use error::{MetadataError, MetadataResult};
pub use models::UpdateRow;
pub use repos::{SortOrder, UpdateRepo};
pub use store::{MetadataStore, SqliteStore};
pub use versions::{latest_update, next_update_version};

use ota_core::config::MetadataConfig;
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    match config {
        MetadataConfig::Sqlite {
            path,
            query_timeout_secs,
        } => {
            let store = SqliteStore::new(path, *query_timeout_secs).await?;
            Ok(Arc::new(store) as Arc<dyn MetadataStore>)
        }
    }
}

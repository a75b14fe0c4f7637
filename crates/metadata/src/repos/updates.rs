//! Update record repository trait.

use crate::error::MetadataResult;
use crate::models::UpdateRow;
use async_trait::async_trait;

/// Sort direction over a lineage's sort keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// Repository for update records.
#[async_trait]
pub trait UpdateRepo: Send + Sync {
    /// Insert a record. Fails with `AlreadyExists` if the key is taken.
    async fn create_update(&self, update: &UpdateRow) -> MetadataResult<()>;

    /// Insert several records atomically. Either all are written or none.
    async fn create_updates(&self, updates: &[UpdateRow]) -> MetadataResult<()>;

    /// Records of a lineage ordered by sort key.
    async fn find_latest(
        &self,
        partition_key: &str,
        order: SortOrder,
        limit: u32,
    ) -> MetadataResult<Vec<UpdateRow>>;

    /// Get one record by key.
    async fn get_update(
        &self,
        partition_key: &str,
        sort_key: i64,
    ) -> MetadataResult<Option<UpdateRow>>;
}

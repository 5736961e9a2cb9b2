//! The `KeyValueTable` trait defines the row-level surface every table
//! backend provides (remote HTTP, in-memory, test doubles).

use async_trait::async_trait;
use ts_domain::error::Result;

use crate::types::{Column, PrimaryKey, RowExistence};

/// Single-row CRUD against a table keyed by primary key.
///
/// Implementations must be safe to share between tasks; callers hold them
/// as `Arc<dyn KeyValueTable>` and issue concurrent calls without extra
/// coordination.  Row-level atomicity is the implementation's concern.
#[async_trait]
pub trait KeyValueTable: Send + Sync {
    /// Fetch the attribute columns of one row.
    ///
    /// Returns an empty vec when the row does not exist.  At most
    /// `max_versions` versions are returned per column, newest first.
    async fn get_row(
        &self,
        table: &str,
        primary_key: &PrimaryKey,
        max_versions: u32,
    ) -> Result<Vec<Column>>;

    /// Write a row, replacing any existing row with the same key.
    async fn put_row(
        &self,
        table: &str,
        primary_key: &PrimaryKey,
        columns: Vec<Column>,
        condition: RowExistence,
    ) -> Result<()>;

    /// Delete a row.  With [`RowExistence::Ignore`] deleting a missing row
    /// succeeds.
    async fn delete_row(
        &self,
        table: &str,
        primary_key: &PrimaryKey,
        condition: RowExistence,
    ) -> Result<()>;
}

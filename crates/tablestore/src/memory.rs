//! In-process [`KeyValueTable`] backed by a `HashMap`.
//!
//! Behaves like the remote store for everything the session driver relies
//! on: whole-row replacement on put, existence conditions, per-column
//! versions and table-assigned timestamps.  Used by tests and for running
//! the driver without a remote instance.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use ts_domain::error::{Error, Result};

use crate::clock::{Clock, SystemClock};
use crate::table::KeyValueTable;
use crate::types::{Column, PrimaryKey, RowExistence, CONDITION_CHECK_FAIL};

type Rows = HashMap<PrimaryKey, Vec<Column>>;

/// A thread-safe in-memory table store.  Tables are created on first write.
pub struct InMemoryTable {
    tables: RwLock<HashMap<String, Rows>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTable {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Use `clock` to stamp columns written without a timestamp.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Whether a row physically exists, regardless of its contents.
    pub fn contains(&self, table: &str, primary_key: &PrimaryKey) -> bool {
        self.tables
            .read()
            .get(table)
            .is_some_and(|rows| rows.contains_key(primary_key))
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, HashMap::len)
    }

    /// Every stored column version of a row, in write order.
    pub fn raw_row(&self, table: &str, primary_key: &PrimaryKey) -> Option<Vec<Column>> {
        self.tables.read().get(table)?.get(primary_key).cloned()
    }
}

fn check_condition(exists: bool, condition: RowExistence, primary_key: &PrimaryKey) -> Result<()> {
    let ok = match condition {
        RowExistence::Ignore => true,
        RowExistence::ExpectExist => exists,
        RowExistence::ExpectNotExist => !exists,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::Table {
            code: CONDITION_CHECK_FAIL.into(),
            message: format!("condition {condition:?} failed for row {primary_key}"),
        })
    }
}

/// Keep at most `max_versions` versions per column, newest first, with
/// columns in order of first appearance.
fn latest_versions(columns: &[Column], max_versions: u32) -> Vec<Column> {
    let limit = max_versions.max(1) as usize;
    let mut order: Vec<&str> = Vec::new();
    let mut by_name: HashMap<&str, Vec<&Column>> = HashMap::new();

    for col in columns {
        let versions = by_name.entry(col.name.as_str()).or_insert_with(|| {
            order.push(col.name.as_str());
            Vec::new()
        });
        versions.push(col);
    }

    let mut out = Vec::new();
    for name in order {
        if let Some(mut versions) = by_name.remove(name) {
            // Stable sort keeps the later write first among equal timestamps.
            versions.reverse();
            versions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            out.extend(versions.into_iter().take(limit).cloned());
        }
    }
    out
}

#[async_trait]
impl KeyValueTable for InMemoryTable {
    async fn get_row(
        &self,
        table: &str,
        primary_key: &PrimaryKey,
        max_versions: u32,
    ) -> Result<Vec<Column>> {
        let tables = self.tables.read();
        Ok(tables
            .get(table)
            .and_then(|rows| rows.get(primary_key))
            .map(|cols| latest_versions(cols, max_versions))
            .unwrap_or_default())
    }

    async fn put_row(
        &self,
        table: &str,
        primary_key: &PrimaryKey,
        columns: Vec<Column>,
        condition: RowExistence,
    ) -> Result<()> {
        let now = self.clock.now_millis();
        let columns: Vec<Column> = columns
            .into_iter()
            .map(|mut col| {
                col.timestamp.get_or_insert(now);
                col
            })
            .collect();

        let mut tables = self.tables.write();
        let rows = tables.entry(table.to_owned()).or_default();
        check_condition(rows.contains_key(primary_key), condition, primary_key)?;
        rows.insert(primary_key.clone(), columns);
        Ok(())
    }

    async fn delete_row(
        &self,
        table: &str,
        primary_key: &PrimaryKey,
        condition: RowExistence,
    ) -> Result<()> {
        let mut tables = self.tables.write();
        let exists = tables
            .get(table)
            .is_some_and(|rows| rows.contains_key(primary_key));
        check_condition(exists, condition, primary_key)?;
        if let Some(rows) = tables.get_mut(table) {
            rows.remove(primary_key);
        }
        Ok(())
    }
}

//! `ts-tablestore`: row-level table store access for the session driver.
//!
//! Provides the [`KeyValueTable`] trait that abstracts over a single-row
//! keyed table store, the row model ([`PrimaryKey`], [`Column`],
//! [`ColumnValue`], [`RowExistence`]), a signed HTTP implementation
//! ([`HttpTableClient`]), an in-process implementation
//! ([`InMemoryTable`]), and the [`Clock`] used to stamp and age rows.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use ts_domain::config::TablestoreConfig;
//! use ts_tablestore::{HttpTableClient, KeyValueTable, PrimaryKey};
//!
//! # async fn example() -> ts_domain::error::Result<()> {
//! let cfg = TablestoreConfig::default();
//! let client = HttpTableClient::new(&cfg)?;
//!
//! let columns = client
//!     .get_row("php_session", &PrimaryKey::single("key", "sess:abc123"), 1)
//!     .await?;
//! println!("{} columns", columns.len());
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod http;
pub mod memory;
pub mod table;
pub mod types;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use clock::{Clock, ManualClock, SystemClock};
pub use http::HttpTableClient;
pub use memory::InMemoryTable;
pub use table::KeyValueTable;
pub use types::{Column, ColumnType, ColumnValue, PrimaryKey, RowExistence, CONDITION_CHECK_FAIL};

use std::sync::Arc;

use ts_domain::config::TablestoreConfig;
use ts_domain::error::Result;

/// Build the remote table client for `cfg`.
///
/// The client is created once and is meant to be shared by every session
/// operation for the life of the process.
pub fn connect(cfg: &TablestoreConfig) -> Result<Arc<dyn KeyValueTable>> {
    let client = HttpTableClient::new(cfg)?;
    tracing::info!(
        endpoint = %client.endpoint(),
        instance = %cfg.instance_name,
        table = %cfg.table_name,
        "table store client ready"
    );
    Ok(Arc::new(client))
}

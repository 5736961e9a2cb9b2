//! Table-backed session store.
//!
//! Each session maps to one row in the configured table.  `read` fetches
//! the latest version of the row, expires it lazily, and decodes the
//! payload; `write` replaces the row unconditionally; `delete` removes it
//! without requiring it to exist.

use std::sync::Arc;

use ts_domain::config::{Config, SessionConfig};
use ts_domain::error::Result;
use ts_domain::trace::TraceEvent;
use ts_tablestore::{Clock, KeyValueTable, RowExistence, SystemClock};

use crate::record::{primary_key, SessionRecord};

/// Only the newest version of a row is ever read.
const MAX_VERSIONS: u32 = 1;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Session persistence on top of a [`KeyValueTable`].
///
/// The table client is owned by the store and shared by every call; the
/// store itself holds no locks and is safe to share behind an `Arc`.
pub struct SessionStore {
    table: Arc<dyn KeyValueTable>,
    table_name: String,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(
        table: Arc<dyn KeyValueTable>,
        table_name: impl Into<String>,
        config: SessionConfig,
    ) -> Self {
        Self {
            table,
            table_name: table_name.into(),
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source used to stamp writes and evaluate expiry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate `config` and connect to the remote table store.
    ///
    /// Fails before any network activity when the configuration has
    /// error-severity issues.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.ensure_valid()?;
        let table = ts_tablestore::connect(&config.tablestore)?;
        Ok(Self::new(
            table,
            config.tablestore.table_name.clone(),
            config.session.clone(),
        ))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Row key for a session: `prefix ++ session_id`.
    pub fn row_key(&self, session_id: &str) -> String {
        format!("{}{session_id}", self.config.prefix)
    }

    /// Fetch and decode the stored row without applying expiry or
    /// decoding the payload.
    pub async fn read_record(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let key = self.row_key(session_id);
        self.fetch(&key).await
    }

    /// Return the session payload, or an empty payload when the session
    /// does not exist or has expired.  An expired row is deleted.
    pub async fn read(&self, session_id: &str) -> Result<Vec<u8>> {
        let key = self.row_key(session_id);

        let Some(record) = self.fetch(&key).await? else {
            TraceEvent::SessionRead {
                key,
                hit: false,
                bytes: 0,
            }
            .emit();
            return Ok(Vec::new());
        };

        if record.is_expired(self.clock.now_millis()) {
            self.remove(&key).await?;
            TraceEvent::SessionExpired {
                key,
                written_at_ms: record.write_timestamp,
                expire_seconds: record.expire_seconds,
            }
            .emit();
            return Ok(Vec::new());
        }

        let payload = record.payload()?;
        TraceEvent::SessionRead {
            key,
            hit: true,
            bytes: payload.len(),
        }
        .emit();
        Ok(payload)
    }

    /// Store `payload` for the session, replacing any previous row and
    /// restarting its TTL.
    pub async fn write(&self, session_id: &str, payload: &[u8]) -> Result<bool> {
        let key = self.row_key(session_id);
        let record = SessionRecord::encode(
            key.as_str(),
            payload,
            self.config.expire,
            self.config.data_compress,
            self.clock.now_millis(),
        )?;
        if self.config.data_compress {
            tracing::debug!(
                key = %key,
                raw = payload.len(),
                compressed = record.value.len(),
                "session payload compressed"
            );
        }

        self.table
            .put_row(
                &self.table_name,
                &primary_key(&key),
                record.to_columns()?,
                RowExistence::Ignore,
            )
            .await?;

        TraceEvent::SessionWritten {
            key,
            bytes: record.value.len(),
            compressed: self.config.data_compress,
        }
        .emit();
        Ok(true)
    }

    /// Remove the session's row.  Removing a missing session succeeds.
    pub async fn delete(&self, session_id: &str) -> Result<bool> {
        let key = self.row_key(session_id);
        self.remove(&key).await?;
        TraceEvent::SessionDeleted { key }.emit();
        Ok(true)
    }

    async fn fetch(&self, key: &str) -> Result<Option<SessionRecord>> {
        let columns = self
            .table
            .get_row(&self.table_name, &primary_key(key), MAX_VERSIONS)
            .await?;
        SessionRecord::from_columns(key, &columns).inspect_err(|e| {
            tracing::debug!(key = %key, error = %e, "session row could not be decoded");
        })
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.table
            .delete_row(&self.table_name, &primary_key(key), RowExistence::Ignore)
            .await
    }
}

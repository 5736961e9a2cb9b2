//! Session record codec.
//!
//! A session occupies one row keyed by `prefix ++ session_id` in the
//! primary-key column `key`, with two attribute columns written together
//! under one timestamp:
//!
//! | column   | type              | content                                  |
//! |----------|-------------------|------------------------------------------|
//! | `value`  | STRING or BINARY  | raw UTF-8 payload, or zlib-compressed    |
//! | `expire` | INTEGER           | TTL in seconds, `0` = never expires      |
//!
//! The timestamp on `value` is the baseline for expiry.

use ts_domain::error::{Error, Result};
use ts_tablestore::{Column, ColumnType, ColumnValue, PrimaryKey};

use crate::compress;

pub const KEY_COLUMN: &str = "key";
pub const VALUE_COLUMN: &str = "value";
pub const EXPIRE_COLUMN: &str = "expire";

/// Encoding of the `value` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Raw payload in a STRING column.
    Text,
    /// zlib-compressed payload in a BINARY column.
    Binary,
}

impl ValueType {
    pub fn column_type(self) -> ColumnType {
        match self {
            Self::Text => ColumnType::String,
            Self::Binary => ColumnType::Binary,
        }
    }
}

/// One stored session row, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Full row key, prefix included.
    pub key: String,
    /// The `value` column as stored (compressed when `value_type` is
    /// `Binary`).
    pub value: Vec<u8>,
    pub value_type: ValueType,
    pub expire_seconds: u64,
    /// Milliseconds since the Unix epoch.
    pub write_timestamp: i64,
}

/// Primary key of the row holding `key`.
pub fn primary_key(key: &str) -> PrimaryKey {
    PrimaryKey::single(KEY_COLUMN, key)
}

impl SessionRecord {
    /// Build the record for a fresh write of `payload`.
    ///
    /// Without compression the payload is stored as text and must be valid
    /// UTF-8.
    pub fn encode(
        key: impl Into<String>,
        payload: &[u8],
        expire_seconds: u64,
        compressed: bool,
        now_ms: i64,
    ) -> Result<Self> {
        let key = key.into();
        let (value, value_type) = if compressed {
            (compress::compress(payload)?, ValueType::Binary)
        } else {
            std::str::from_utf8(payload).map_err(|e| {
                Error::InvalidPayload(format!(
                    "{key}: payload is not UTF-8 ({e}); enable data_compress to store binary data"
                ))
            })?;
            (payload.to_vec(), ValueType::Text)
        };

        Ok(Self {
            key,
            value,
            value_type,
            expire_seconds,
            write_timestamp: now_ms,
        })
    }

    /// The attribute columns to put, both stamped with `write_timestamp`.
    pub fn to_columns(&self) -> Result<Vec<Column>> {
        let value = match self.value_type {
            ValueType::Text => ColumnValue::String(
                String::from_utf8(self.value.clone())
                    .map_err(|e| Error::InvalidPayload(format!("{}: {e}", self.key)))?,
            ),
            ValueType::Binary => ColumnValue::Binary(self.value.clone()),
        };
        let expire = i64::try_from(self.expire_seconds).map_err(|_| {
            Error::InvalidPayload(format!(
                "{}: expire {} does not fit an INTEGER column",
                self.key, self.expire_seconds
            ))
        })?;

        Ok(vec![
            Column::new(VALUE_COLUMN, value).with_timestamp(self.write_timestamp),
            Column::new(EXPIRE_COLUMN, ColumnValue::Integer(expire))
                .with_timestamp(self.write_timestamp),
        ])
    }

    /// Decode the columns of the row stored under `key`.
    ///
    /// Returns `Ok(None)` when there are no columns (no such row) and
    /// [`Error::CorruptRecord`] when the row does not look like a session.
    pub fn from_columns(key: &str, columns: &[Column]) -> Result<Option<Self>> {
        if columns.is_empty() {
            return Ok(None);
        }
        let corrupt = |reason: String| Error::CorruptRecord {
            key: key.to_owned(),
            reason,
        };

        let value_col = columns
            .iter()
            .find(|c| c.name == VALUE_COLUMN)
            .ok_or_else(|| corrupt(format!("missing `{VALUE_COLUMN}` column")))?;
        let (value, value_type) = match &value_col.value {
            ColumnValue::String(s) => (s.as_bytes().to_vec(), ValueType::Text),
            ColumnValue::Binary(b) => (b.clone(), ValueType::Binary),
            other => {
                return Err(corrupt(format!(
                    "`{VALUE_COLUMN}` column has type {}",
                    other.column_type()
                )))
            }
        };
        let write_timestamp = value_col
            .timestamp
            .ok_or_else(|| corrupt(format!("`{VALUE_COLUMN}` column has no timestamp")))?;

        let expire_col = columns
            .iter()
            .find(|c| c.name == EXPIRE_COLUMN)
            .ok_or_else(|| corrupt(format!("missing `{EXPIRE_COLUMN}` column")))?;
        let expire_seconds = match &expire_col.value {
            ColumnValue::Integer(i) => u64::try_from(*i)
                .map_err(|_| corrupt(format!("negative `{EXPIRE_COLUMN}` value {i}")))?,
            ColumnValue::String(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| corrupt(format!("`{EXPIRE_COLUMN}` value {s:?} is not a number")))?,
            other => {
                return Err(corrupt(format!(
                    "`{EXPIRE_COLUMN}` column has type {}",
                    other.column_type()
                )))
            }
        };

        Ok(Some(Self {
            key: key.to_owned(),
            value,
            value_type,
            expire_seconds,
            write_timestamp,
        }))
    }

    /// Absolute expiry instant in milliseconds, `None` when the record
    /// never expires.
    pub fn expires_at_ms(&self) -> Option<i64> {
        if self.expire_seconds == 0 {
            return None;
        }
        let ttl_ms = i64::try_from(self.expire_seconds)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        Some(self.write_timestamp.saturating_add(ttl_ms))
    }

    /// Expired strictly after `write_timestamp + expire_seconds * 1000`.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at_ms().is_some_and(|at| now_ms > at)
    }

    /// The caller-visible payload: decompressed for `Binary` values,
    /// verbatim for `Text`.
    pub fn payload(&self) -> Result<Vec<u8>> {
        match self.value_type {
            ValueType::Text => Ok(self.value.clone()),
            ValueType::Binary => compress::decompress(&self.value).map_err(|e| {
                Error::CorruptRecord {
                    key: self.key.clone(),
                    reason: format!("undecodable `{VALUE_COLUMN}`: {e}"),
                }
            }),
        }
    }
}

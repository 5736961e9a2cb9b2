//! HTTP implementation of [`KeyValueTable`].
//!
//! `HttpTableClient` wraps a `reqwest::Client` and maps each row operation
//! onto a `POST {endpoint}/{Action}` call against a Tablestore-compatible
//! JSON gateway.  Requests are signed with HMAC-SHA256 over the action,
//! date, instance and body digest.  There is no retry: a failed call
//! surfaces immediately.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use ts_domain::config::TablestoreConfig;
use ts_domain::error::{Error, Result};
use ts_domain::trace::TraceEvent;
use uuid::Uuid;

use crate::table::KeyValueTable;
use crate::types::{Column, ColumnType, ColumnValue, PrimaryKey, RowExistence};

type HmacSha256 = Hmac<Sha256>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A signed HTTP client for one table store instance.
///
/// Created once and reused for the lifetime of the process.  The
/// underlying `reqwest::Client` maintains a connection pool.
#[derive(Clone)]
pub struct HttpTableClient {
    http: Client,
    endpoint: String,
    instance_name: String,
    access_key_id: String,
    access_key_secret: String,
}

impl std::fmt::Debug for HttpTableClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTableClient")
            .field("endpoint", &self.endpoint)
            .field("instance_name", &self.instance_name)
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

impl HttpTableClient {
    /// Build a client from the connection settings.
    ///
    /// Fails with [`Error::Config`] when a required setting is missing or a
    /// timeout is not a positive number of seconds.
    pub fn new(cfg: &TablestoreConfig) -> Result<Self> {
        let endpoint = cfg.endpoint.trim().trim_end_matches('/').to_owned();
        if endpoint.is_empty() {
            return Err(Error::Config("tablestore.endpoint must not be empty".into()));
        }
        for (field, value) in [
            ("instance_name", &cfg.instance_name),
            ("access_key_id", &cfg.access_key_id),
            ("access_key_secret", &cfg.access_key_secret),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("tablestore.{field} must not be empty")));
            }
        }
        for (field, secs) in [
            ("connection_timeout", cfg.connection_timeout),
            ("socket_timeout", cfg.socket_timeout),
        ] {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(Error::Config(format!(
                    "tablestore.{field} must be a positive number of seconds (got {secs})"
                )));
            }
        }

        let http = Client::builder()
            .connect_timeout(cfg.connection_timeout())
            .timeout(cfg.socket_timeout())
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            endpoint,
            instance_name: cfg.instance_name.clone(),
            access_key_id: cfg.access_key_id.clone(),
            access_key_secret: cfg.access_key_secret.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sign and send one action, mapping non-success statuses to errors.
    async fn call<B: Serialize>(&self, action: &str, table: &str, body: &B) -> Result<Response> {
        let body = serde_json::to_vec(body)?;
        let path = format!("/{action}");
        let date = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let signature = sign(
            &self.access_key_secret,
            &path,
            &date,
            &self.instance_name,
            &body,
        );

        let start = Instant::now();
        let result = self
            .http
            .post(format!("{}{path}", self.endpoint))
            .header("Content-Type", "application/json")
            .header("x-ots-instancename", &self.instance_name)
            .header("x-ots-accesskeyid", &self.access_key_id)
            .header("x-ots-date", &date)
            .header("x-ots-requestid", Uuid::new_v4().to_string())
            .header("x-ots-signature", signature)
            .body(body)
            .send()
            .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let status = match &result {
            Ok(resp) => resp.status().as_u16(),
            Err(e) => e.status().map(|s| s.as_u16()).unwrap_or(0),
        };
        TraceEvent::TableCall {
            action: action.to_owned(),
            table: table.to_owned(),
            status,
            duration_ms,
        }
        .emit();

        let resp = result.map_err(from_reqwest)?;
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        Err(error_from_status(action, status, &text))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl KeyValueTable for HttpTableClient {
    async fn get_row(
        &self,
        table: &str,
        primary_key: &PrimaryKey,
        max_versions: u32,
    ) -> Result<Vec<Column>> {
        let req = GetRowRequest {
            table_name: table,
            primary_key,
            max_versions,
        };
        let resp = self.call("GetRow", table, &req).await?;

        let body = resp.text().await.map_err(from_reqwest)?;
        let parsed: GetRowResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Http(format!("failed to parse GetRow response: {e}: {body}")))?;
        parsed
            .attribute_columns
            .into_iter()
            .map(WireColumn::into_column)
            .collect()
    }

    async fn put_row(
        &self,
        table: &str,
        primary_key: &PrimaryKey,
        columns: Vec<Column>,
        condition: RowExistence,
    ) -> Result<()> {
        let attribute_columns = columns
            .iter()
            .map(WireColumn::from_column)
            .collect::<Result<Vec<_>>>()?;
        let req = PutRowRequest {
            table_name: table,
            primary_key,
            attribute_columns,
            condition,
        };
        self.call("PutRow", table, &req).await?;
        Ok(())
    }

    async fn delete_row(
        &self,
        table: &str,
        primary_key: &PrimaryKey,
        condition: RowExistence,
    ) -> Result<()> {
        let req = DeleteRowRequest {
            table_name: table,
            primary_key,
            condition,
        };
        self.call("DeleteRow", table, &req).await?;
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire format
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Serialize)]
struct GetRowRequest<'a> {
    table_name: &'a str,
    primary_key: &'a PrimaryKey,
    max_versions: u32,
}

#[derive(Deserialize)]
struct GetRowResponse {
    #[serde(default)]
    attribute_columns: Vec<WireColumn>,
}

#[derive(Serialize)]
struct PutRowRequest<'a> {
    table_name: &'a str,
    primary_key: &'a PrimaryKey,
    attribute_columns: Vec<WireColumn>,
    condition: RowExistence,
}

#[derive(Serialize)]
struct DeleteRowRequest<'a> {
    table_name: &'a str,
    primary_key: &'a PrimaryKey,
    condition: RowExistence,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

/// A column as it travels over the wire.  BINARY values are hex-encoded.
#[derive(Debug, Serialize, Deserialize)]
struct WireColumn {
    name: String,
    #[serde(rename = "type")]
    column_type: ColumnType,
    value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<i64>,
}

impl WireColumn {
    fn from_column(col: &Column) -> Result<Self> {
        use serde_json::Value;

        let value = match &col.value {
            ColumnValue::String(s) => Value::String(s.clone()),
            ColumnValue::Integer(i) => Value::from(*i),
            ColumnValue::Binary(b) => Value::String(hex::encode(b)),
            ColumnValue::Boolean(b) => Value::Bool(*b),
            ColumnValue::Double(d) => serde_json::Number::from_f64(*d)
                .map(Value::Number)
                .ok_or_else(|| {
                    Error::InvalidPayload(format!("column {}: {d} is not representable", col.name))
                })?,
        };
        Ok(Self {
            name: col.name.clone(),
            column_type: col.value.column_type(),
            value,
            timestamp: col.timestamp,
        })
    }

    fn into_column(self) -> Result<Column> {
        use serde_json::Value;

        let malformed = |name: &str, ty: ColumnType| {
            Error::Http(format!("malformed {ty} value for column {name}"))
        };

        let value = match (self.column_type, self.value) {
            (ColumnType::String, Value::String(s)) => ColumnValue::String(s),
            (ColumnType::Integer, Value::Number(n)) => ColumnValue::Integer(
                n.as_i64()
                    .ok_or_else(|| malformed(&self.name, ColumnType::Integer))?,
            ),
            (ColumnType::Binary, Value::String(s)) => ColumnValue::Binary(
                hex::decode(&s).map_err(|_| malformed(&self.name, ColumnType::Binary))?,
            ),
            (ColumnType::Boolean, Value::Bool(b)) => ColumnValue::Boolean(b),
            (ColumnType::Double, Value::Number(n)) => ColumnValue::Double(
                n.as_f64()
                    .ok_or_else(|| malformed(&self.name, ColumnType::Double))?,
            ),
            (ty, _) => return Err(malformed(&self.name, ty)),
        };
        Ok(Column {
            name: self.name,
            value,
            timestamp: self.timestamp,
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Signing and error helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute the `x-ots-signature` header value.
///
/// `hex(HMAC-SHA256(secret, "POST\n{path}\n{date}\n{instance}\n{hex(sha256(body))}"))`
pub fn sign(secret: &str, path: &str, date: &str, instance: &str, body: &[u8]) -> String {
    let body_digest = hex::encode(Sha256::digest(body));
    let canonical = format!("POST\n{path}\n{date}\n{instance}\n{body_digest}");

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Map a non-success response to a domain error.
///
/// 401/403 become `Error::Auth`; everything else becomes `Error::Table`,
/// using the `{"code", "message"}` body when the store sent one.
fn error_from_status(action: &str, status: StatusCode, body: &str) -> Error {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Error::Auth(format!("{action} rejected ({}): {body}", status.as_u16()));
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => Error::Table {
            code: err.code,
            message: err.message,
        },
        Err(_) => Error::Table {
            code: format!("HTTP{}", status.as_u16()),
            message: format!("{action} returned {status}: {body}"),
        },
    }
}

/// Convert a `reqwest::Error` into a domain `Error`.
///
/// Timeout errors become `Error::Timeout`; everything else becomes
/// `Error::Http`.
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

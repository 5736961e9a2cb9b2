//! One-shot session commands: read, write, delete, inspect.

use std::io::Write;

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

use ts_domain::config::Config;
use ts_sessions::{SessionRecord, SessionStore, ValueType};

fn connect(config: &Config) -> anyhow::Result<SessionStore> {
    SessionStore::from_config(config).context("building session store")
}

pub async fn read(config: &Config, id: &str) -> anyhow::Result<()> {
    let store = connect(config)?;
    let payload = store
        .read(id)
        .await
        .with_context(|| format!("reading session {id}"))?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&payload)?;
    stdout.flush()?;
    Ok(())
}

pub async fn write(
    config: &Config,
    id: &str,
    data: Option<String>,
    file: Option<String>,
) -> anyhow::Result<()> {
    let payload = match (data, file) {
        (Some(data), _) => data.into_bytes(),
        (None, Some(path)) => std::fs::read(&path).with_context(|| format!("reading {path}"))?,
        (None, None) => anyhow::bail!("provide the payload as an argument or with --file"),
    };

    let store = connect(config)?;
    store
        .write(id, &payload)
        .await
        .with_context(|| format!("writing session {id}"))?;
    println!("wrote {} byte(s) to {}", payload.len(), store.row_key(id));
    Ok(())
}

pub async fn delete(config: &Config, id: &str) -> anyhow::Result<()> {
    let store = connect(config)?;
    store
        .delete(id)
        .await
        .with_context(|| format!("deleting session {id}"))?;
    println!("deleted {}", store.row_key(id));
    Ok(())
}

pub async fn inspect(config: &Config, id: &str, as_json: bool) -> anyhow::Result<()> {
    let store = connect(config)?;
    let record = store
        .read_record(id)
        .await
        .with_context(|| format!("inspecting session {id}"))?;
    let now_ms = Utc::now().timestamp_millis();

    match record {
        None if as_json => println!("{}", json!({ "key": store.row_key(id), "exists": false })),
        None => println!("{}: no such session", store.row_key(id)),
        Some(record) if as_json => {
            println!("{}", serde_json::to_string_pretty(&describe(&record, now_ms))?)
        }
        Some(record) => {
            let view = describe(&record, now_ms);
            for (field, value) in view.as_object().into_iter().flatten() {
                println!("{field:>15}: {}", value.as_str().map_or_else(|| value.to_string(), str::to_owned));
            }
        }
    }
    Ok(())
}

fn format_ms(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| ms.to_string())
}

/// Metadata view of a stored row at `now_ms`.
fn describe(record: &SessionRecord, now_ms: i64) -> serde_json::Value {
    let value_type = match record.value_type {
        ValueType::Text => "text",
        ValueType::Binary => "binary",
    };
    let payload_bytes = record.payload().ok().map(|p| p.len());

    json!({
        "key": record.key,
        "exists": true,
        "value_type": value_type,
        "stored_bytes": record.value.len(),
        "payload_bytes": payload_bytes,
        "expire_seconds": record.expire_seconds,
        "written_at": format_ms(record.write_timestamp),
        "expires_at": record.expires_at_ms().map(format_ms),
        "expired": record.is_expired(now_ms),
    })
}

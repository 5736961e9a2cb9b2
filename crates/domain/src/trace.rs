use serde::Serialize;

/// Structured trace events emitted across all tablesession crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    TableCall {
        action: String,
        table: String,
        status: u16,
        duration_ms: u64,
    },
    SessionRead {
        key: String,
        hit: bool,
        bytes: usize,
    },
    SessionWritten {
        key: String,
        bytes: usize,
        compressed: bool,
    },
    SessionDeleted {
        key: String,
    },
    SessionExpired {
        key: String,
        written_at_ms: i64,
        expire_seconds: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "ts_event");
    }
}

/// Shared error type used across all tablesession crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("auth: {0}")]
    Auth(String),

    /// The table store rejected the call (condition check, unknown table,
    /// throttling, ...).
    #[error("table store {code}: {message}")]
    Table { code: String, message: String },

    #[error("config: {0}")]
    Config(String),

    /// A row exists under `key` but does not have the shape of a session
    /// record.
    #[error("corrupt session record {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    #[error("compression: {0}")]
    Compression(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session record policy
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How session rows are keyed, expired and encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Time-to-live in seconds, measured from the last write.  `0` disables
    /// expiry entirely.
    #[serde(default = "d_expire")]
    pub expire: u64,

    /// Prepended to every session ID to form the row's primary key.
    #[serde(default)]
    pub prefix: String,

    /// Store payloads zlib-compressed in a BINARY column instead of as
    /// plain STRING columns.
    #[serde(default)]
    pub data_compress: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expire: d_expire(),
            prefix: String::new(),
            data_compress: false,
        }
    }
}

fn d_expire() -> u64 {
    3600
}

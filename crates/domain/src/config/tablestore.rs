use serde::{Deserialize, Serialize};
use std::time::Duration;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tablestore connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection settings for the remote table store.
///
/// Timeouts are expressed in (fractional) seconds to match the way
/// Tablestore SDKs are usually configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablestoreConfig {
    /// Instance endpoint, e.g. `https://my-instance.cn-hangzhou.ots.aliyuncs.com`.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub access_key_secret: String,
    #[serde(default)]
    pub instance_name: String,
    /// Table holding one row per session.
    #[serde(default)]
    pub table_name: String,
    #[serde(default = "d_timeout")]
    pub connection_timeout: f64,
    #[serde(default = "d_timeout")]
    pub socket_timeout: f64,
}

impl Default for TablestoreConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_key_id: String::new(),
            access_key_secret: String::new(),
            instance_name: String::new(),
            table_name: String::new(),
            connection_timeout: d_timeout(),
            socket_timeout: d_timeout(),
        }
    }
}

impl TablestoreConfig {
    /// Connection timeout as a `Duration`.  Callers are expected to have
    /// validated the value first; invalid values collapse to the default.
    pub fn connection_timeout(&self) -> Duration {
        secs_to_duration(self.connection_timeout)
    }

    /// Per-request (socket) timeout as a `Duration`.
    pub fn socket_timeout(&self) -> Duration {
        secs_to_duration(self.socket_timeout)
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or_else(|| Duration::from_secs_f64(d_timeout()))
}

fn d_timeout() -> f64 {
    2.0
}

mod observability;
mod session;
mod tablestore;

pub use observability::*;
pub use session::*;
pub use tablestore::*;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tablestore: TablestoreConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let ts = &self.tablestore;

        let endpoint = ts.endpoint.trim();
        if endpoint.is_empty() {
            errors.push(ConfigError::error(
                "tablestore.endpoint",
                "endpoint must not be empty",
            ));
        } else if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            errors.push(ConfigError::error(
                "tablestore.endpoint",
                "endpoint must start with http:// or https://",
            ));
        } else if endpoint.starts_with("http://") {
            errors.push(ConfigError::warning(
                "tablestore.endpoint",
                "plain http endpoint sends signed requests unencrypted",
            ));
        }

        let required = [
            ("tablestore.access_key_id", &ts.access_key_id),
            ("tablestore.access_key_secret", &ts.access_key_secret),
            ("tablestore.instance_name", &ts.instance_name),
            ("tablestore.table_name", &ts.table_name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(ConfigError::error(field, "must not be empty"));
            }
        }

        let timeouts = [
            ("tablestore.connection_timeout", ts.connection_timeout),
            ("tablestore.socket_timeout", ts.socket_timeout),
        ];
        for (field, secs) in timeouts {
            if !secs.is_finite() || secs <= 0.0 {
                errors.push(ConfigError::error(
                    field,
                    format!("timeout must be a positive number of seconds (got {secs})"),
                ));
            }
        }

        if self.session.expire == 0 {
            errors.push(ConfigError::warning(
                "session.expire",
                "expire = 0: sessions never expire and rows are never cleaned up",
            ));
        }

        errors
    }

    /// Fail with [`Error::Config`] when [`validate`](Self::validate) reports
    /// any error-severity issue. Warnings are logged and otherwise ignored.
    pub fn ensure_valid(&self) -> Result<()> {
        let issues = self.validate();
        let mut fatal = Vec::new();
        for issue in issues {
            match issue.severity {
                ConfigSeverity::Warning => {
                    tracing::warn!(field = %issue.field, "{}", issue.message);
                }
                ConfigSeverity::Error => fatal.push(issue.to_string()),
            }
        }

        if fatal.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(fatal.join("; ")))
        }
    }
}

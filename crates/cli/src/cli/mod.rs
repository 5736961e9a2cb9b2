pub mod config;
pub mod doctor;
pub mod session;

use std::path::Path;

use clap::{Parser, Subcommand};

use ts_domain::config::Config;

/// tablesession: inspect and manage sessions stored in a Tablestore table.
#[derive(Debug, Parser)]
#[command(name = "tablesession", version, about)]
pub struct Cli {
    /// Config file (overrides `TABLESESSION_CONFIG`).
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Check the configuration and table store connectivity.
    Doctor,
    /// Print a session's payload to stdout (nothing when absent or expired).
    Read {
        /// Session ID (without prefix).
        id: String,
    },
    /// Store a session payload, replacing any existing one.
    Write {
        /// Session ID (without prefix).
        id: String,
        /// Payload; read from `--file` when omitted.
        data: Option<String>,
        /// Read the payload from a file.
        #[arg(long, conflicts_with = "data")]
        file: Option<String>,
    },
    /// Delete a session.  Deleting a missing session succeeds.
    Delete {
        /// Session ID (without prefix).
        id: String,
    },
    /// Show a session row's metadata without expiring it.
    Inspect {
        /// Session ID (without prefix).
        id: String,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Resolve the config path: `--config`, then `TABLESESSION_CONFIG`, then
/// `tablesession.toml`.
pub fn config_path(explicit: Option<&str>) -> String {
    explicit
        .map(str::to_owned)
        .or_else(|| std::env::var("TABLESESSION_CONFIG").ok())
        .unwrap_or_else(|| "tablesession.toml".into())
}

/// Load the configuration at `config_path`, falling back to defaults when
/// the file does not exist.
pub fn load_config(config_path: &str) -> anyhow::Result<Config> {
    if !Path::new(config_path).exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}

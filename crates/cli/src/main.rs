use clap::Parser;
use tracing_subscriber::EnvFilter;

use ts_cli::cli::{self, Cli, Command, ConfigCommand};
use ts_domain::config::{LogFormat, ObservabilityConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli::config_path(cli.config.as_deref());

    match cli.command {
        Command::Version => {
            println!("tablesession {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Config(ConfigCommand::Validate) => {
            let config = cli::load_config(&config_path)?;
            if !cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            let config = cli::load_config(&config_path)?;
            cli::config::show(&config)
        }
        Command::Doctor => {
            let config = cli::load_config(&config_path)?;
            init_tracing(&config.observability);
            if !cli::doctor::run(&config, &config_path).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Read { id } => {
            let config = cli::load_config(&config_path)?;
            init_tracing(&config.observability);
            cli::session::read(&config, &id).await
        }
        Command::Write { id, data, file } => {
            let config = cli::load_config(&config_path)?;
            init_tracing(&config.observability);
            cli::session::write(&config, &id, data, file).await
        }
        Command::Delete { id } => {
            let config = cli::load_config(&config_path)?;
            init_tracing(&config.observability);
            cli::session::delete(&config, &id).await
        }
        Command::Inspect { id, json } => {
            let config = cli::load_config(&config_path)?;
            init_tracing(&config.observability);
            cli::session::inspect(&config, &id, json).await
        }
    }
}

/// Initialize stderr tracing so diagnostics never mix with payloads on
/// stdout.  `RUST_LOG` overrides the configured level.
fn init_tracing(obs: &ObservabilityConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&obs.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match obs.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vr_cli::cli::analyze::AnalyzeArgs;
use vr_cli::cli::{self, Cli, Command, ConfigCommand, HistoryCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_cli_tracing();

    let (config, config_path) = match cli.command {
        Command::Version => {
            println!("vibe-ripper {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => cli::load_config()?,
    };
    if let Command::Config(ConfigCommand::Validate) = cli.command {
        if !cli::config::validate(&config, &config_path) {
            std::process::exit(1);
        }
        return Ok(());
    }
    let store = cli::open_store(&config)?;

    match cli.command {
        Command::Analyze {
            path,
            guidance,
            expand,
            json,
        } => {
            cli::ensure_access(&config, store.clone())?;
            let args = AnalyzeArgs {
                path: &path,
                guidance,
                expand,
                json,
            };
            cli::analyze::run(&config, store, args).await
        }
        Command::History(HistoryCommand::List { json }) => {
            cli::ensure_access(&config, store.clone())?;
            cli::history::list(store, json)
        }
        Command::History(HistoryCommand::Show { index, json }) => {
            cli::ensure_access(&config, store.clone())?;
            cli::history::show(&config, store, index, json)
        }
        Command::Config(ConfigCommand::Show) => cli::config::show(&config, store.as_ref()),
        Command::Config(ConfigCommand::SetKey { key }) => cli::config::set_key(store.as_ref(), &key),
        Command::Config(ConfigCommand::ClearKey) => cli::config::clear_key(store.as_ref()),
        Command::Unlock { secret } => cli::unlock(&config, store, &secret),
        Command::Lock => cli::lock(&config, store),
        Command::Config(ConfigCommand::Validate) | Command::Version => Ok(()),
    }
}

/// Compact logs on stderr so stdout carries only results.
fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

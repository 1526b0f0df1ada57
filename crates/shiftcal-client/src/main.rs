//! shiftcal CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use shiftcal_core::{TracingConfig, init_tracing};
use shiftcal_server::Pipeline;

use shiftcal_client::cli::{AuthProvider, Cli, Command, ConfigAction};
use shiftcal_client::commands;
use shiftcal_client::config::ClientConfig;
use shiftcal_client::error::ClientResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = match (&cli.command, cli.debug) {
        (Command::Serve { .. }, false) => TracingConfig::server(),
        (Command::Serve { .. }, true) => TracingConfig::server().with_level(tracing::Level::DEBUG),
        (_, true) => TracingConfig::cli_debug(),
        (_, false) => TracingConfig::cli(),
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: could not initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = if cli.config.is_some() {
        ClientConfig::load_from(&config_path)?
    } else {
        ClientConfig::load()?
    };

    match cli.command {
        Command::Auth { provider } => match provider {
            #[cfg(feature = "google")]
            AuthProvider::Google {
                client_id,
                client_secret,
                credentials_file,
                force,
                logout,
            } => {
                let args = commands::auth::GoogleAuthArgs {
                    client_id,
                    client_secret,
                    credentials_file,
                    force,
                    logout,
                };
                commands::auth::google(args, &config, &config_path).await
            }
        },
        Command::Calendars => {
            let pipeline = connected_pipeline(&config)?;
            commands::import::calendars(&pipeline).await
        }
        Command::People { roster } => commands::roster::people(&roster),
        Command::Preview {
            roster,
            person,
            json,
        } => {
            let pipeline = offline_pipeline(&config);
            commands::roster::preview(&pipeline, &roster, &person, json)
        }
        Command::Import {
            roster,
            person,
            calendar,
            dry_run,
        } => {
            let pipeline = if dry_run {
                offline_pipeline(&config)
            } else {
                connected_pipeline(&config)?
            };
            commands::import::import(&pipeline, &roster, &person, &calendar, dry_run).await
        }
        Command::Serve { bind } => commands::serve::run(&config, bind).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}

/// Pipeline backed by the configured calendar provider.
fn connected_pipeline(config: &ClientConfig) -> ClientResult<Pipeline> {
    let provider = commands::calendar_provider(config)?;
    Ok(Pipeline::new(provider, config.roster.event_builder()))
}

/// Pipeline for commands that never reach a calendar.
fn offline_pipeline(config: &ClientConfig) -> Pipeline {
    let provider = std::sync::Arc::new(shiftcal_providers::MemoryCalendar::new());
    Pipeline::new(provider, config.roster.event_builder())
}

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sl_cli::commands::{chart, compare, import, logs, timeline, treatments};
use sl_cli::{Cli, Commands, Config, TreatmentsAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(sl_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = sl_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match &cli.command {
        Some(Commands::Import) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            import::run(&mut db)?;
        }
        Some(Commands::Logs { filters, json }) => {
            // Opening first creates the schema; the fetches use their own connections.
            let (_db, config) = open_database(cli.config.as_deref())?;
            logs::run(&config, filters, *json)?;
        }
        Some(Commands::Chart {
            field,
            filters,
            json,
        }) => {
            let (_db, config) = open_database(cli.config.as_deref())?;
            chart::run(&config, *field, filters, *json)?;
        }
        Some(Commands::Compare {
            left,
            right,
            field,
            filters,
            json,
        }) => {
            let (_db, config) = open_database(cli.config.as_deref())?;
            compare::run(&config, left, right, *field, filters, *json)?;
        }
        Some(Commands::Treatments(action)) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                TreatmentsAction::List { json } => treatments::list(&db, *json)?,
                TreatmentsAction::Add {
                    name,
                    category,
                    start,
                    end,
                    reason,
                } => {
                    let span = treatments::Span {
                        start,
                        end: end.as_deref(),
                        reason: reason.clone(),
                    };
                    treatments::run_add(&mut db, name, *category, &span)?;
                }
                TreatmentsAction::End { name, date, reason } => {
                    treatments::run_end(&mut db, name, date.as_deref(), reason.clone())?;
                }
            }
        }
        Some(Commands::Timeline { width, json }) => {
            let (_db, config) = open_database(cli.config.as_deref())?;
            timeline::run(&config, *width, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

//! podium-import - competition results import CLI
//!
//! Two-phase import of results sheets:
//! 1. `extract` stages the table found in a PDF and prints the detected
//!    column mapping with a sample of rows
//! 2. `confirm` imports the staged rows, optionally with a corrected mapping
//!
//! Command output is JSON on stdout; logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use podium_common::config::{resolve_root_folder, RootFolderInitializer, TomlConfig};
use podium_common::time::format_race_time;
use podium_import::db;
use podium_import::models::{ColumnMapping, ConfirmRequest, ResultRecord};

/// Command-line arguments for podium-import
#[derive(Parser, Debug)]
#[command(name = "podium-import")]
#[command(about = "Import competition results from PDF sheets")]
#[command(version)]
struct Args {
    /// TOML config file (defaults to the platform config location)
    #[arg(short, long, env = "PODIUM_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stage a results file for review
    Extract {
        file: PathBuf,
        #[arg(long)]
        competition: Uuid,
    },
    /// Import a staged extraction
    Confirm {
        extraction_id: Uuid,
        #[arg(long)]
        competition: Uuid,
        /// Column mapping as JSON, e.g. '{"nombre":2,"puntos":6}'.
        /// Defaults to the detected mapping.
        #[arg(long)]
        mapping: Option<String>,
    },
    /// List incidents queued for a competition
    Incidents {
        #[arg(long)]
        competition: Uuid,
    },
    /// List stored results of a competition
    Results {
        #[arg(long)]
        competition: Uuid,
    },
    /// Manage the athlete directory
    Athletes {
        #[command(subcommand)]
        command: AthleteCommand,
    },
    /// Manage staged extractions
    Sessions {
        #[command(subcommand)]
        command: SessionCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AthleteCommand {
    /// Register an athlete
    Add {
        full_name: String,
        #[arg(long)]
        club: Option<Uuid>,
    },
    /// List registered athletes
    List,
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Delete expired extractions
    Purge,
}

/// Result row as printed by `results`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultLine<'a> {
    #[serde(flatten)]
    record: &'a ResultRecord,
    /// `tiempo_ms` formatted as a race time
    tiempo: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => TomlConfig::load(path),
        None => TomlConfig::load_default(),
    }
    .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let db_path = initializer.database_path(&config);
    info!(database = %db_path.display(), "Opening database");
    let pool = db::init_database_pool(&db_path).await?;

    let orchestrator = podium_import::build_orchestrator(pool.clone(), &config);

    // Expired extractions from earlier runs are never confirmable
    let purged = orchestrator.purge_expired_sessions().await?;

    match args.command {
        Command::Extract { file, competition } => {
            let summary = orchestrator.extract(&file, competition).await?;
            print_json(&summary)?;
        }
        Command::Confirm {
            extraction_id,
            competition,
            mapping,
        } => {
            let column_mapping = match mapping {
                Some(json) => serde_json::from_str::<ColumnMapping>(&json)
                    .context("Invalid --mapping JSON")?,
                None => orchestrator.staged(extraction_id).await?.detected_columns,
            };
            let summary = orchestrator
                .confirm(ConfirmRequest {
                    extraction_id,
                    competition_id: competition,
                    column_mapping,
                })
                .await?;
            print_json(&summary)?;
        }
        Command::Incidents { competition } => {
            let incidents = orchestrator.get_incidencias(competition).await?;
            print_json(&incidents)?;
        }
        Command::Results { competition } => {
            let results = orchestrator.get_results(competition).await?;
            let lines: Vec<ResultLine> = results
                .iter()
                .map(|record| ResultLine {
                    record,
                    tiempo: record.tiempo_ms.map(format_race_time),
                })
                .collect();
            print_json(&lines)?;
        }
        Command::Athletes { command } => match command {
            AthleteCommand::Add { full_name, club } => {
                let athlete = db::athletes::add_athlete(&pool, &full_name, club).await?;
                print_json(&athlete)?;
            }
            AthleteCommand::List => {
                let athletes = db::athletes::list_athletes(&pool).await?;
                print_json(&athletes)?;
            }
        },
        Command::Sessions {
            command: SessionCommand::Purge,
        } => {
            print_json(&serde_json::json!({ "purged": purged }))?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use repertoire_discovery::Config;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "repertoire", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the database (default: ~/.local/share/repertoire/repertoire.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Discover a songwriter's catalog
    ///
    /// Resolves the songwriter against MusicBrainz, collects works from the
    /// catalog and from the ASCAP, BMI and SESAC repertoires, merges them
    /// into one candidate per work, and keeps the best corroborated
    /// candidates. Each kept work is enriched with co-writers, publisher
    /// shares and an ISWC, and checked for registration gaps:
    ///
    /// - missing_iswc: no ISWC from any source
    /// - unregistered_in_pros: no PRO reported the work
    /// - conflicting_writers / conflicting_splits / conflicting_publishers:
    ///   two PROs disagree about the work's attribution
    ///
    /// A failing source never stops the run; its status is recorded in the
    /// request's source report. PRO extraction needs `extraction_api_key`
    /// (see 'repertoire config example').
    ///
    /// Database: the request is stored in 'discovery_requests' and each
    /// discovered work in 'discovered_works'. Use 'repertoire works <id>'
    /// to list them.
    Discover {
        /// Songwriter name as commonly credited
        name: String,

        /// User the request is recorded for
        #[arg(long, default_value = "cli")]
        user: String,

        /// Number of works to keep (default: config default_max_songs)
        #[arg(long)]
        max_songs: Option<u32>,
    },
    /// Show discovery requests
    Status {
        /// Show a single request in detail
        request_id: Option<String>,
    },
    /// List the works discovered for a request
    Works {
        request_id: String,

        /// Print rows as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print one setting, or the whole config file when no key is given
    Get { key: Option<String> },
    /// Write a setting to the config file
    Set { key: String, value: String },
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
}

fn setup_logging(config: &Config) -> Result<()> {
    let level = match config.log_level.to_lowercase().as_str() {
        "trace" => twyg::LogLevel::Trace,
        "debug" => twyg::LogLevel::Debug,
        "warn" | "warning" => twyg::LogLevel::Warn,
        "error" => twyg::LogLevel::Error,
        _ => twyg::LogLevel::Info,
    };

    let opts = twyg::OptsBuilder::new()
        .coloured(config.log_coloured)
        .level(level)
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid logging options: {e:?}"))?;
    twyg::setup(opts).map_err(|e| anyhow::anyhow!("Could not set up logging: {e:?}"))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.db {
        Some(db) => Config::load_with_db_path(db)?,
        None => Config::load()?,
    };
    setup_logging(&config)?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    match cli.command {
        Commands::Discover {
            name,
            user,
            max_songs,
        } => {
            commands::run_discover(&config, name, user, max_songs).await?;
        }
        Commands::Status { request_id } => {
            commands::show_status(&config.database_path, request_id.as_deref())?;
        }
        Commands::Works { request_id, json } => {
            commands::list_works(&config.database_path, &request_id, json)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config)?,
            ConfigAction::Get { key } => commands::config::get_config(&config, key.as_deref())?,
            ConfigAction::Set { key, value } => commands::config::set_config(&key, &value)?,
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Example => commands::config::show_example(),
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}

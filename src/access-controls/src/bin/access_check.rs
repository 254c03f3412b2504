//! access-check - run access decisions against a JSON fixture.
//!
//! Loads a repository fixture, runs one check and prints the outcome as JSON
//! on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::error;

use access_controls::logging::setup_logging;
use access_controls::{AccessConfig, AccessControl, InMemoryRepository};
use access_protocol::{AssetType, Role};

/// Asset access checker
#[derive(Parser)]
#[command(name = "access-check")]
#[command(about = "Resolve asset permissions against a JSON fixture")]
#[command(version)]
struct Args {
    /// Repository fixture (JSON)
    #[arg(short, long)]
    fixture: PathBuf,

    /// Configuration file path (TOML). Defaults plus ACCESS_CONTROLS_* overrides otherwise.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,

    /// Print cache statistics after the check
    #[arg(long)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a user's access to an asset at a required role
    Resolve {
        #[arg(long)]
        user: String,
        #[arg(long)]
        asset: String,
        #[arg(long = "type")]
        asset_type: AssetType,
        #[arg(long, default_value = "can_view")]
        role: Role,
    },
    /// Check whether a user can view a chat
    Chat {
        #[arg(long)]
        user: String,
        #[arg(long)]
        chat: String,
    },
    /// List the datasets a user may view
    Datasets {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        page: i64,
        #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
        page_size: i64,
    },
    /// Check whether a user can view every listed dataset
    DatasetAccess {
        #[arg(long)]
        user: String,
        #[arg(long = "dataset", value_delimiter = ',')]
        datasets: Vec<String>,
    },
}

async fn run(args: Args) -> anyhow::Result<serde_json::Value> {
    let config = match &args.config {
        Some(path) => AccessConfig::load(path)?,
        None => AccessConfig::from_env()?,
    };
    let repository = InMemoryRepository::from_json_file(&args.fixture)
        .with_context(|| format!("Failed to load fixture {}", args.fixture.display()))?;
    let access = AccessControl::new(Arc::new(repository), config);

    let mut output = match args.command {
        Command::Resolve {
            user,
            asset,
            asset_type,
            role,
        } => {
            let result = access.resolve_access(&user, &asset, asset_type, role).await?;
            serde_json::to_value(result)?
        }
        Command::Chat { user, chat } => {
            let result = access.check_chat_access(&user, &chat).await?;
            serde_json::to_value(result)?
        }
        Command::Datasets {
            user,
            page,
            page_size,
        } => {
            let datasets = access.get_permissioned_datasets(&user, page, page_size).await?;
            json!({ "datasets": datasets })
        }
        Command::DatasetAccess { user, datasets } => {
            let has_access = access.has_all_datasets_access(&user, &datasets).await?;
            json!({ "has_access": has_access })
        }
    };

    if args.stats {
        output["cache"] = serde_json::to_value(access.cache().stats())?;
    }
    Ok(output)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = setup_logging(&args.log_level, args.json_logs) {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(output) => {
            println!("{output:#}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("access check failed: {e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

//! Issue Tracker
//!
//! Main entry point for the issue tracker server.

use clap::{Parser, Subcommand};
use issue_tracker::config::{StorageBackend, TrackerConfig};
use issue_tracker::server::IssueServer;
use issue_tracker::TrackerError;
use std::path::PathBuf;
use std::process;

/// Issue Tracker - project-scoped issue tracking REST API
#[derive(Parser, Debug)]
#[command(name = "issue-tracker")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/issue-tracker/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Run the HTTP server
    Serve {
        /// Address to listen on (overrides config)
        #[arg(short, long, env = "ISSUE_TRACKER_BIND")]
        bind: Option<String>,

        /// SQLite database path (overrides config)
        #[arg(long, env = "ISSUE_TRACKER_DB", conflicts_with = "memory")]
        db: Option<PathBuf>,

        /// Keep issues in memory only
        #[arg(long)]
        memory: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = issue_tracker::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> issue_tracker::Result<()> {
    match cli.command {
        Commands::Init { force } => handle_init(cli.config, force),
        Commands::Serve { bind, db, memory } => {
            let mut config = match &cli.config {
                Some(path) => TrackerConfig::load(path)?,
                None => TrackerConfig::load_default_or_new()?,
            };

            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(db) = db {
                config.storage.backend = StorageBackend::Sqlite;
                config.storage.path = db;
            }
            if memory {
                config.storage.backend = StorageBackend::Memory;
            }

            let store = config.storage.open()?;
            IssueServer::new(store, config.server)
                .run()
                .await
                .map_err(|e| TrackerError::Other(e.to_string()))
        }
    }
}

fn handle_init(path: Option<PathBuf>, force: bool) -> issue_tracker::Result<()> {
    let path = path.unwrap_or_else(TrackerConfig::default_path);

    if path.exists() && !force {
        return Err(TrackerError::Config(format!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        )));
    }

    TrackerConfig::default().save(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

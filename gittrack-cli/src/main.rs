use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{reflog, status, watch};

#[derive(Parser)]
#[command(name = "gittrack")]
#[command(version, about = "Live tracking of git repository activity", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a folder and print repository events as they happen
    Watch {
        /// Folder to track (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// TOML file with tracker settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print one JSON object per event
        #[arg(long)]
        json: bool,
    },

    /// Show whether a folder belongs to a repository
    Status {
        /// Folder to inspect (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Print the parsed HEAD reflog of the repository containing a folder
    Reflog {
        /// Folder inside the repository (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Number of entries to show, newest first
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch { path, config, json } => {
            watch::run(path, config, json).await?;
        }
        Commands::Status { path } => {
            status::run(path)?;
        }
        Commands::Reflog { path, limit } => {
            reflog::run(path, limit)?;
        }
    }

    Ok(())
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use kevast::Kevast;
use kevast_cli::{AccessLog, StoreConfig};
use tracing::debug;

#[derive(Parser)]
#[command(author, version, about = "Key-value store with replicated writes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON store config; defaults to a single `kevast.db`
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value stored under a key
    Get {
        key: String,

        /// Printed when the key is absent
        #[arg(short, long)]
        default: Option<String>,
    },

    /// Store a value under a key in every backend
    Set { key: String, value: String },

    /// Exit with success if the key exists
    Has { key: String },

    /// Remove a key from every backend
    Delete { key: String },

    /// Remove everything from every backend
    Clear,

    /// List keys
    Keys,

    /// List values
    Values,

    /// List key/value pairs, tab separated
    Entries,

    /// Print the number of keys
    Size,
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => StoreConfig::from_file(path)?,
        None => StoreConfig::default(),
    };
    debug!(?config, "store config");

    let (master, redundancies) = config.open()?;
    let mut kevast = Kevast::new(master, redundancies);
    kevast.use_middleware(AccessLog);

    match cli.command {
        Commands::Get { key, default } => {
            let value = match default {
                Some(default) => Some(kevast.get_or(&key, &default).await?),
                None => kevast.get(&key).await?,
            };
            match value {
                Some(value) => println!("{value}"),
                None => return Ok(ExitCode::FAILURE),
            }
        }
        Commands::Set { key, value } => kevast.set(&key, &value).await?,
        Commands::Has { key } => {
            if !kevast.has(&key).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Delete { key } => kevast.delete(&key).await?,
        Commands::Clear => kevast.clear().await?,
        Commands::Keys => {
            for key in kevast.keys().await? {
                println!("{key}");
            }
        }
        Commands::Values => {
            for value in kevast.values().await? {
                println!("{value}");
            }
        }
        Commands::Entries => {
            for (key, value) in kevast.entries().await? {
                println!("{key}\t{value}");
            }
        }
        Commands::Size => println!("{}", kevast.size().await?),
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            debug!(error = ?e, "command failed");
            eprintln!("kevast: {e}");
            ExitCode::FAILURE
        }
    }
}

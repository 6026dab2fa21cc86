//! CLI command handlers
//!
//! Each subcommand has its own module with handler functions.

pub mod config;
pub mod nearest;
pub mod search;
pub mod serve;
pub mod status;
pub mod weather;

use crate::error::Result;
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Find and rank nearby carparks
#[derive(Parser)]
#[command(name = "carpark-finder")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search carparks around a place or coordinates
    Search(search::SearchArgs),

    /// List the closest carparks to a point
    Nearest(nearest::NearestArgs),

    /// Start web server (foreground)
    Serve(serve::ServeArgs),

    /// Manage configuration
    Config(config::ConfigArgs),

    /// Show providers, metadata and server status
    Status(status::StatusArgs),

    /// Show the weather forecast for a point
    Weather(weather::WeatherArgs),
}

/// Run the CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => search::run(args).await,
        Commands::Nearest(args) => nearest::run(args),
        Commands::Serve(args) => serve::run(args).await,
        Commands::Config(args) => config::run(args),
        Commands::Status(args) => status::run(args).await,
        Commands::Weather(args) => weather::run(args).await,
    }
}

/// Initialize logging to stderr, `RUST_LOG` overriding `default_level`
pub fn init_logging(default_level: &str) {
    // A second init in the same process (tests) is a no-op
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Print to stdout or write to `output`
pub(crate) fn emit(output: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, output)?;
            eprintln!("Output written to {}", path.display());
        }
        None => println!("{}", output),
    }
    Ok(())
}

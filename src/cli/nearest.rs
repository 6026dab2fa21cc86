//! Nearest command handler

use crate::cli::{emit, init_logging};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::get_formatter;
use crate::geo::Coordinates;
use crate::provider::Providers;
use crate::search::CarparkSearch;
use crate::store::{CarparkStore, CsvSources};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Nearest command arguments
#[derive(Args)]
pub struct NearestArgs {
    /// Latitude
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude
    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,

    /// Number of carparks (defaults to defaults.nearest)
    #[arg(short = 'k', long)]
    pub k: Option<usize>,

    /// Output format
    #[arg(long, short = 'f')]
    pub format: Option<String>,

    /// Write output to file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Run the nearest command
///
/// A pure metadata lookup; no upstream provider is contacted.
pub fn run(args: NearestArgs) -> Result<()> {
    init_logging("warn");

    let config = Config::load()?;
    let format = args.format.unwrap_or(config.defaults.format.clone());
    let formatter = get_formatter(&format)
        .ok_or_else(|| Error::Config(format!("Unknown format: {}", format)))?;

    let store = CarparkStore::load(CsvSources::from_config(&config.data))?;
    let search = CarparkSearch::new(Arc::new(store), Providers::mock(), &config.providers);

    let k = args.k.unwrap_or(config.defaults.nearest);
    let result = search.nearest(Coordinates::new(args.lat, args.lng), k)?;

    let output = formatter.format(&result, &config)?;
    emit(&output, args.output.as_deref())
}

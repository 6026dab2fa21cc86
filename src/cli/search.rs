//! Search command handler
//!
//! Resolves the location, runs the search pipeline and prints the result.

use crate::carpark::LotType;
use crate::cli::{emit, init_logging};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::{available_formats, get_formatter};
use crate::geo::Coordinates;
use crate::search::{CarparkSearch, SearchOptions};
use clap::Args;
use std::path::PathBuf;
use std::str::FromStr;

/// Search command arguments
#[derive(Args)]
pub struct SearchArgs {
    /// Place to search around (geocoded)
    #[arg(conflicts_with_all = ["lat", "lng"])]
    pub query: Option<String>,

    /// Latitude
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,

    /// Search radius in meters
    #[arg(long, short = 'r')]
    pub radius: Option<f64>,

    /// Vehicle class: car, heavy, sidecar, motorcycle
    #[arg(long)]
    pub vehicle: Option<String>,

    /// Vehicle height in meters
    #[arg(long)]
    pub height: Option<f64>,

    /// Carpark type: multi, basement, surface, or any substring
    #[arg(long, short = 't')]
    pub r#type: Option<String>,

    /// Maximum road distance in meters
    #[arg(long)]
    pub max_distance: Option<f64>,

    /// Keep only carparks whose name or address contains the query
    #[arg(long)]
    pub include_text: bool,

    /// Use deterministic offline providers
    #[arg(long)]
    pub mock: bool,

    /// Merge live lot availability
    #[arg(long)]
    pub live: bool,

    /// Skip live lot availability even when the config enables it
    #[arg(long, conflicts_with = "live")]
    pub no_live: bool,

    /// Output format
    #[arg(long, short = 'f')]
    pub format: Option<String>,

    /// Write output to file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// List available formats
    #[arg(short = 'F', long = "list-formats")]
    pub list_formats: bool,
}

impl SearchArgs {
    /// Overlay the arguments on the configured defaults
    pub fn options(&self, config: &Config) -> Result<SearchOptions> {
        let mut options = SearchOptions::from_config(config)?;

        if let Some(radius) = self.radius {
            options.radius_m = radius;
        }
        if let Some(vehicle) = &self.vehicle {
            options.vehicle.lot_type = LotType::from_str(vehicle).map_err(Error::InvalidVehicle)?;
        }
        if let Some(height) = self.height {
            options.vehicle.height_m = height;
        }
        if self.live {
            options.live_availability = true;
        } else if self.no_live {
            options.live_availability = false;
        }
        options.carpark_type = self.r#type.clone();
        options.include_text = self.include_text;
        options.max_distance_m = self.max_distance;

        Ok(options)
    }
}

/// Run the search command
pub async fn run(args: SearchArgs) -> Result<()> {
    if args.list_formats {
        list_formats();
        return Ok(());
    }

    init_logging("warn");

    let mut config = Config::load()?;
    if args.mock {
        config.providers.mock = true;
    }

    let format = args.format.clone().unwrap_or(config.defaults.format.clone());
    let formatter = get_formatter(&format)
        .ok_or_else(|| Error::Config(format!("Unknown format: {}", format)))?;

    let options = args.options(&config)?;
    let search = CarparkSearch::from_config(&config)?;

    let result = match (&args.query, args.lat, args.lng) {
        (_, Some(lat), Some(lng)) => {
            search
                .search_by_coords(Coordinates::new(lat, lng), &options)
                .await?
        }
        (Some(query), _, _) => {
            let result = search.search_by_text(query, &options).await?;
            if let Some(address) = &result.center.address {
                eprintln!("Searching around: {}", address);
            }
            result
        }
        _ => {
            return Err(Error::Config(
                "No location specified. Give a QUERY or --lat/--lng".to_string(),
            ))
        }
    };

    let output = formatter.format(&result, &config)?;
    emit(&output, args.output.as_deref())
}

/// Print available output formats
fn list_formats() {
    println!("Available output formats:");
    for format in available_formats() {
        println!("  {:<6} - {}", format.name, format.description);
    }
}

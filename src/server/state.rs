//! Server shared state
//!
//! Holds configuration, the search pipeline and the weather lookup shared by
//! every request.

use crate::config::Config;
use crate::error::Result;
use crate::search::CarparkSearch;
use crate::weather::WeatherReport;
use std::sync::Arc;
use std::time::Instant;

/// Shared state for the HTTP server
pub struct AppState {
    /// Configuration the server was started with
    pub config: Config,

    /// Search pipeline over the loaded carpark store
    pub search: Arc<CarparkSearch>,

    /// Best-effort forecasts from the configured weather provider
    pub weather: WeatherReport,

    started: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, search: CarparkSearch) -> Self {
        let weather = WeatherReport::new(Arc::clone(&search.providers().weather));
        Self {
            config,
            search: Arc::new(search),
            weather,
            started: Instant::now(),
        }
    }

    /// Load the carpark store and providers described by `config`
    pub fn from_config(config: Config) -> Result<Self> {
        let search = CarparkSearch::from_config(&config)?;
        Ok(Self::new(config, search))
    }

    /// Seconds since the state was created
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

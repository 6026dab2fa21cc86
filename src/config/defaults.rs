//! Default configuration values
//!
//! Named constants for all tunable parameters

/// Default search radius in meters
pub const DEFAULT_RADIUS: f64 = 3000.0;

/// Default vehicle class
pub const DEFAULT_VEHICLE: &str = "car";

/// Default vehicle height in meters
pub const DEFAULT_VEHICLE_HEIGHT: f64 = crate::carpark::DEFAULT_VEHICLE_HEIGHT_M;

/// Default output format
pub const DEFAULT_FORMAT: &str = "text";

/// Default number of results for nearest lookups
pub const DEFAULT_NEAREST: usize = 10;

/// Default upstream request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 6000;

/// Default number of retries after a failed upstream call
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 2;

/// Default cap on concurrent routing calls per search
pub const DEFAULT_ROUTE_CONCURRENCY: usize = 8;

/// Default carpark metadata file
pub const DEFAULT_CARPARKS_CSV: &str = "data/hdb_carparks.csv";

/// Default carpark rates file
pub const DEFAULT_RATES_CSV: &str = "data/carpark_rates.csv";

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 8080;

/// Default URL provider
pub const DEFAULT_URL_PROVIDER: &str = "google";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "carpark-finder";

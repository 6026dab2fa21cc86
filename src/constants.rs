//! Centralized constants for the carpark-finder crate
//!
//! This module consolidates constants that are used across multiple modules
//! to avoid duplication and ensure consistency.

/// Geographic constants
pub mod geo {
    /// Mean Earth radius in meters (WGS84 approximation)
    pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
}

/// Travel estimation constants
pub mod travel {
    /// Road circuity applied to straight-line distance when routing is unavailable
    pub const ROAD_CIRCUITY_FACTOR: f64 = 1.3;

    /// Assumed average driving speed in km/h
    pub const AVERAGE_SPEED_KMH: f64 = 30.0;

    /// First retry delay in milliseconds
    pub const BACKOFF_BASE_MS: u64 = 200;

    /// Upper bound on a single retry delay in milliseconds
    pub const BACKOFF_MAX_MS: u64 = 2_000;
}

/// Ranking constants
pub mod rank {
    /// Fee score used when no numeric rate can be found
    pub const UNKNOWN_FEE_SCORE: f64 = 999.0;
}

/// External API endpoints
pub mod api {
    /// OneMap (Singapore Land Authority) base URL
    pub const ONEMAP_URL: &str = "https://www.onemap.gov.sg";

    /// data.gov.sg carpark availability endpoint
    pub const DATAGOV_AVAILABILITY_URL: &str =
        "https://api.data.gov.sg/v1/transport/carpark-availability";

    /// data.gov.sg (NEA) 2-hour weather forecast endpoint
    pub const NEA_2_HOUR_URL: &str =
        "https://api.data.gov.sg/v1/environment/2-hour-weather-forecast";

    /// data.gov.sg (NEA) 24-hour weather forecast endpoint
    pub const NEA_24_HOUR_URL: &str =
        "https://api.data.gov.sg/v1/environment/24-hour-weather-forecast";
}

/// Authentication settings
pub mod auth {
    /// Renew a cached token once fewer than this many seconds remain
    pub const TOKEN_RENEW_MARGIN_SECS: i64 = 60;

    /// Token lifetime assumed when the auth response has no usable expiry
    pub const FALLBACK_TOKEN_TTL_SECS: i64 = 3 * 24 * 3600;
}

/// Deterministic mode
pub mod mock {
    /// Latitude returned by the deterministic geocoder
    pub const CENTER_LAT: f64 = 1.300;

    /// Longitude returned by the deterministic geocoder
    pub const CENTER_LNG: f64 = 103.800;
}

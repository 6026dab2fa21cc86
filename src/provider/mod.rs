//! External data providers
//!
//! Each upstream concern is a trait: [`Geocoder`] (text to coordinates),
//! [`RouteProvider`] (driving distance and time), [`AvailabilitySource`]
//! (live lot counts) and [`WeatherSource`] (forecasts). There is one live implementation per concern and one
//! deterministic offline implementation covering all three; which set is used
//! is decided by `providers.mock` in the config.

pub mod datagov;
pub mod mock;
pub mod nea;
pub mod onemap;
pub mod retry;
pub mod token;

use crate::carpark::LotAvailability;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::geo::{Coordinates, GeoLocation};
use crate::weather::Forecasts;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub use retry::RetryPolicy;

/// Live lot counts keyed by carpark id
pub type AvailabilityMap = HashMap<String, LotAvailability>;

/// Driving distance and time between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub distance_m: f64,
    pub duration_s: f64,
}

impl Route {
    pub fn new(distance_m: f64, duration_s: f64) -> Self {
        Self {
            distance_m,
            duration_s,
        }
    }

    /// Both values finite and non-negative
    pub fn is_valid(&self) -> bool {
        self.distance_m.is_finite()
            && self.duration_s.is_finite()
            && self.distance_m >= 0.0
            && self.duration_s >= 0.0
    }
}

/// A request that never got a response
///
/// Timeouts and refused connections may clear up; anything else will not.
pub(crate) fn request_error(what: &str, e: reqwest::Error) -> Error {
    let message = format!("{} request failed: {}", what, e);
    if e.is_timeout() || e.is_connect() {
        Error::Unavailable(message)
    } else {
        Error::Provider(message)
    }
}

/// A non-success response; only server-side trouble and throttling are transient
pub(crate) fn status_error(what: &str, status: reqwest::StatusCode) -> Error {
    let message = format!("{} returned status: {}", what, status);
    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        Error::Unavailable(message)
    } else {
        Error::Provider(message)
    }
}

/// Trait for geocoding backends
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Backend name for logs and status output
    fn name(&self) -> &'static str;

    /// Geocode a location string to coordinates
    ///
    /// Returns the best match for the query, or None if not found
    async fn geocode(&self, query: &str) -> Result<Option<GeoLocation>>;
}

/// Trait for driving route backends
#[async_trait]
pub trait RouteProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// A single routing attempt; retries and fallback live in the caller
    async fn route(&self, from: Coordinates, to: Coordinates) -> Result<Route>;
}

/// Trait for live lot availability feeds
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Current counts for every carpark the feed knows about
    async fn fetch(&self) -> Result<AvailabilityMap>;
}

/// Trait for weather forecast feeds
#[async_trait]
pub trait WeatherSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Forecasts for the area around `at`, None if the feed has none
    async fn forecast(&self, at: Coordinates) -> Result<Option<Forecasts>>;
}

/// The provider set a search runs against
#[derive(Clone)]
pub struct Providers {
    pub geocoder: Arc<dyn Geocoder>,
    pub router: Arc<dyn RouteProvider>,
    pub availability: Arc<dyn AvailabilitySource>,
    pub weather: Arc<dyn WeatherSource>,
}

impl Providers {
    /// Pick live or deterministic providers from `[providers]`
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.providers.mock {
            return Ok(Self::mock());
        }

        let retry = RetryPolicy::from_config(&config.providers);
        let onemap = Arc::new(onemap::OneMapClient::new(
            &config.api_keys.onemap_email,
            &config.api_keys.onemap_password,
            retry,
        )?);
        let api_key = Some(config.api_keys.datagov.as_str()).filter(|k| !k.is_empty());
        let datagov = Arc::new(datagov::DataGovAvailability::new(api_key, retry)?);
        let nea = Arc::new(nea::NeaWeather::new(api_key, retry)?);

        Ok(Self {
            geocoder: onemap.clone(),
            router: onemap,
            availability: datagov,
            weather: nea,
        })
    }

    /// Deterministic offline providers
    pub fn mock() -> Self {
        let mock = Arc::new(mock::MockProvider);
        Self {
            geocoder: mock.clone(),
            router: mock.clone(),
            availability: mock.clone(),
            weather: mock,
        }
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers")
            .field("geocoder", &self.geocoder.name())
            .field("router", &self.router.name())
            .field("availability", &self.availability.name())
            .field("weather", &self.weather.name())
            .finish()
    }
}

/// Information about a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (as shown in status output)
    pub name: String,
    /// Human-readable description
    pub description: String,
}

/// List all known providers with their info
pub fn available_providers() -> Vec<ProviderInfo> {
    vec![
        ProviderInfo {
            name: "onemap".to_string(),
            description: "OneMap geocoding and drive routing (Singapore Land Authority)"
                .to_string(),
        },
        ProviderInfo {
            name: "datagov".to_string(),
            description: "data.gov.sg live HDB carpark availability".to_string(),
        },
        ProviderInfo {
            name: "nea".to_string(),
            description: "data.gov.sg 2-hour and 24-hour weather forecasts".to_string(),
        },
        ProviderInfo {
            name: "mock".to_string(),
            description: "Deterministic offline providers (for testing)".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_toggle_selects_mock() {
        let mut config = Config::default();
        config.providers.mock = true;

        let providers = Providers::from_config(&config).unwrap();
        assert_eq!(providers.geocoder.name(), "mock");
        assert_eq!(providers.router.name(), "mock");
        assert_eq!(providers.availability.name(), "mock");
        assert_eq!(providers.weather.name(), "mock");
    }

    #[test]
    fn test_live_providers_by_default() {
        let providers = Providers::from_config(&Config::default()).unwrap();

        assert_eq!(providers.geocoder.name(), "onemap");
        assert_eq!(providers.router.name(), "onemap");
        assert_eq!(providers.availability.name(), "datagov");
        assert_eq!(providers.weather.name(), "nea");
        assert!(format!("{:?}", providers).contains("datagov"));
    }

    #[test]
    fn test_route_validity() {
        assert!(Route::new(100.0, 20.0).is_valid());
        assert!(!Route::new(-1.0, 20.0).is_valid());
        assert!(!Route::new(f64::NAN, 20.0).is_valid());
    }

    #[test]
    fn test_status_classification() {
        use reqwest::StatusCode;

        assert!(status_error("feed", StatusCode::SERVICE_UNAVAILABLE).is_retriable());
        assert!(status_error("feed", StatusCode::TOO_MANY_REQUESTS).is_retriable());
        assert!(!status_error("feed", StatusCode::NOT_FOUND).is_retriable());
        assert!(!status_error("feed", StatusCode::BAD_REQUEST).is_retriable());
    }

    #[test]
    fn test_available_providers() {
        let providers = available_providers();
        assert!(providers.iter().any(|p| p.name == "mock"));
        assert!(providers.iter().any(|p| p.name == "onemap"));
    }
}

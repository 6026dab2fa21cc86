//! Deterministic offline providers
//!
//! Every query geocodes to a fixed point, routes are straight lines driven at
//! the average speed, the availability feed is empty and the weather is a
//! fixed forecast for the central area. Useful for tests and
//! for running the pipeline without credentials.

use crate::constants::mock::{CENTER_LAT, CENTER_LNG};
use crate::constants::travel::AVERAGE_SPEED_KMH;
use crate::error::Result;
use crate::geo::{haversine_distance, Coordinates, GeoLocation};
use crate::provider::{
    AvailabilityMap, AvailabilitySource, Geocoder, Route, RouteProvider, WeatherSource,
};
use crate::weather::{Forecast, Forecasts};
use async_trait::async_trait;
use chrono::{Duration, Utc};

#[derive(Debug, Clone, Copy, Default)]
pub struct MockProvider;

#[async_trait]
impl Geocoder for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn geocode(&self, query: &str) -> Result<Option<GeoLocation>> {
        Ok(Some(GeoLocation {
            lat: CENTER_LAT,
            lng: CENTER_LNG,
            display_name: query.trim().to_string(),
        }))
    }
}

#[async_trait]
impl RouteProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn route(&self, from: Coordinates, to: Coordinates) -> Result<Route> {
        let distance_m = haversine_distance(from, to).round().max(1.0);
        let duration_s = (distance_m / (AVERAGE_SPEED_KMH / 3.6)).round().max(1.0);
        Ok(Route::new(distance_m, duration_s))
    }
}

#[async_trait]
impl AvailabilitySource for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch(&self) -> Result<AvailabilityMap> {
        Ok(AvailabilityMap::new())
    }
}

#[async_trait]
impl WeatherSource for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn forecast(&self, _at: Coordinates) -> Result<Option<Forecasts>> {
        let now = Utc::now();
        let forecast = |hours: i64, condition: &str| Forecast {
            area: "Central".to_string(),
            updated_at: now,
            valid_from: now,
            valid_to: now + Duration::hours(hours),
            condition: condition.to_string(),
        };

        Ok(Forecasts::from_parts(
            Some(forecast(2, "Light showers")),
            Some(forecast(24, "Partly cloudy")),
        ))
    }
}

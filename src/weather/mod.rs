//! Weather forecasts for a search location
//!
//! The 2-hour forecast is published per named area, so a location is matched
//! to the area whose label point is closest. The 24-hour forecast is
//! islandwide. Lookups are best effort: a failing source yields no forecast
//! rather than an error.

use crate::geo::{haversine_distance, Coordinates};
use crate::provider::WeatherSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// A forecast for one area and period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub area: String,
    pub updated_at: DateTime<Utc>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    /// e.g. "Partly Cloudy (Day)", "Thundery Showers"
    pub condition: String,
}

/// Short-range and daily forecasts for a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecasts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_hour: Option<Forecast>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twenty_four_hour: Option<Forecast>,
}

impl Forecasts {
    /// None when neither period is present
    pub fn from_parts(two_hour: Option<Forecast>, twenty_four_hour: Option<Forecast>) -> Option<Self> {
        if two_hour.is_none() && twenty_four_hour.is_none() {
            return None;
        }
        Some(Self {
            two_hour,
            twenty_four_hour,
        })
    }
}

/// A named forecast area and its label point
#[derive(Debug, Clone, PartialEq)]
pub struct AreaLabel {
    pub name: String,
    pub coords: Coordinates,
}

/// The area whose label point is closest to `at`
pub fn nearest_area(at: Coordinates, areas: &[AreaLabel]) -> Option<&AreaLabel> {
    areas.iter().min_by(|a, b| {
        haversine_distance(at, a.coords).total_cmp(&haversine_distance(at, b.coords))
    })
}

/// Best-effort forecast lookup over a [`WeatherSource`]
#[derive(Clone)]
pub struct WeatherReport {
    source: Arc<dyn WeatherSource>,
}

impl WeatherReport {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self { source }
    }

    /// Forecasts for `at`, or None if the source has nothing or fails
    pub async fn forecast(&self, at: Coordinates) -> Option<Forecasts> {
        match self.source.forecast(at).await {
            Ok(forecasts) => forecasts,
            Err(e) => {
                warn!("Weather from {} unavailable: {}", self.source.name(), e);
                None
            }
        }
    }
}

impl std::fmt::Debug for WeatherReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherReport")
            .field("source", &self.source.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::provider::mock::MockProvider;
    use async_trait::async_trait;

    struct Failing;

    #[async_trait]
    impl WeatherSource for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn forecast(&self, _at: Coordinates) -> Result<Option<Forecasts>> {
            Err(Error::Unavailable("502 Bad Gateway".to_string()))
        }
    }

    fn areas() -> Vec<AreaLabel> {
        vec![
            AreaLabel {
                name: "Ang Mo Kio".to_string(),
                coords: Coordinates::new(1.375, 103.839),
            },
            AreaLabel {
                name: "Bedok".to_string(),
                coords: Coordinates::new(1.321, 103.924),
            },
            AreaLabel {
                name: "City".to_string(),
                coords: Coordinates::new(1.292, 103.844),
            },
        ]
    }

    #[test]
    fn test_nearest_area() {
        let areas = areas();
        let tampines = Coordinates::new(1.353, 103.945);
        let raffles = Coordinates::new(1.284, 103.851);

        assert_eq!(nearest_area(tampines, &areas).unwrap().name, "Bedok");
        assert_eq!(nearest_area(raffles, &areas).unwrap().name, "City");
        assert!(nearest_area(raffles, &[]).is_none());
    }

    #[test]
    fn test_from_parts_requires_one_period() {
        assert!(Forecasts::from_parts(None, None).is_none());
    }

    #[tokio::test]
    async fn test_failure_degrades_to_none() {
        let report = WeatherReport::new(Arc::new(Failing));
        assert!(report.forecast(Coordinates::new(1.3, 103.8)).await.is_none());
    }

    #[tokio::test]
    async fn test_mock_forecast() {
        let report = WeatherReport::new(Arc::new(MockProvider));
        let forecasts = report.forecast(Coordinates::new(1.3, 103.8)).await.unwrap();

        let two_hour = forecasts.two_hour.unwrap();
        assert_eq!(two_hour.area, "Central");
        assert_eq!(two_hour.condition, "Light showers");
        assert!(two_hour.valid_to > two_hour.valid_from);
        assert_eq!(forecasts.twenty_four_hour.unwrap().condition, "Partly cloudy");
    }
}

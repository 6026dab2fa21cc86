//! data.gov.sg (NEA) weather forecasts

use crate::constants::api::{NEA_24_HOUR_URL, NEA_2_HOUR_URL};
use crate::error::{Error, Result};
use crate::geo::Coordinates;
use crate::provider::retry::RetryPolicy;
use crate::provider::{request_error, status_error, WeatherSource};
use crate::weather::{nearest_area, AreaLabel, Forecast, Forecasts};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

const USER_AGENT: &str = concat!("carpark-finder/", env!("CARGO_PKG_VERSION"));

/// NEA 2-hour and 24-hour forecasts
#[derive(Debug)]
pub struct NeaWeather {
    client: reqwest::Client,
    two_hour_url: String,
    daily_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

#[derive(Debug, Default, Deserialize)]
struct ValidPeriod {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwoHourResponse {
    #[serde(default)]
    area_metadata: Vec<AreaMetadata>,
    #[serde(default)]
    items: Vec<TwoHourItem>,
}

#[derive(Debug, Deserialize)]
struct AreaMetadata {
    name: String,
    label_location: LabelLocation,
}

#[derive(Debug, Deserialize)]
struct LabelLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct TwoHourItem {
    update_timestamp: Option<String>,
    #[serde(default)]
    valid_period: ValidPeriod,
    #[serde(default)]
    forecasts: Vec<AreaForecast>,
}

#[derive(Debug, Deserialize)]
struct AreaForecast {
    area: String,
    forecast: String,
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(default)]
    items: Vec<DailyItem>,
}

#[derive(Debug, Deserialize)]
struct DailyItem {
    update_timestamp: Option<String>,
    #[serde(default)]
    valid_period: ValidPeriod,
    general: Option<General>,
}

#[derive(Debug, Deserialize)]
struct General {
    forecast: Option<String>,
}

impl NeaWeather {
    pub fn new(api_key: Option<&str>, retry: RetryPolicy) -> Result<Self> {
        Self::with_urls(NEA_2_HOUR_URL, NEA_24_HOUR_URL, api_key, retry)
    }

    /// Point both feeds at custom URLs (for testing with wiremock)
    pub fn with_urls(
        two_hour_url: &str,
        daily_url: &str,
        api_key: Option<&str>,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(retry.timeout)
            .build()?;

        Ok(Self {
            client,
            two_hour_url: two_hour_url.to_string(),
            daily_url: daily_url.to_string(),
            api_key: api_key.map(str::to_string),
            retry,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        let response = request.send().await.map_err(|e| request_error(what, e))?;
        if !response.status().is_success() {
            return Err(status_error(what, response.status()));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Failed to parse {}: {}", what, e)))
    }
}

fn timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw?.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// The forecast for the area closest to `at`
///
/// Falls back to the first listed area when there is no area metadata.
fn two_hour_forecast(body: TwoHourResponse, at: Coordinates, now: DateTime<Utc>) -> Option<Forecast> {
    let item = body.items.into_iter().next()?;
    let areas: Vec<AreaLabel> = body
        .area_metadata
        .into_iter()
        .map(|a| AreaLabel {
            name: a.name,
            coords: Coordinates::new(a.label_location.latitude, a.label_location.longitude),
        })
        .collect();

    let area = nearest_area(at, &areas)
        .map(|a| a.name.clone())
        .or_else(|| item.forecasts.first().map(|f| f.area.clone()));
    let condition = area
        .as_deref()
        .and_then(|name| item.forecasts.iter().find(|f| f.area == name))
        .or_else(|| item.forecasts.first())
        .map_or_else(|| "Unknown".to_string(), |f| f.forecast.clone());

    let updated_at = timestamp(item.update_timestamp.as_deref()).unwrap_or(now);
    Some(Forecast {
        area: area.unwrap_or_else(|| "Islandwide".to_string()),
        updated_at,
        valid_from: timestamp(item.valid_period.start.as_deref()).unwrap_or(updated_at),
        valid_to: timestamp(item.valid_period.end.as_deref()).unwrap_or(now + Duration::hours(2)),
        condition,
    })
}

fn daily_forecast(body: DailyResponse, now: DateTime<Utc>) -> Option<Forecast> {
    let item = body.items.into_iter().next()?;
    let condition = item
        .general
        .and_then(|g| g.forecast)
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let updated_at = timestamp(item.update_timestamp.as_deref()).unwrap_or(now);
    Some(Forecast {
        area: "Islandwide".to_string(),
        updated_at,
        valid_from: timestamp(item.valid_period.start.as_deref()).unwrap_or(updated_at),
        valid_to: timestamp(item.valid_period.end.as_deref()).unwrap_or(now + Duration::hours(24)),
        condition,
    })
}

#[async_trait]
impl WeatherSource for NeaWeather {
    fn name(&self) -> &'static str {
        "nea"
    }

    async fn forecast(&self, at: Coordinates) -> Result<Option<Forecasts>> {
        let (two_hour, daily) = tokio::try_join!(
            self.retry.run("2-hour forecast", || {
                self.get_json::<TwoHourResponse>(&self.two_hour_url, "2-hour forecast")
            }),
            self.retry.run("24-hour forecast", || {
                self.get_json::<DailyResponse>(&self.daily_url, "24-hour forecast")
            }),
        )?;

        let now = Utc::now();
        Ok(Forecasts::from_parts(
            two_hour_forecast(two_hour, at, now),
            daily_forecast(daily, now),
        ))
    }
}

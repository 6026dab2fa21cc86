//! HTTP API routes
//!
//! Defines all REST API endpoints for the server.

use crate::error::Error;
use crate::format::{available_formats, FormatInfo};
use crate::geo::Coordinates;
use crate::search::{SearchOptions, SearchResult};
use crate::server::state::AppState;
use crate::weather::Forecasts;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/carparks/search", get(search_handler))
        .route("/api/carparks/nearest", get(nearest_handler))
        .route("/api/carparks/reload", post(reload_handler))
        .route("/api/weather", get(weather_handler))
        .route("/api/status", get(status_handler))
        .route("/api/formats", get(formats_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Search query parameters
///
/// Coordinates take precedence over `q` when both are given. Numbers are
/// taken as text and parsed by the handler so that malformed values are
/// reported as an [`ApiError`].
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Free-text place to geocode
    pub q: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    /// Search radius in meters
    pub radius: Option<String>,
    /// Vehicle class (car, heavy, sidecar, motorcycle)
    pub vehicle: Option<String>,
    /// Vehicle height in meters
    pub height: Option<String>,
    /// Carpark type filter
    #[serde(rename = "type")]
    pub carpark_type: Option<String>,
    /// Maximum road distance in meters, 0 to disable
    #[serde(alias = "maxDistance")]
    pub max_distance: Option<String>,
    /// "1" to keep only carparks whose name or address contains `q`
    #[serde(alias = "includeText")]
    pub include_text: Option<String>,
    /// Override live availability ("1"/"0")
    pub live: Option<String>,
}

/// Nearest query parameters
#[derive(Debug, Deserialize)]
pub struct NearestQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
    /// Number of carparks (defaults to `defaults.nearest`)
    pub k: Option<String>,
}

/// Weather query parameters
#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "METADATA_ERROR" | "SERVER_ERROR" | "INTERNAL_ERROR" => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidCoordinates(_) => "INVALID_COORDINATES",
            Error::InvalidRadius(_) => "INVALID_RADIUS",
            Error::InvalidVehicle(_) => "INVALID_VEHICLE",
            Error::Resolution(_) => "RESOLUTION_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Metadata(_) => "METADATA_ERROR",
            Error::Server(_) => "SERVER_ERROR",
            _ => "INTERNAL_ERROR",
        };
        ApiError::new(code, err.to_string())
    }
}

/// Interpret "1"/"true"/"yes" and "0"/"false"/"no"
fn flag(value: Option<&str>) -> Option<bool> {
    match value?.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse an optional query value, reporting a malformed one under `code`
fn number<T: FromStr>(value: Option<&str>, name: &str, code: &str) -> Result<Option<T>, ApiError> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    raw.parse()
        .map(Some)
        .map_err(|_| ApiError::new(code, format!("Invalid {}: {}", name, raw)))
}

/// Coordinates when both `lat` and `lng` are present
fn coordinates(lat: Option<&str>, lng: Option<&str>) -> Result<Option<Coordinates>, ApiError> {
    let lat = number(lat, "lat", "INVALID_COORDINATES")?;
    let lng = number(lng, "lng", "INVALID_COORDINATES")?;
    Ok(lat.zip(lng).map(|(lat, lng)| Coordinates::new(lat, lng)))
}

/// Coordinates that the endpoint cannot do without
fn required_coordinates(lat: Option<&str>, lng: Option<&str>) -> Result<Coordinates, ApiError> {
    coordinates(lat, lng)?.ok_or_else(|| ApiError::new("MISSING_LOCATION", "Provide lat and lng"))
}

/// Merge query overrides onto the configured defaults
fn search_options(state: &AppState, query: &SearchQuery) -> Result<SearchOptions, ApiError> {
    let mut options = SearchOptions::from_config(&state.config)?;

    if let Some(radius) = number(query.radius.as_deref(), "radius", "INVALID_RADIUS")? {
        options.radius_m = radius;
    }
    if let Some(vehicle) = &query.vehicle {
        options.vehicle.lot_type = vehicle.parse().map_err(Error::InvalidVehicle)?;
    }
    if let Some(height) = number(query.height.as_deref(), "height", "INVALID_VEHICLE")? {
        options.vehicle.height_m = height;
    }
    if let Some(live) = flag(query.live.as_deref()) {
        options.live_availability = live;
    }
    options.carpark_type = query
        .carpark_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    options.include_text = flag(query.include_text.as_deref()).unwrap_or(false);
    options.max_distance_m =
        number::<f64>(query.max_distance.as_deref(), "maxDistance", "INVALID_RADIUS")?
            .filter(|d| *d > 0.0);

    Ok(options)
}

/// Search carparks around a place or coordinates
///
/// GET /api/carparks/search
async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResult>, ApiError> {
    let options = search_options(&state, &query)?;
    let coords = coordinates(query.lat.as_deref(), query.lng.as_deref())?;
    let text = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let result = match (coords, text) {
        (Some(coords), _) => state.search.search_by_coords(coords, &options).await?,
        (None, Some(q)) => state.search.search_by_text(q, &options).await?,
        _ => {
            return Err(ApiError::new(
                "MISSING_LOCATION",
                "Provide q or lat/lng",
            ))
        }
    };

    Ok(Json(result))
}

/// Closest carparks by straight-line distance
///
/// GET /api/carparks/nearest
async fn nearest_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearestQuery>,
) -> Result<Json<SearchResult>, ApiError> {
    let coords = required_coordinates(query.lat.as_deref(), query.lng.as_deref())?;
    let k = number(query.k.as_deref(), "k", "INVALID_PARAMETER")?
        .unwrap_or(state.config.defaults.nearest);
    let result = state.search.nearest(coords, k)?;
    Ok(Json(result))
}

/// Weather response
#[derive(Debug, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub center: Coordinates,
    /// Absent when no forecast could be fetched
    pub forecast: Option<Forecasts>,
}

/// Forecasts for the area around a point
///
/// GET /api/weather
async fn weather_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherResponse>, ApiError> {
    let center = required_coordinates(query.lat.as_deref(), query.lng.as_deref())?;
    center.validate()?;

    let forecast = state.weather.forecast(center).await;
    Ok(Json(WeatherResponse { center, forecast }))
}

/// Reload response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResponse {
    /// Carparks in the table after the reload
    pub carparks: usize,
}

/// Re-read the carpark metadata
///
/// POST /api/carparks/reload
async fn reload_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let store = Arc::clone(state.search.store());
    let carparks = tokio::task::spawn_blocking(move || store.reload())
        .await
        .map_err(|e| Error::Server(format!("Reload task failed: {}", e)))??;

    info!("Carpark metadata reloaded via API ({} carparks)", carparks);
    Ok(Json(ReloadResponse { carparks }))
}

/// Provider names in use
#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub geocoder: String,
    pub router: String,
    pub availability: String,
    pub weather: String,
}

/// Status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server is running
    pub running: bool,
    /// Server version
    pub version: String,
    /// Providers behind the search pipeline
    pub providers: ProviderStatus,
    /// Carparks currently loaded
    pub carparks: usize,
    /// Whether searches merge live availability by default
    pub live_availability: bool,
    /// Uptime in seconds
    pub uptime_secs: u64,
}

/// Server status endpoint
///
/// GET /api/status
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let providers = state.search.providers();

    Json(StatusResponse {
        running: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        providers: ProviderStatus {
            geocoder: providers.geocoder.name().to_string(),
            router: providers.router.name().to_string(),
            availability: providers.availability.name().to_string(),
            weather: providers.weather.name().to_string(),
        },
        carparks: state.search.store().len(),
        live_availability: state.config.providers.live_availability,
        uptime_secs: state.uptime_secs(),
    })
}

/// Formats list response
#[derive(Debug, Serialize, Deserialize)]
pub struct FormatsResponse {
    pub formats: Vec<FormatInfo>,
}

/// List available output formats
///
/// GET /api/formats
async fn formats_handler() -> Json<FormatsResponse> {
    Json(FormatsResponse {
        formats: available_formats(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::provider::Providers;
    use crate::search::CarparkSearch;
    use crate::store::tests::carpark;
    use crate::store::CarparkStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn create_test_state() -> Arc<AppState> {
        let mut config = Config::default();
        config.providers.mock = true;

        let mut low = carpark("LOW", 1.3010, 103.8000);
        low.gantry_height_m = Some(2.0);
        let store = CarparkStore::from_carparks(vec![
            carpark("FAR", 1.3040, 103.8000),
            low,
            carpark("MID", 1.3020, 103.8000),
        ]);
        let search = CarparkSearch::new(Arc::new(store), Providers::mock(), &config.providers);
        Arc::new(AppState::new(config, search))
    }

    async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = create_router(create_test_state());
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    fn ids(body: &serde_json::Value) -> Vec<String> {
        body["carparks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let (status, body) = get("/api/status").await;
        assert_eq!(status, StatusCode::OK);

        let status: StatusResponse = serde_json::from_value(body).unwrap();
        assert!(status.running);
        assert_eq!(status.providers.geocoder, "mock");
        assert_eq!(status.providers.weather, "mock");
        assert_eq!(status.carparks, 3);
    }

    #[tokio::test]
    async fn test_search_by_coords() {
        let (status, body) = get("/api/carparks/search?lat=1.3&lng=103.8&radius=1000").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec!["LOW", "MID", "FAR"]);
        assert_eq!(body["meta"]["mode"], "near");
        assert_eq!(body["meta"]["count"], 3);
    }

    #[tokio::test]
    async fn test_search_by_text_with_vehicle_height() {
        let (status, body) = get("/api/carparks/search?q=tiong+bahru&height=2.4").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec!["MID", "FAR"]);
        assert_eq!(body["center"]["address"], "tiong bahru");
        assert_eq!(body["meta"]["query"], "tiong bahru");
    }

    #[tokio::test]
    async fn test_search_max_distance() {
        let (status, body) = get("/api/carparks/search?lat=1.3&lng=103.8&maxDistance=300").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec!["LOW", "MID"]);
    }

    #[tokio::test]
    async fn test_search_requires_location() {
        let (status, body) = get("/api/carparks/search?q=%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_LOCATION");
    }

    #[tokio::test]
    async fn test_search_invalid_input() {
        let (status, body) = get("/api/carparks/search?lat=1.3&lng=103.8&radius=-5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_RADIUS");

        let (status, body) = get("/api/carparks/search?lat=120&lng=103.8").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_COORDINATES");

        let (status, body) = get("/api/carparks/search?lat=1.3&lng=103.8&vehicle=tank").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_VEHICLE");
    }

    #[tokio::test]
    async fn test_malformed_numbers_are_api_errors() {
        let (status, body) = get("/api/carparks/search?lat=abc&lng=103.8").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_COORDINATES");
        assert!(body["error"].as_str().unwrap().contains("abc"));

        let (status, body) = get("/api/carparks/search?lat=1.3&lng=103.8&radius=wide").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_RADIUS");

        let (status, body) = get("/api/carparks/nearest?lat=1.3&lng=east").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_COORDINATES");
    }

    #[tokio::test]
    async fn test_nearest_requires_coordinates() {
        let (status, body) = get("/api/carparks/nearest?lat=1.3").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_LOCATION");
    }

    #[tokio::test]
    async fn test_weather_endpoint() {
        let (status, body) = get("/api/weather?lat=1.3&lng=103.8").await;
        assert_eq!(status, StatusCode::OK);

        let weather: WeatherResponse = serde_json::from_value(body).unwrap();
        assert_eq!(weather.center, Coordinates::new(1.3, 103.8));
        let forecast = weather.forecast.unwrap();
        assert_eq!(forecast.two_hour.unwrap().area, "Central");
    }

    #[tokio::test]
    async fn test_weather_validates_coordinates() {
        let (status, body) = get("/api/weather?lat=1.3").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_LOCATION");

        let (status, body) = get("/api/weather?lat=200&lng=103.8").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_COORDINATES");
    }

    #[tokio::test]
    async fn test_nearest_endpoint() {
        let (status, body) = get("/api/carparks/nearest?lat=1.3&lng=103.8&k=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec!["LOW", "MID"]);
        assert_eq!(body["meta"]["mode"], "nearest");
    }

    #[tokio::test]
    async fn test_reload_endpoint() {
        let app = create_router(create_test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/carparks/reload")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let reload: ReloadResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(reload.carparks, 3);
    }

    #[tokio::test]
    async fn test_formats_endpoint() {
        let (status, body) = get("/api/formats").await;
        assert_eq!(status, StatusCode::OK);

        let formats: FormatsResponse = serde_json::from_value(body).unwrap();
        assert_eq!(formats.formats.len(), 3);
    }

    #[test]
    fn test_flag() {
        assert_eq!(flag(Some("1")), Some(true));
        assert_eq!(flag(Some("false")), Some(false));
        assert_eq!(flag(Some("maybe")), None);
        assert_eq!(flag(None), None);
    }
}

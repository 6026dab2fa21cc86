//! OneMap backend (Singapore Land Authority)
//!
//! Geocoding through the elastic search endpoint and drive routing through the
//! routing service. Both require an access token obtained from the auth
//! endpoint with an account email and password; the token is cached on the
//! client and renewed shortly before it expires.

use crate::constants::api::ONEMAP_URL;
use crate::constants::auth::FALLBACK_TOKEN_TTL_SECS;
use crate::error::{Error, Result};
use crate::geo::{Coordinates, GeoLocation};
use crate::provider::retry::RetryPolicy;
use crate::provider::token::{AccessToken, TokenCache};
use crate::provider::{request_error, status_error, Geocoder, Route, RouteProvider};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const USER_AGENT: &str = concat!("carpark-finder/", env!("CARGO_PKG_VERSION"));

/// OneMap geocoding and routing client
#[derive(Debug)]
pub struct OneMapClient {
    client: reqwest::Client,
    base_url: String,
    email: String,
    password: String,
    token: TokenCache,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expiry_timestamp: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct SearchResult {
    latitude: String,
    longitude: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    searchval: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    route_summary: Option<RouteSummary>,
}

#[derive(Debug, Deserialize)]
struct RouteSummary {
    total_distance: f64,
    total_time: f64,
}

impl OneMapClient {
    /// Create a client for the production OneMap API
    pub fn new(email: &str, password: &str, retry: RetryPolicy) -> Result<Self> {
        Self::with_base_url(ONEMAP_URL, email, password, retry)
    }

    /// Create a client against a custom base URL (for testing with wiremock)
    pub fn with_base_url(
        base_url: &str,
        email: &str,
        password: &str,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(retry.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
            password: password.to_string(),
            token: TokenCache::new(),
            retry,
        })
    }

    /// Current access token, renewed if close to expiry
    async fn access_token(&self) -> Result<String> {
        self.token.get_or_refresh(|| self.request_token()).await
    }

    async fn request_token(&self) -> Result<AccessToken> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(Error::Provider(
                "OneMap credentials are not configured".to_string(),
            ));
        }

        let response = self
            .client
            .post(format!("{}/api/auth/post/getToken", self.base_url))
            .json(&TokenRequest {
                email: &self.email,
                password: &self.password,
            })
            .send()
            .await
            .map_err(|e| request_error("OneMap auth", e))?;

        if !response.status().is_success() {
            return Err(status_error("OneMap auth", response.status()));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Failed to parse OneMap auth response: {}", e)))?;

        let expires_at = body
            .expiry_timestamp
            .as_ref()
            .and_then(parse_expiry)
            .unwrap_or_else(|| Utc::now() + Duration::seconds(FALLBACK_TOKEN_TTL_SECS));

        Ok(AccessToken::new(body.access_token, expires_at))
    }

    /// Authenticated GET, dropping the cached token on 401
    ///
    /// A 401 is worth another attempt since the next one authenticates afresh.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str, what: &str) -> Result<T> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, token)
            .send()
            .await
            .map_err(|e| request_error(&format!("OneMap {}", what), e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.token.invalidate().await;
            return Err(Error::Unavailable(format!(
                "OneMap {} rejected the access token",
                what
            )));
        }
        if !status.is_success() {
            return Err(status_error(&format!("OneMap {}", what), status));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Failed to parse OneMap {} response: {}", what, e)))
    }

    async fn search(&self, query: &str) -> Result<Option<GeoLocation>> {
        let url = format!(
            "{}/api/common/elastic/search?searchVal={}&returnGeom=Y&getAddrDetails=Y&pageNum=1",
            self.base_url,
            urlencoding::encode(query)
        );
        let body: SearchResponse = self.get_json(&url, "search").await?;

        let Some(first) = body.results.into_iter().next() else {
            return Ok(None);
        };
        let (lat, lng) = Self::parse_coords(&first.latitude, &first.longitude)?;
        let display_name = first
            .address
            .or(first.searchval)
            .unwrap_or_else(|| query.to_string());

        Ok(Some(GeoLocation {
            lat,
            lng,
            display_name,
        }))
    }

    async fn drive_route(&self, from: Coordinates, to: Coordinates) -> Result<Route> {
        let url = format!(
            "{}/api/public/routingsvc/route?start={},{}&end={},{}&routeType=drive",
            self.base_url, from.lat, from.lng, to.lat, to.lng
        );
        let body: RouteResponse = self.get_json(&url, "routing").await?;
        let summary = body
            .route_summary
            .ok_or_else(|| Error::Provider("OneMap routing response has no route_summary".to_string()))?;

        Ok(Route::new(summary.total_distance, summary.total_time))
    }

    /// Parse lat/lng strings to f64
    fn parse_coords(lat: &str, lng: &str) -> Result<(f64, f64)> {
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| Error::Provider(format!("Invalid latitude: {}", lat)))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| Error::Provider(format!("Invalid longitude: {}", lng)))?;
        Ok((lat, lng))
    }
}

/// Expiry as unix seconds (or milliseconds), numeric or string
fn parse_expiry(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    let raw = match value {
        serde_json::Value::Number(n) => n.as_i64()?,
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    if raw > 10_000_000_000 {
        DateTime::from_timestamp_millis(raw)
    } else {
        DateTime::from_timestamp(raw, 0)
    }
}

#[async_trait]
impl Geocoder for OneMapClient {
    fn name(&self) -> &'static str {
        "onemap"
    }

    async fn geocode(&self, query: &str) -> Result<Option<GeoLocation>> {
        self.retry.run("OneMap search", || self.search(query)).await
    }
}

#[async_trait]
impl RouteProvider for OneMapClient {
    fn name(&self) -> &'static str {
        "onemap"
    }

    async fn route(&self, from: Coordinates, to: Coordinates) -> Result<Route> {
        self.drive_route(from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::travel::{geometric_estimate, TravelEstimator};
    use std::sync::Arc;
    use std::time::Duration as StdDuration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> OneMapClient {
        let retry = RetryPolicy::new(1, StdDuration::from_secs(2))
            .with_backoff(StdDuration::ZERO, StdDuration::ZERO);
        OneMapClient::with_base_url(base_url, "me@example.com", "secret", retry)
            .expect("client construction should not fail")
    }

    async fn mount_token(server: &MockServer, token: &str, expected_calls: u64) {
        let expiry = (Utc::now() + Duration::days(3)).timestamp().to_string();
        Mock::given(method("POST"))
            .and(path("/api/auth/post/getToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": token,
                "expiry_timestamp": expiry,
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[test]
    fn test_parse_coords() {
        let (lat, lng) = OneMapClient::parse_coords("1.3521", "103.8198").unwrap();
        assert!((lat - 1.3521).abs() < 1e-9);
        assert!((lng - 103.8198).abs() < 1e-9);
        assert!(OneMapClient::parse_coords("north", "0").is_err());
    }

    #[test]
    fn test_parse_expiry_formats() {
        let secs = parse_expiry(&serde_json::json!("1700000000")).unwrap();
        let millis = parse_expiry(&serde_json::json!(1_700_000_000_000_i64)).unwrap();

        assert_eq!(secs.timestamp(), 1_700_000_000);
        assert_eq!(millis, secs);
        assert!(parse_expiry(&serde_json::json!("soon")).is_none());
    }

    #[tokio::test]
    async fn test_geocode_uses_cached_token() {
        let server = MockServer::start().await;
        mount_token(&server, "tok-1", 1).await;

        Mock::given(method("GET"))
            .and(path("/api/common/elastic/search"))
            .and(query_param("searchVal", "choa chu kang"))
            .and(header("authorization", "tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "found": 1,
                "results": [{
                    "SEARCHVAL": "CHOA CHU KANG MRT STATION",
                    "ADDRESS": "10 CHOA CHU KANG AVENUE 4",
                    "LATITUDE": "1.38527",
                    "LONGITUDE": "103.74441"
                }]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        for _ in 0..2 {
            let location = client.geocode("choa chu kang").await.unwrap().unwrap();
            assert_eq!(location.display_name, "10 CHOA CHU KANG AVENUE 4");
            assert!((location.lat - 1.38527).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_geocode_no_results() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 1).await;

        Mock::given(method("GET"))
            .and(path("/api/common/elastic/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "found": 0, "results": [] })),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(client.geocode("nowhere at all").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_geocode_retries_then_fails() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 1).await;

        Mock::given(method("GET"))
            .and(path("/api/common/elastic/search"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(client.geocode("bishan").await.is_err());
    }

    #[tokio::test]
    async fn test_route_parses_summary() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 1).await;

        Mock::given(method("GET"))
            .and(path("/api/public/routingsvc/route"))
            .and(query_param("routeType", "drive"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "route_summary": { "total_distance": 2450, "total_time": 412 }
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let route = client
            .route(Coordinates::new(1.30, 103.80), Coordinates::new(1.31, 103.81))
            .await
            .unwrap();

        assert_eq!(route, Route::new(2450.0, 412.0));
    }

    #[tokio::test]
    async fn test_route_missing_summary_is_error() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 1).await;

        Mock::given(method("GET"))
            .and(path("/api/public/routingsvc/route"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client
            .route(Coordinates::new(1.30, 103.80), Coordinates::new(1.31, 103.81))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_unauthorized_drops_token() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 2).await;

        Mock::given(method("GET"))
            .and(path("/api/public/routingsvc/route"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let from = Coordinates::new(1.30, 103.80);
        let to = Coordinates::new(1.31, 103.81);

        assert!(client.route(from, to).await.is_err());
        assert!(client.token.current().await.is_none());
        assert!(client.route(from, to).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let client = OneMapClient::with_base_url(
            "http://127.0.0.1:9",
            "",
            "",
            RetryPolicy::new(0, StdDuration::from_millis(100)),
        )
        .unwrap();

        let err = client.geocode("bishan").await.unwrap_err();
        assert!(err.to_string().contains("credentials"));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        mount_token(&server, "tok", 1).await;

        Mock::given(method("GET"))
            .and(path("/api/public/routingsvc/route"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let estimator = TravelEstimator::new(Arc::new(client), RetryPolicy::default());
        let from = Coordinates::new(1.30, 103.80);
        let to = Coordinates::new(1.31, 103.81);

        assert_eq!(estimator.estimate(from, to).await, geometric_estimate(from, to));
    }

    #[tokio::test]
    async fn test_missing_credentials_fall_back_without_waiting() {
        let client = OneMapClient::with_base_url("http://127.0.0.1:9", "", "", RetryPolicy::default())
            .unwrap();
        let estimator = TravelEstimator::new(Arc::new(client), RetryPolicy::default());
        let from = Coordinates::new(1.30, 103.80);
        let to = Coordinates::new(1.31, 103.81);

        let started = std::time::Instant::now();
        let route = estimator.estimate(from, to).await;

        assert_eq!(route, geometric_estimate(from, to));
        assert!(started.elapsed() < StdDuration::from_millis(150));
    }
}

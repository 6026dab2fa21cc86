//! data.gov.sg carpark availability feed

use crate::carpark::{Lot, LotAvailability, LotType};
use crate::constants::api::DATAGOV_AVAILABILITY_URL;
use crate::error::{Error, Result};
use crate::provider::retry::RetryPolicy;
use crate::provider::{request_error, status_error, AvailabilityMap, AvailabilitySource};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const USER_AGENT: &str = concat!("carpark-finder/", env!("CARGO_PKG_VERSION"));

/// Live HDB availability from the data.gov.sg transport API
#[derive(Debug)]
pub struct DataGovAvailability {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    items: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    #[serde(default)]
    carpark_data: Vec<CarparkEntry>,
}

#[derive(Debug, Deserialize)]
struct CarparkEntry {
    carpark_number: String,
    #[serde(default)]
    carpark_info: Vec<LotEntry>,
}

#[derive(Debug, Deserialize)]
struct LotEntry {
    #[serde(default)]
    total_lots: serde_json::Value,
    #[serde(default)]
    lot_type: String,
    #[serde(default)]
    lots_available: serde_json::Value,
}

impl DataGovAvailability {
    pub fn new(api_key: Option<&str>, retry: RetryPolicy) -> Result<Self> {
        Self::with_url(DATAGOV_AVAILABILITY_URL, api_key, retry)
    }

    /// Point the feed at a custom URL (for testing with wiremock)
    pub fn with_url(url: &str, api_key: Option<&str>, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(retry.timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
            api_key: api_key.map(str::to_string),
            retry,
        })
    }

    async fn fetch_once(&self) -> Result<AvailabilityMap> {
        let mut request = self.client.get(&self.url);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| request_error("Availability feed", e))?;

        if !response.status().is_success() {
            return Err(status_error("Availability feed", response.status()));
        }

        let body: FeedResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Failed to parse availability feed: {}", e)))?;

        Ok(parse_feed(body))
    }
}

/// Flatten the first feed item into per-carpark counts
fn parse_feed(body: FeedResponse) -> AvailabilityMap {
    let mut map = AvailabilityMap::new();
    let Some(item) = body.items.into_iter().next() else {
        return map;
    };

    for entry in item.carpark_data {
        let availability = map.entry(entry.carpark_number).or_insert_with(LotAvailability::new);
        for info in entry.carpark_info {
            let Some(lot_type) = LotType::from_code(info.lot_type.trim()) else {
                debug!("Ignoring unknown lot type {:?}", info.lot_type);
                continue;
            };
            availability.insert(
                lot_type,
                Lot::new(count(&info.total_lots), count(&info.lots_available)),
            );
        }
    }
    map
}

/// Lot counts arrive as strings; anything unreadable counts as zero
fn count(value: &serde_json::Value) -> u32 {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[async_trait]
impl AvailabilitySource for DataGovAvailability {
    fn name(&self) -> &'static str {
        "datagov"
    }

    async fn fetch(&self) -> Result<AvailabilityMap> {
        self.retry
            .run("Availability fetch", || self.fetch_once())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn feed() -> serde_json::Value {
        serde_json::json!({
            "items": [{
                "timestamp": "2024-05-01T10:00:00+08:00",
                "carpark_data": [
                    {
                        "carpark_number": "ACB",
                        "update_datetime": "2024-05-01T09:59:00",
                        "carpark_info": [
                            { "total_lots": "105", "lot_type": "C", "lots_available": "42" },
                            { "total_lots": "10", "lot_type": "Y", "lots_available": "n/a" },
                            { "total_lots": "3", "lot_type": "Z", "lots_available": "1" }
                        ]
                    },
                    {
                        "carpark_number": "BJ55",
                        "carpark_info": [
                            { "total_lots": 0, "lot_type": "C", "lots_available": 0 }
                        ]
                    }
                ]
            }]
        })
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(1, Duration::from_secs(2)).with_backoff(Duration::ZERO, Duration::ZERO)
    }

    #[test]
    fn test_parse_feed() {
        let body: FeedResponse = serde_json::from_value(feed()).unwrap();
        let map = parse_feed(body);

        let acb = &map["ACB"];
        assert_eq!(acb.get(LotType::Car), Some(&Lot::new(105, 42)));
        assert_eq!(acb.get(LotType::Motorcycle), Some(&Lot::new(10, 0)));
        assert_eq!(acb.get(LotType::Heavy), None);
        assert_eq!(map["BJ55"].ratio(LotType::Car), 0.0);
    }

    #[test]
    fn test_parse_empty_feed() {
        let body: FeedResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(parse_feed(body).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_sends_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transport/carpark-availability"))
            .and(header("api-key", "k-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(feed()))
            .expect(1)
            .mount(&server)
            .await;

        let source = DataGovAvailability::with_url(
            &format!("{}/transport/carpark-availability", server.uri()),
            Some("k-123"),
            policy(),
        )
        .unwrap();

        let map = source.fetch().await.unwrap();
        assert_eq!(map.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let source = DataGovAvailability::with_url(&server.uri(), Some("wrong"), policy()).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let source = DataGovAvailability::with_url(&server.uri(), None, policy()).unwrap();
        let err = source.fetch().await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}

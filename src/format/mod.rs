//! Output formatters
//!
//! Provides trait-based output formatting for search results.

pub mod json;
pub mod text;
pub mod url;

use crate::config::Config;
use crate::error::Result;
use crate::search::SearchResult;
use serde::{Deserialize, Serialize};

/// Information about an output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatInfo {
    /// Format name
    pub name: String,
    /// Format description
    pub description: String,
}

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Get the format name
    fn name(&self) -> &str;

    /// Get the format description
    fn description(&self) -> &str;

    /// Format a search result
    ///
    /// # Arguments
    /// * `result` - The ranked search result
    /// * `config` - Application config (for url providers, etc.)
    fn format(&self, result: &SearchResult, config: &Config) -> Result<String>;
}

/// Get a formatter by name
pub fn get_formatter(name: &str) -> Option<Box<dyn OutputFormatter>> {
    match name.to_lowercase().as_str() {
        "json" => Some(Box::new(json::JsonFormatter)),
        "text" => Some(Box::new(text::TextFormatter)),
        "url" => Some(Box::new(url::UrlFormatter)),
        _ => None,
    }
}

/// List all available formatters
pub fn available_formats() -> Vec<FormatInfo> {
    vec![
        FormatInfo {
            name: "json".to_string(),
            description: "Full JSON response".to_string(),
        },
        FormatInfo {
            name: "text".to_string(),
            description: "Human-readable ranked list".to_string(),
        },
        FormatInfo {
            name: "url".to_string(),
            description: "Map URL per carpark".to_string(),
        },
    ]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::carpark::{Candidate, Lot, LotAvailability, LotType};
    use crate::geo::{Center, Coordinates};
    use crate::search::{SearchMeta, SearchMode};
    use crate::store::tests::carpark;
    use std::sync::Arc;

    /// Two ranked carparks around Bishan
    pub(crate) fn sample_result() -> SearchResult {
        let mut first = carpark("BE3", 1.3521, 103.8480);
        first.name = "Bishan Street 13".to_string();
        first.fee.weekday = Some("$0.60 per half-hour".to_string());
        first.fee.free_parking = Some("SUN & PH FR 7AM-10.30PM".to_string());
        first.gantry_height_m = Some(2.15);
        let mut top = Candidate::new(Arc::new(first), 310.0);
        top.lot_availability = LotAvailability::new().with(LotType::Car, Lot::new(200, 87));
        top.distance_m = Some(402.0);
        top.eta_s = Some(48.0);

        let mut second = Candidate::new(Arc::new(carpark("BE10", 1.3550, 103.8500)), 690.0);
        second.distance_m = Some(897.0);
        second.eta_s = Some(108.0);

        SearchResult {
            id: "0b7f1c2e-5d1a-4c8e-9d6f-3a2b1c0d9e8f".to_string(),
            center: Center {
                coords: Coordinates::new(1.3500, 103.8480),
                address: Some("BISHAN ROAD".to_string()),
            },
            carparks: vec![top, second],
            meta: SearchMeta {
                mode: SearchMode::Text,
                query: Some("bishan".to_string()),
                radius_m: Some(3000.0),
                lot_type: LotType::Car,
                use_live_avail: true,
                count: 2,
                generated_at: chrono::Utc::now(),
            },
        }
    }

    #[test]
    fn test_get_formatter() {
        assert!(get_formatter("json").is_some());
        assert!(get_formatter("text").is_some());
        assert!(get_formatter("url").is_some());
        assert!(get_formatter("gpx").is_none());
    }

    #[test]
    fn test_get_formatter_case_insensitive() {
        assert!(get_formatter("JSON").is_some());
        assert!(get_formatter("Text").is_some());
    }

    #[test]
    fn test_available_formats() {
        let formats = available_formats();
        assert_eq!(formats.len(), 3);
        for format in &formats {
            assert!(get_formatter(&format.name).is_some());
        }
    }
}

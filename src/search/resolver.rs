//! Location resolution
//!
//! Turns a free-text place into a validated [`Center`] through the configured
//! geocoder. Coordinate searches skip this step entirely.

use crate::error::{Error, Result};
use crate::geo::{Center, Coordinates};
use crate::provider::Geocoder;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves search queries to a center point
#[derive(Clone)]
pub struct LocationResolver {
    geocoder: Arc<dyn Geocoder>,
}

impl LocationResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Geocode `query` into a center
    ///
    /// Blank queries, empty matches and geocoder failures are all reported as
    /// [`Error::Resolution`].
    pub async fn resolve(&self, query: &str) -> Result<Center> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Resolution("empty query".to_string()));
        }

        let location = match self.geocoder.geocode(query).await {
            Ok(Some(location)) => location,
            Ok(None) => return Err(Error::Resolution(format!("no match for '{}'", query))),
            Err(e) => {
                warn!("{} geocoding failed for '{}': {}", self.geocoder.name(), query, e);
                return Err(Error::Resolution(format!("'{}': {}", query, e)));
            }
        };

        debug!(
            "Resolved '{}' to ({:.6}, {:.6})",
            query, location.lat, location.lng
        );
        Center::from_location(location)
            .map_err(|e| Error::Resolution(format!("'{}': {}", query, e)))
    }

    /// Pass raw coordinates through validation
    pub fn from_coords(coords: Coordinates) -> Result<Center> {
        Center::from_coords(coords)
    }
}

impl std::fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolver")
            .field("geocoder", &self.geocoder.name())
            .finish()
    }
}

//! Geographic primitives
//!
//! Coordinates, resolved search centers and great-circle distance. Every
//! distance in the crate (radius queries, nearest lookups, travel fallback)
//! goes through [`haversine_distance`] so results stay consistent.

use crate::constants::geo::EARTH_RADIUS_METERS;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A geographic coordinate (latitude, longitude) in WGS-84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Create new coordinates
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validate that coordinates are within valid ranges
    ///
    /// Latitude: -90 to 90
    /// Longitude: -180 to 180
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || self.lat < -90.0 || self.lat > 90.0 {
            return Err(Error::InvalidCoordinates(format!(
                "Latitude {} is out of range [-90, 90]",
                self.lat
            )));
        }
        if !self.lng.is_finite() || self.lng < -180.0 || self.lng > 180.0 {
            return Err(Error::InvalidCoordinates(format!(
                "Longitude {} is out of range [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }

    /// Whether these coordinates pass [`Coordinates::validate`]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// A geocoded location result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
    /// Display name (address or description)
    pub display_name: String,
}

/// The resolved origin point of a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Center {
    #[serde(flatten)]
    pub coords: Coordinates,

    /// Resolved address, present when the center came from a text query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Center {
    /// Create a validated center from raw coordinates
    pub fn from_coords(coords: Coordinates) -> Result<Self> {
        coords.validate()?;
        Ok(Self {
            coords,
            address: None,
        })
    }

    /// Create a validated center from a geocoder hit
    pub fn from_location(location: GeoLocation) -> Result<Self> {
        let coords = Coordinates::new(location.lat, location.lng);
        coords.validate()?;
        Ok(Self {
            coords,
            address: Some(location.display_name),
        })
    }
}

/// Calculate the distance between two points in meters (Haversine formula)
pub fn haversine_distance(p1: Coordinates, p2: Coordinates) -> f64 {
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();
    let delta_lat = (p2.lat - p1.lat).to_radians();
    let delta_lng = (p2.lng - p1.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Check if a point is within `radius_meters` of `center`
pub fn is_in_circle(point: Coordinates, center: Coordinates, radius_meters: f64) -> bool {
    haversine_distance(point, center) <= radius_meters
}

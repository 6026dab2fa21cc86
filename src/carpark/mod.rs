//! Carpark data model
//!
//! Static facility records loaded from the metadata corpus, live lot counts,
//! and the per-request [`Candidate`] that joins the two with travel data.

use crate::geo::Coordinates;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Default vehicle height in meters (a typical passenger car)
pub const DEFAULT_VEHICLE_HEIGHT_M: f64 = 1.6;

/// Default carpark type when the metadata row does not name one
pub const DEFAULT_CARPARK_TYPE: &str = "MULTI-STOREY";

/// A parking facility. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carpark {
    pub id: String,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,

    /// Entrance clearance in meters, `None` when unknown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gantry_height_m: Option<f64>,

    pub carpark_type: String,

    #[serde(default)]
    pub fee: FeeSchedule,
}

impl Carpark {
    pub fn coords(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

/// Published parking rates
///
/// Every field is free text as published; a missing field means the rate is
/// unknown, not free.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sunday_ph: Option<String>,
    /// Free parking window, e.g. "SUN & PH FR 7AM-10.30PM"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_parking: Option<String>,
}

impl FeeSchedule {
    /// Whether a free-parking window is published
    pub fn has_free_parking(&self) -> bool {
        self.free_parking
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}

/// Lot category, one per vehicle class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LotType {
    /// Standard car
    #[serde(rename = "C")]
    Car,
    /// Heavy vehicle
    #[serde(rename = "H")]
    Heavy,
    /// Motorcycle with sidecar
    #[serde(rename = "S")]
    Sidecar,
    /// Motorcycle
    #[serde(rename = "Y")]
    Motorcycle,
}

impl LotType {
    /// Single-letter code used by the availability feed
    pub fn code(&self) -> &'static str {
        match self {
            Self::Car => "C",
            Self::Heavy => "H",
            Self::Sidecar => "S",
            Self::Motorcycle => "Y",
        }
    }

    /// Parse the feed's single-letter code
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "C" => Some(Self::Car),
            "H" => Some(Self::Heavy),
            "S" => Some(Self::Sidecar),
            "Y" => Some(Self::Motorcycle),
            _ => None,
        }
    }
}

impl Default for LotType {
    fn default() -> Self {
        Self::Car
    }
}

impl std::fmt::Display for LotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Car => write!(f, "car"),
            Self::Heavy => write!(f, "heavy"),
            Self::Sidecar => write!(f, "sidecar"),
            Self::Motorcycle => write!(f, "motorcycle"),
        }
    }
}

impl std::str::FromStr for LotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c" | "car" => Ok(Self::Car),
            "h" | "heavy" | "heavy_vehicle" | "heavy-vehicle" => Ok(Self::Heavy),
            "s" | "sidecar" | "motorcycle_sidecar" => Ok(Self::Sidecar),
            "y" | "motorcycle" | "motorbike" | "bike" => Ok(Self::Motorcycle),
            _ => Err(format!("Unknown vehicle class: {}", s)),
        }
    }
}

/// Total and free lots for one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub total: u32,
    pub available: u32,
}

impl Lot {
    pub fn new(total: u32, available: u32) -> Self {
        Self { total, available }
    }

    /// available / total, 0 when the carpark reports no lots
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.available) / f64::from(self.total)
        }
    }
}

/// Live lot counts keyed by category. Absent categories count as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotAvailability(BTreeMap<LotType, Lot>);

impl LotAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, lot_type: LotType, lot: Lot) -> Self {
        self.insert(lot_type, lot);
        self
    }

    pub fn insert(&mut self, lot_type: LotType, lot: Lot) {
        self.0.insert(lot_type, lot);
    }

    pub fn get(&self, lot_type: LotType) -> Option<&Lot> {
        self.0.get(&lot_type)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Availability ratio for one category, 0 when absent
    pub fn ratio(&self, lot_type: LotType) -> f64 {
        self.get(lot_type).map_or(0.0, Lot::ratio)
    }
}

/// The driver's vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub lot_type: LotType,
    pub height_m: f64,
}

impl Vehicle {
    pub fn new(lot_type: LotType, height_m: f64) -> Self {
        Self { lot_type, height_m }
    }

    /// Whether the vehicle clears a gantry. Unknown clearance never excludes.
    pub fn fits(&self, clearance_m: Option<f64>) -> bool {
        clearance_m.map_or(true, |clearance| self.height_m <= clearance)
    }
}

impl Default for Vehicle {
    fn default() -> Self {
        Self::new(LotType::Car, DEFAULT_VEHICLE_HEIGHT_M)
    }
}

/// A carpark enriched for a single search request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(flatten)]
    pub carpark: Arc<Carpark>,

    #[serde(default)]
    pub lot_availability: LotAvailability,

    /// Straight-line distance from the search center
    pub beeline_m: f64,

    /// Road distance from the travel estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,

    /// Travel time from the travel estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_s: Option<f64>,
}

impl Candidate {
    /// Wrap a stored carpark with no enrichment yet
    pub fn new(carpark: Arc<Carpark>, beeline_m: f64) -> Self {
        Self {
            carpark,
            lot_availability: LotAvailability::default(),
            beeline_m,
            distance_m: None,
            eta_s: None,
        }
    }
}

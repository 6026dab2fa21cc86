//! Candidate filters applied before ranking

use crate::carpark::{Candidate, Vehicle};

/// Minimum query length for the name/address text filter
pub const MIN_TEXT_FILTER_LEN: usize = 3;

/// Whether the vehicle clears the carpark's gantry (unknown clearance passes)
pub fn fits_vehicle(candidate: &Candidate, vehicle: &Vehicle) -> bool {
    vehicle.fits(candidate.carpark.gantry_height_m)
}

/// Match a carpark type tag against a requested type
///
/// `multi`/`multi-storey`, `basement` and `surface`/`open` are recognised
/// keywords; anything else is a case-insensitive substring match. A blank
/// request matches everything.
pub fn matches_type(carpark_type: &str, wanted: &str) -> bool {
    let wanted = wanted.trim().to_lowercase();
    let tag = carpark_type.to_lowercase();

    match wanted.as_str() {
        "" => true,
        "multi" | "multi-storey" => tag.contains("multi"),
        "basement" => tag.contains("basement"),
        "surface" | "open" => tag.contains("surface") || tag.contains("open"),
        other => tag.contains(other),
    }
}

/// Whether the carpark name or address contains `needle`, ignoring case
///
/// Needles shorter than [`MIN_TEXT_FILTER_LEN`] characters match everything.
pub fn matches_text(candidate: &Candidate, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.chars().count() < MIN_TEXT_FILTER_LEN {
        return true;
    }
    candidate.carpark.name.to_lowercase().contains(&needle)
        || candidate.carpark.address.to_lowercase().contains(&needle)
}

/// Whether the estimated road distance is within `max_m`; unknown distance fails
pub fn within_distance(candidate: &Candidate, max_m: f64) -> bool {
    candidate.distance_m.unwrap_or(f64::INFINITY) <= max_m
}

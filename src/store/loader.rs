//! CSV loading for carpark metadata and rates
//!
//! Column headers are matched case-insensitively against a list of aliases so
//! that both the published HDB export and hand-made fixtures load. Bad rows are
//! skipped and counted, never fatal.

use crate::carpark::{Carpark, FeeSchedule, DEFAULT_CARPARK_TYPE};
use crate::error::{Error, Result};
use crate::geo::Coordinates;
use csv::StringRecord;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

const ID_ALIASES: &[&str] = &["id", "car_park_no", "carpark_number", "carparkid", "carpark_id"];
const NAME_ALIASES: &[&str] = &["name", "development", "carpark_name"];
const ADDRESS_ALIASES: &[&str] = &["address", "blk_no_and_street_name", "location", "street_name"];
const LAT_ALIASES: &[&str] = &["lat", "latitude", "y", "y_coord"];
const LNG_ALIASES: &[&str] = &["lng", "longitude", "x", "x_coord"];
const TYPE_ALIASES: &[&str] = &["carpark_type", "car_park_type", "type"];
const HEIGHT_ALIASES: &[&str] = &["gantry_height", "gantryheight", "gantry_height_m"];

/// Values above this in both coordinate columns mean X and Y were swapped
const SWAPPED_AXIS_THRESHOLD: f64 = 50.0;

/// Result of parsing a carparks file
#[derive(Debug, Default)]
pub struct ParsedCarparks {
    pub carparks: Vec<Carpark>,
    /// Rows dropped for a missing id, bad coordinates, or a duplicate id
    pub skipped: usize,
}

/// Resolved column positions
#[derive(Debug, Clone, Copy)]
struct Columns {
    id: usize,
    name: Option<usize>,
    address: Option<usize>,
    lat: usize,
    lng: usize,
    carpark_type: Option<usize>,
    gantry_height: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |aliases: &[&str]| {
            aliases.iter().find_map(|alias| {
                headers
                    .iter()
                    .position(|h| h.trim().eq_ignore_ascii_case(alias))
            })
        };
        let required = |aliases: &[&str], what: &str| {
            find(aliases).ok_or_else(|| {
                Error::Metadata(format!("Carparks CSV has no {} column", what))
            })
        };

        Ok(Self {
            id: required(ID_ALIASES, "id")?,
            name: find(NAME_ALIASES),
            address: find(ADDRESS_ALIASES),
            lat: required(LAT_ALIASES, "latitude")?,
            lng: required(LNG_ALIASES, "longitude")?,
            carpark_type: find(TYPE_ALIASES),
            gantry_height: find(HEIGHT_ALIASES),
        })
    }
}

/// Load carparks from a CSV file, attaching fee schedules by id
///
/// Fails if the file cannot be opened or its header cannot be resolved.
pub fn load_carparks(path: &Path, rates: &HashMap<String, FeeSchedule>) -> Result<ParsedCarparks> {
    let file = File::open(path).map_err(|e| {
        Error::Metadata(format!("Failed to open carparks CSV {}: {}", path.display(), e))
    })?;
    read_carparks(file, rates)
}

/// Parse carparks from any CSV reader
pub fn read_carparks<R: Read>(
    reader: R,
    rates: &HashMap<String, FeeSchedule>,
) -> Result<ParsedCarparks> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| Error::Metadata(format!("Failed to read carparks CSV header: {}", e)))?
        .clone();
    let columns = Columns::resolve(&headers)?;

    let mut parsed = ParsedCarparks::default();
    let mut seen = HashSet::new();

    for (line, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping unreadable carpark row {}: {}", line + 2, e);
                parsed.skipped += 1;
                continue;
            }
        };

        match parse_row(&record, columns, rates) {
            Some(carpark) if seen.insert(carpark.id.clone()) => parsed.carparks.push(carpark),
            Some(carpark) => {
                debug!("Skipping duplicate carpark id {}", carpark.id);
                parsed.skipped += 1;
            }
            None => {
                debug!("Skipping malformed carpark row {}", line + 2);
                parsed.skipped += 1;
            }
        }
    }

    Ok(parsed)
}

fn parse_row(
    record: &StringRecord,
    columns: Columns,
    rates: &HashMap<String, FeeSchedule>,
) -> Option<Carpark> {
    let cell = |idx: Option<usize>| {
        idx.and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let id = cell(Some(columns.id))?.to_string();
    let coords = parse_coords(cell(Some(columns.lat))?, cell(Some(columns.lng))?)?;

    let name = cell(columns.name).unwrap_or(&id).to_string();
    let address = cell(columns.address).unwrap_or_default().to_string();
    let carpark_type = cell(columns.carpark_type)
        .unwrap_or(DEFAULT_CARPARK_TYPE)
        .to_string();
    let gantry_height_m = cell(columns.gantry_height).and_then(parse_height);
    let fee = rates.get(&id).cloned().unwrap_or_default();

    Some(Carpark {
        id,
        name,
        address,
        lat: coords.lat,
        lng: coords.lng,
        gantry_height_m,
        carpark_type,
        fee,
    })
}

/// Parse a lat/lng pair, undoing an X/Y column swap
fn parse_coords(lat: &str, lng: &str) -> Option<Coordinates> {
    let mut lat: f64 = lat.parse().ok()?;
    let mut lng: f64 = lng.parse().ok()?;

    if lat > SWAPPED_AXIS_THRESHOLD && lng > SWAPPED_AXIS_THRESHOLD {
        std::mem::swap(&mut lat, &mut lng);
    }

    let coords = Coordinates::new(lat, lng);
    coords.is_valid().then_some(coords)
}

/// Parse a clearance such as "2.15" or "2.15 m". Zero means unknown.
fn parse_height(raw: &str) -> Option<f64> {
    let numeric = raw
        .trim_end_matches(|c: char| c.is_ascii_alphabetic() || c.is_whitespace());
    numeric
        .parse::<f64>()
        .ok()
        .filter(|h| h.is_finite() && *h > 0.0)
}

/// Load fee schedules keyed by carpark id
///
/// Rates are an enrichment: an unreadable file yields an empty map.
pub fn load_rates(path: &Path) -> HashMap<String, FeeSchedule> {
    let rates = File::open(path)
        .map_err(Error::from)
        .and_then(read_rates);

    match rates {
        Ok(rates) => rates,
        Err(e) => {
            warn!("Rates CSV {} unreadable, using empty rates: {}", path.display(), e);
            HashMap::new()
        }
    }
}

/// Parse fee schedules from a CSV reader
///
/// Columns are positional: id, weekday, saturday, sunday_ph, free_parking.
pub fn read_rates<R: Read>(reader: R) -> Result<HashMap<String, FeeSchedule>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rates = HashMap::new();
    for record in rdr.records() {
        let Ok(record) = record else {
            continue;
        };
        let cell = |i: usize| {
            record
                .get(i)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let Some(id) = cell(0) else {
            continue;
        };

        rates.insert(
            id,
            FeeSchedule {
                weekday: cell(1),
                saturday: cell(2),
                sunday_ph: cell(3),
                free_parking: cell(4),
            },
        );
    }

    Ok(rates)
}

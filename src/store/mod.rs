//! Carpark metadata store
//!
//! An immutable [`CarparkTable`] behind an `Arc` that readers clone out of a
//! lock held only for the pointer copy. Reloading builds a fresh table and
//! swaps the pointer, so in-flight searches keep the snapshot they started with.

pub mod loader;

use crate::carpark::{Candidate, Carpark};
use crate::config::DataConfig;
use crate::error::Result;
use crate::geo::{haversine_distance, Coordinates};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Where the metadata comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSources {
    /// Carpark metadata (required)
    pub carparks: PathBuf,
    /// Fee schedules keyed by carpark id (optional)
    pub rates: Option<PathBuf>,
}

impl CsvSources {
    pub fn new(carparks: impl Into<PathBuf>) -> Self {
        Self {
            carparks: carparks.into(),
            rates: None,
        }
    }

    pub fn with_rates(mut self, rates: impl Into<PathBuf>) -> Self {
        self.rates = Some(rates.into());
        self
    }

    pub fn from_config(data: &DataConfig) -> Self {
        let sources = Self::new(&data.carparks_csv);
        if data.rates_csv.is_empty() {
            sources
        } else {
            sources.with_rates(&data.rates_csv)
        }
    }
}

/// One immutable generation of carpark records, in load order
#[derive(Debug, Default)]
pub struct CarparkTable {
    carparks: Vec<Arc<Carpark>>,
}

impl CarparkTable {
    pub fn new(carparks: Vec<Carpark>) -> Self {
        Self {
            carparks: carparks.into_iter().map(Arc::new).collect(),
        }
    }

    /// Read the sources into a new table
    pub fn read(sources: &CsvSources) -> Result<Self> {
        let rates = sources
            .rates
            .as_deref()
            .map(loader::load_rates)
            .unwrap_or_default();
        let parsed = loader::load_carparks(&sources.carparks, &rates)?;

        if parsed.skipped > 0 {
            warn!(
                "Skipped {} malformed carpark rows in {}",
                parsed.skipped,
                sources.carparks.display()
            );
        }
        if parsed.carparks.is_empty() {
            warn!("No carparks loaded from {}", sources.carparks.display());
        }
        info!(
            "Loaded {} carparks, {} rate rows",
            parsed.carparks.len(),
            rates.len()
        );

        Ok(Self::new(parsed.carparks))
    }

    pub fn len(&self) -> usize {
        self.carparks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carparks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Carpark>> {
        self.carparks.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Carpark>> {
        self.carparks.iter().find(|c| c.id == id)
    }

    /// Every carpark within `radius_m` of `center`, in table order
    pub fn within(&self, center: Coordinates, radius_m: f64) -> Vec<Candidate> {
        self.carparks
            .iter()
            .filter_map(|carpark| {
                let distance = haversine_distance(center, carpark.coords());
                (distance <= radius_m).then(|| Candidate::new(Arc::clone(carpark), distance))
            })
            .collect()
    }

    /// The `k` closest carparks, ascending by distance, ties in table order
    pub fn nearest(&self, center: Coordinates, k: usize) -> Vec<Candidate> {
        let mut scored: Vec<Candidate> = self
            .carparks
            .iter()
            .map(|carpark| {
                Candidate::new(Arc::clone(carpark), haversine_distance(center, carpark.coords()))
            })
            .collect();

        // sort_by is stable, which preserves load order among equal distances
        scored.sort_by(|a, b| a.beeline_m.total_cmp(&b.beeline_m));
        scored.truncate(k);
        scored
    }
}

/// Shared, reloadable carpark metadata
#[derive(Debug)]
pub struct CarparkStore {
    table: RwLock<Arc<CarparkTable>>,
    sources: Option<CsvSources>,
}

impl CarparkStore {
    /// Load the store once from CSV
    ///
    /// Fails when the carparks file is missing or unreadable; nothing can be
    /// served without it.
    pub fn load(sources: CsvSources) -> Result<Self> {
        let table = CarparkTable::read(&sources)?;
        Ok(Self {
            table: RwLock::new(Arc::new(table)),
            sources: Some(sources),
        })
    }

    /// Build a store from in-memory records (no reload source)
    pub fn from_carparks(carparks: Vec<Carpark>) -> Self {
        Self {
            table: RwLock::new(Arc::new(CarparkTable::new(carparks))),
            sources: None,
        }
    }

    /// The current table generation
    pub fn snapshot(&self) -> Arc<CarparkTable> {
        Arc::clone(&self.table.read())
    }

    /// Swap in a new table
    pub fn replace(&self, table: CarparkTable) {
        *self.table.write() = Arc::new(table);
    }

    /// Re-read the original sources and swap them in
    ///
    /// On failure the current table stays in place. A store built from
    /// in-memory records keeps its table and reports its size.
    pub fn reload(&self) -> Result<usize> {
        let Some(sources) = &self.sources else {
            return Ok(self.len());
        };

        let table = CarparkTable::read(sources)?;
        let count = table.len();
        self.replace(table);
        info!("Reloaded carpark metadata ({} carparks)", count);
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Every carpark within `radius_m` of `center`
    pub fn radius_query(&self, center: Coordinates, radius_m: f64) -> Vec<Candidate> {
        self.snapshot().within(center, radius_m)
    }

    /// The `k` carparks closest to `center`
    pub fn nearest_k(&self, center: Coordinates, k: usize) -> Vec<Candidate> {
        self.snapshot().nearest(center, k)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::carpark::FeeSchedule;
    use std::io::Write;
    use tempfile::NamedTempFile;

    pub(crate) fn carpark(id: &str, lat: f64, lng: f64) -> Carpark {
        Carpark {
            id: id.to_string(),
            name: format!("Carpark {}", id),
            address: String::new(),
            lat,
            lng,
            gantry_height_m: None,
            carpark_type: "MULTI-STOREY CAR PARK".to_string(),
            fee: FeeSchedule::default(),
        }
    }

    fn grid() -> Vec<Carpark> {
        let mut carparks = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                carparks.push(carpark(
                    &format!("G{}{}", i, j),
                    1.28 + i as f64 * 0.005,
                    103.78 + j as f64 * 0.005,
                ));
            }
        }
        carparks
    }

    #[test]
    fn test_radius_query_partitions_by_distance() {
        let store = CarparkStore::from_carparks(grid());
        let center = Coordinates::new(1.30, 103.80);
        let radius = 1500.0;

        let inside = store.radius_query(center, radius);
        assert!(!inside.is_empty());

        let inside_ids: Vec<_> = inside.iter().map(|c| c.carpark.id.clone()).collect();
        for candidate in &inside {
            assert!(haversine_distance(center, candidate.carpark.coords()) <= radius);
        }
        for carpark in store.snapshot().iter() {
            if !inside_ids.contains(&carpark.id) {
                assert!(haversine_distance(center, carpark.coords()) > radius);
            }
        }
    }

    #[test]
    fn test_radius_query_records_beeline() {
        let store = CarparkStore::from_carparks(vec![carpark("A", 1.3000, 103.8000)]);
        let found = store.radius_query(Coordinates::new(1.3000, 103.8010), 5000.0);

        assert_eq!(found.len(), 1);
        approx::assert_abs_diff_eq!(found[0].beeline_m, 111.2, epsilon = 0.5);
    }

    #[test]
    fn test_radius_query_empty_when_nothing_in_range() {
        let store = CarparkStore::from_carparks(grid());
        assert!(store.radius_query(Coordinates::new(1.45, 104.0), 500.0).is_empty());
    }

    #[test]
    fn test_nearest_k_orders_and_breaks_ties_by_load_order() {
        let store = CarparkStore::from_carparks(vec![
            carpark("far", 1.31, 103.80),
            carpark("tie-a", 1.301, 103.80),
            carpark("near", 1.3001, 103.80),
            carpark("tie-b", 1.301, 103.80),
        ]);

        let nearest = store.nearest_k(Coordinates::new(1.30, 103.80), 3);
        let ids: Vec<_> = nearest.iter().map(|c| c.carpark.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "tie-a", "tie-b"]);
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let store = CarparkStore::from_carparks(vec![carpark("A", 1.3, 103.8)]);
        let before = store.snapshot();

        store.replace(CarparkTable::new(vec![
            carpark("B", 1.3, 103.8),
            carpark("C", 1.3, 103.8),
        ]));

        assert_eq!(before.len(), 1);
        assert!(before.get("A").is_some());
        assert_eq!(store.len(), 2);
        assert!(store.snapshot().get("A").is_none());
    }

    #[test]
    fn test_load_and_reload_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id,name,lat,lng").unwrap();
        writeln!(file, "A,Alpha,1.30,103.80").unwrap();
        file.flush().unwrap();

        let store = CarparkStore::load(CsvSources::new(file.path())).unwrap();
        assert_eq!(store.len(), 1);

        writeln!(file, "B,Beta,1.31,103.81").unwrap();
        file.flush().unwrap();

        assert_eq!(store.reload().unwrap(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_failed_reload_keeps_table() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id,name,lat,lng").unwrap();
        writeln!(file, "A,Alpha,1.30,103.80").unwrap();
        file.flush().unwrap();

        let path = file.path().to_path_buf();
        let store = CarparkStore::load(CsvSources::new(&path)).unwrap();
        drop(file);

        assert!(store.reload().is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_load_missing_source_fails() {
        assert!(CarparkStore::load(CsvSources::new("/nonexistent/carparks.csv")).is_err());
    }
}

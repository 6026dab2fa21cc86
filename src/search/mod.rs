//! Carpark search pipeline
//!
//! A search resolves a center (geocoding text queries), pulls every carpark
//! within the radius from the store, optionally merges live lot counts,
//! estimates travel to each candidate with bounded concurrency, filters and
//! finally ranks. Dropping the returned future cancels any upstream requests
//! still in flight.

pub mod availability;
pub mod filter;
pub mod rank;
pub mod resolver;
pub mod travel;

use crate::carpark::{Candidate, LotType, Vehicle};
use crate::config::{Config, ProvidersConfig};
use crate::error::{Error, Result};
use crate::geo::{Center, Coordinates};
use crate::provider::{Providers, RetryPolicy};
use crate::store::{CarparkStore, CsvSources};
use availability::LiveAvailability;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use resolver::LocationResolver;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use travel::TravelEstimator;

/// How the search center was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Geocoded from a text query
    Text,
    /// Given as coordinates
    Near,
    /// Closest carparks regardless of radius
    Nearest,
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Near => write!(f, "near"),
            Self::Nearest => write!(f, "nearest"),
        }
    }
}

/// Per-request search parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Search radius in meters
    pub radius_m: f64,
    pub vehicle: Vehicle,
    /// Merge live lot counts into the candidates
    pub live_availability: bool,
    /// Carpark type filter (`multi`, `basement`, `surface`, or a substring)
    pub carpark_type: Option<String>,
    /// Keep only carparks whose name or address contains the text query
    pub include_text: bool,
    /// Drop carparks further than this by road
    pub max_distance_m: Option<f64>,
}

impl SearchOptions {
    /// Options from `[defaults]` and `[providers]`
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            radius_m: config.defaults.radius,
            vehicle: config.default_vehicle()?,
            live_availability: config.providers.live_availability,
            ..Self::default()
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(Error::InvalidRadius(format!(
                "Radius must be positive, got {}",
                self.radius_m
            )));
        }
        if !self.vehicle.height_m.is_finite() || self.vehicle.height_m <= 0.0 {
            return Err(Error::InvalidVehicle(format!(
                "Vehicle height must be positive, got {}",
                self.vehicle.height_m
            )));
        }
        if let Some(max) = self.max_distance_m {
            if !max.is_finite() || max <= 0.0 {
                return Err(Error::InvalidRadius(format!(
                    "Maximum distance must be positive, got {}",
                    max
                )));
            }
        }
        Ok(())
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            radius_m: crate::config::defaults::DEFAULT_RADIUS,
            vehicle: Vehicle::default(),
            live_availability: false,
            carpark_type: None,
            include_text: false,
            max_distance_m: None,
        }
    }
}

/// Ranked carparks around a center
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Unique ID for this search
    pub id: String,
    pub center: Center,
    pub carparks: Vec<Candidate>,
    pub meta: SearchMeta,
}

/// How a result was produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMeta {
    pub mode: SearchMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Radius searched, absent for nearest lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_m: Option<f64>,
    pub lot_type: LotType,
    pub use_live_avail: bool,
    pub count: usize,
    pub generated_at: DateTime<Utc>,
}

impl SearchResult {
    fn new(mode: SearchMode, query: Option<&str>, center: Center, carparks: Vec<Candidate>) -> Self {
        let count = carparks.len();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            center,
            carparks,
            meta: SearchMeta {
                mode,
                query: query.map(str::to_string),
                radius_m: None,
                lot_type: LotType::default(),
                use_live_avail: false,
                count,
                generated_at: Utc::now(),
            },
        }
    }
}

/// The search orchestrator
#[derive(Debug)]
pub struct CarparkSearch {
    store: Arc<CarparkStore>,
    providers: Providers,
    resolver: LocationResolver,
    availability: LiveAvailability,
    travel: TravelEstimator,
    route_concurrency: usize,
}

impl CarparkSearch {
    pub fn new(store: Arc<CarparkStore>, providers: Providers, config: &ProvidersConfig) -> Self {
        Self {
            store,
            resolver: LocationResolver::new(Arc::clone(&providers.geocoder)),
            availability: LiveAvailability::new(Arc::clone(&providers.availability)),
            travel: TravelEstimator::new(
                Arc::clone(&providers.router),
                RetryPolicy::from_config(config),
            ),
            route_concurrency: config.route_concurrency.max(1),
            providers,
        }
    }

    /// Load the metadata and providers named by the config
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = CarparkStore::load(CsvSources::from_config(&config.data))?;
        let providers = Providers::from_config(config)?;
        info!("Using providers: {:?}", providers);
        Ok(Self::new(Arc::new(store), providers, &config.providers))
    }

    pub fn store(&self) -> &Arc<CarparkStore> {
        &self.store
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    /// Search around a geocoded text query
    pub async fn search_by_text(&self, query: &str, options: &SearchOptions) -> Result<SearchResult> {
        options.validate()?;
        let center = self.resolver.resolve(query).await?;
        self.run(SearchMode::Text, Some(query.trim()), center, options)
            .await
    }

    /// Search around raw coordinates
    pub async fn search_by_coords(
        &self,
        coords: Coordinates,
        options: &SearchOptions,
    ) -> Result<SearchResult> {
        options.validate()?;
        let center = LocationResolver::from_coords(coords)?;
        self.run(SearchMode::Near, None, center, options).await
    }

    /// The `k` carparks closest to `coords` by straight-line distance
    ///
    /// No enrichment or ranking; candidates are in ascending distance order.
    pub fn nearest(&self, coords: Coordinates, k: usize) -> Result<SearchResult> {
        let center = LocationResolver::from_coords(coords)?;
        let carparks = self.store.nearest_k(center.coords, k);
        Ok(SearchResult::new(SearchMode::Nearest, None, center, carparks))
    }

    async fn run(
        &self,
        mode: SearchMode,
        query: Option<&str>,
        center: Center,
        options: &SearchOptions,
    ) -> Result<SearchResult> {
        let lot_type = options.vehicle.lot_type;
        let mut candidates = self.store.radius_query(center.coords, options.radius_m);
        debug!(
            "{} carparks within {}m of ({:.6}, {:.6})",
            candidates.len(),
            options.radius_m,
            center.coords.lat,
            center.coords.lng
        );

        if options.live_availability && !candidates.is_empty() {
            let live = self.availability.current_availability().await;
            for candidate in &mut candidates {
                if let Some(lots) = live.get(&candidate.carpark.id) {
                    candidate.lot_availability = lots.clone();
                }
            }
        }

        candidates.retain(|c| {
            filter::fits_vehicle(c, &options.vehicle)
                && options
                    .carpark_type
                    .as_deref()
                    .map_or(true, |wanted| filter::matches_type(&c.carpark.carpark_type, wanted))
                && match query {
                    Some(needle) if options.include_text => filter::matches_text(c, needle),
                    _ => true,
                }
        });

        let candidates = self.estimate_travel(center.coords, candidates).await;
        let candidates: Vec<Candidate> = match options.max_distance_m {
            Some(max) => candidates
                .into_iter()
                .filter(|c| filter::within_distance(c, max))
                .collect(),
            None => candidates,
        };

        let ranked = rank::rank(candidates, lot_type);
        let mut result = SearchResult::new(mode, query, center, ranked);
        result.meta.radius_m = Some(options.radius_m);
        result.meta.lot_type = lot_type;
        result.meta.use_live_avail = options.live_availability;
        Ok(result)
    }

    /// Attach road distance and ETA to every candidate
    async fn estimate_travel(&self, from: Coordinates, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let travel = &self.travel;
        stream::iter(candidates)
            .map(move |mut candidate| async move {
                let route = travel.estimate(from, candidate.carpark.coords()).await;
                candidate.distance_m = Some(route.distance_m);
                candidate.eta_s = Some(route.duration_s);
                candidate
            })
            .buffer_unordered(self.route_concurrency)
            .collect()
            .await
    }
}

//! carpark-finder: carpark discovery and ranking
//!
//! A library and CLI tool that finds parking near a place or a coordinate and
//! ranks it by lot availability, price and travel cost.
//!
//! ## Features
//!
//! - CSV carpark metadata with header aliasing and hot reload
//! - OneMap geocoding and drive routing, data.gov.sg live availability
//! - Deterministic offline providers for tests and demos
//! - Bounded-concurrency travel estimates with a geometric fallback
//! - Best-effort NEA weather forecasts for a location
//! - HTTP API + CLI interface
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use carpark_finder::carpark::{Carpark, FeeSchedule};
//! use carpark_finder::config::ProvidersConfig;
//! use carpark_finder::geo::Coordinates;
//! use carpark_finder::provider::Providers;
//! use carpark_finder::search::{CarparkSearch, SearchOptions};
//! use carpark_finder::store::CarparkStore;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = CarparkStore::from_carparks(vec![Carpark {
//!     id: "BE3".to_string(),
//!     name: "Bishan Street 13".to_string(),
//!     address: "BLK 501 BISHAN STREET 13".to_string(),
//!     lat: 1.3510,
//!     lng: 103.8480,
//!     gantry_height_m: Some(2.15),
//!     carpark_type: "MULTI-STOREY CAR PARK".to_string(),
//!     fee: FeeSchedule::default(),
//! }]);
//!
//! let search = CarparkSearch::new(
//!     Arc::new(store),
//!     Providers::mock(),
//!     &ProvidersConfig::default(),
//! );
//! let result = search
//!     .search_by_coords(Coordinates::new(1.3500, 103.8480), &SearchOptions::default())
//!     .await
//!     .unwrap();
//! println!("Best: {}", result.carparks[0].carpark.name);
//! # }
//! ```

pub mod carpark;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod geo;
pub mod provider;
pub mod search;
pub mod server;
pub mod store;
pub mod weather;

// Re-export commonly used types
pub use carpark::{Candidate, Carpark, LotType, Vehicle};
pub use config::Config;
pub use error::{Error, Result};
pub use geo::{Center, Coordinates};
pub use search::{CarparkSearch, SearchOptions, SearchResult};

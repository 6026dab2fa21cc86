//! Live availability lookup that never fails the search

use crate::provider::{AvailabilityMap, AvailabilitySource};
use std::sync::Arc;
use tracing::{debug, warn};

/// Best-effort wrapper around an [`AvailabilitySource`]
#[derive(Clone)]
pub struct LiveAvailability {
    source: Arc<dyn AvailabilitySource>,
}

impl LiveAvailability {
    pub fn new(source: Arc<dyn AvailabilitySource>) -> Self {
        Self { source }
    }

    /// Current counts, or an empty map when the feed is unavailable
    pub async fn current_availability(&self) -> AvailabilityMap {
        match self.source.fetch().await {
            Ok(map) => {
                debug!("{} returned availability for {} carparks", self.source.name(), map.len());
                map
            }
            Err(e) => {
                warn!("Live availability unavailable from {}: {}", self.source.name(), e);
                AvailabilityMap::new()
            }
        }
    }
}

impl std::fmt::Debug for LiveAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveAvailability")
            .field("source", &self.source.name())
            .finish()
    }
}

//! Travel distance and time estimation
//!
//! Routes come from the configured [`RouteProvider`] under the retry policy.
//! When every attempt fails, or the provider answers with nonsense, the
//! estimate falls back to a geometric one: the straight-line distance scaled
//! by a road circuity factor, driven at the average urban speed. Callers always
//! get a positive route.

use crate::constants::travel::{AVERAGE_SPEED_KMH, ROAD_CIRCUITY_FACTOR};
use crate::error::Error;
use crate::geo::{haversine_distance, Coordinates};
use crate::provider::{RetryPolicy, Route, RouteProvider};
use std::sync::Arc;
use tracing::debug;

/// Route estimates with a geometric fallback
#[derive(Clone)]
pub struct TravelEstimator {
    router: Arc<dyn RouteProvider>,
    retry: RetryPolicy,
}

impl TravelEstimator {
    pub fn new(router: Arc<dyn RouteProvider>, retry: RetryPolicy) -> Self {
        Self { router, retry }
    }

    /// Driving distance and time from `from` to `to`; never fails
    pub async fn estimate(&self, from: Coordinates, to: Coordinates) -> Route {
        let routed = self
            .retry
            .run("Routing", move || async move {
                let route = self.router.route(from, to).await?;
                if route.is_valid() {
                    Ok(route)
                } else {
                    Err(Error::Provider(format!(
                        "{} returned an invalid route: {:?}",
                        self.router.name(),
                        route
                    )))
                }
            })
            .await;

        match routed {
            Ok(route) => route,
            Err(e) => {
                debug!("Routing fell back to geometric estimate: {}", e);
                geometric_estimate(from, to)
            }
        }
    }
}

impl std::fmt::Debug for TravelEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TravelEstimator")
            .field("router", &self.router.name())
            .field("retry", &self.retry)
            .finish()
    }
}

/// Straight-line distance with road circuity, at the average speed
///
/// Both values are rounded and at least 1.
pub fn geometric_estimate(from: Coordinates, to: Coordinates) -> Route {
    let distance_m = (haversine_distance(from, to) * ROAD_CIRCUITY_FACTOR)
        .round()
        .max(1.0);
    let speed_mps = AVERAGE_SPEED_KMH * 1000.0 / 3600.0;
    let duration_s = (distance_m / speed_mps).round().max(1.0);
    Route::new(distance_m, duration_s)
}

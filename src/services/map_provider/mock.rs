//! Deterministic in-memory `MapProvider`.
//!
//! Used by tests and by callers planning offline. Legs can either be scripted
//! with an exact distance/duration (so a test can seed "base route distance
//! = 600 mi, duration = 10.9 h" directly, matching §8's concrete scenarios)
//! or left to fall back to Haversine-distance × a road coefficient, exactly
//! the way the teacher's `MockRoutingService` estimates road distance from
//! straight-line coordinates.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{synthesize_poi, Leg, MapProvider, PoiKind, RouteGeometry, RouteResponse};
use crate::error::MapError;
use crate::services::geo::haversine_distance_miles;
use crate::types::Location;

/// A single scripted leg: exact distance and duration, ignoring the
/// waypoints' real coordinates entirely.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedLeg {
    pub distance_miles: f64,
    pub duration_hours: f64,
}

/// Deterministic `MapProvider` for tests and offline planning.
pub struct DeterministicMapProvider {
    /// Road-distance coefficient applied to Haversine straight-line distance
    /// when a leg is not scripted (default 1.3, matching the teacher).
    road_coefficient: f64,
    /// Average road speed in mph used to derive duration from distance when
    /// a leg is not scripted (default 55, matching the HOS constants table).
    average_speed_mph: f64,
    /// Scripted legs, keyed by `(from.address, to.address)`. Keying on
    /// endpoint identity rather than call-local position means a script
    /// holds regardless of whether a leg is fetched as part of a combined
    /// multi-waypoint route or its own dedicated two-waypoint call — the
    /// Planner makes both kinds of call for the same trip (§4.B). Falls back
    /// to Haversine estimation when a pair is absent.
    scripted_legs: HashMap<(String, String), ScriptedLeg>,
    /// Directory of known addresses for `geocode`.
    geocode_directory: HashMap<String, Location>,
    poi_calls: Mutex<u32>,
}

impl Default for DeterministicMapProvider {
    fn default() -> Self {
        Self {
            road_coefficient: 1.3,
            average_speed_mph: 55.0,
            scripted_legs: HashMap::new(),
            geocode_directory: HashMap::new(),
            poi_calls: Mutex::new(0),
        }
    }
}

impl DeterministicMapProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script an exact leg: `route()` will use this distance/duration for
    /// any call whose waypoints include a `from_address -> to_address` step,
    /// regardless of what else is in that call or the waypoints' real
    /// coordinates.
    pub fn with_leg(mut self, from_address: &str, to_address: &str, distance_miles: f64, duration_hours: f64) -> Self {
        self.scripted_legs.insert(
            (from_address.to_string(), to_address.to_string()),
            ScriptedLeg {
                distance_miles,
                duration_hours,
            },
        );
        self
    }

    pub fn with_geocode(mut self, address: &str, location: Location) -> Self {
        self.geocode_directory.insert(address.to_string(), location);
        self
    }

    /// Number of `find_nearest_poi` calls made so far (tests use this to
    /// assert the Planner actually consulted the provider for each inserted
    /// break/fuel stop).
    pub fn poi_call_count(&self) -> u32 {
        *self.poi_calls.lock().expect("poi_calls mutex poisoned")
    }

    fn estimate_leg(&self, from: &Location, to: &Location) -> Leg {
        let straight_line_miles = haversine_distance_miles(from, to);
        let distance_miles = straight_line_miles * self.road_coefficient;
        let duration_hours = distance_miles / self.average_speed_mph;
        Leg {
            distance_miles,
            duration_hours,
        }
    }
}

#[async_trait]
impl MapProvider for DeterministicMapProvider {
    async fn geocode(&self, address: &str) -> Result<Location, MapError> {
        self.geocode_directory
            .get(address)
            .cloned()
            .ok_or_else(|| MapError::NotFound(address.to_string()))
    }

    async fn route(&self, waypoints: &[Location]) -> Result<RouteResponse, MapError> {
        if waypoints.len() < 2 {
            return Err(MapError::Transport(
                "route requires at least two waypoints".to_string(),
            ));
        }

        let legs: Vec<Leg> = waypoints
            .windows(2)
            .map(|pair| {
                let key = (pair[0].address.clone(), pair[1].address.clone());
                self.scripted_legs
                    .get(&key)
                    .map(|scripted| Leg {
                        distance_miles: scripted.distance_miles,
                        duration_hours: scripted.duration_hours,
                    })
                    .unwrap_or_else(|| self.estimate_leg(&pair[0], &pair[1]))
            })
            .collect();

        let distance_miles = legs.iter().map(|l| l.distance_miles).sum();
        let duration_hours = legs.iter().map(|l| l.duration_hours).sum();

        Ok(RouteResponse {
            distance_miles,
            duration_hours,
            geometry: RouteGeometry::from_locations(waypoints),
            legs,
        })
    }

    async fn find_nearest_poi(&self, lat: f64, lng: f64, kind: PoiKind) -> Location {
        *self.poi_calls.lock().expect("poi_calls mutex poisoned") += 1;
        synthesize_poi(lat, lng, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(addr: &str, lat: f64, lng: f64) -> Location {
        Location::new(addr, lat, lng).unwrap()
    }

    fn prague() -> Location {
        loc("Prague", 50.0755, 14.4378)
    }

    fn brno() -> Location {
        loc("Brno", 49.1951, 16.6068)
    }

    fn ostrava() -> Location {
        loc("Ostrava", 49.8209, 18.2625)
    }

    #[tokio::test]
    async fn estimated_route_uses_road_coefficient() {
        let provider = DeterministicMapProvider::new();
        let route = provider.route(&[prague(), brno()]).await.unwrap();
        let distance_km = route.distance_miles * 1.60934;
        assert!(distance_km > 200.0 && distance_km < 280.0, "{distance_km}");
    }

    #[tokio::test]
    async fn scripted_leg_overrides_estimate() {
        let provider = DeterministicMapProvider::new().with_leg("Prague", "Brno", 600.0, 10.9);
        let route = provider.route(&[prague(), brno()]).await.unwrap();
        assert_eq!(route.distance_miles, 600.0);
        assert_eq!(route.duration_hours, 10.9);
    }

    #[tokio::test]
    async fn scripted_legs_compose_across_multiple_waypoints() {
        let provider = DeterministicMapProvider::new()
            .with_leg("Prague", "Brno", 55.0, 1.0)
            .with_leg("Brno", "Ostrava", 600.0, 10.9);
        let route = provider.route(&[prague(), brno(), ostrava()]).await.unwrap();
        assert_eq!(route.legs.len(), 2);
        assert_eq!(route.distance_miles, 655.0);
        assert!((route.duration_hours - 11.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn scripted_leg_holds_across_separate_dedicated_calls() {
        // The Planner fetches [current, pickup, dropoff] in one call and
        // later re-fetches [pickup, dropoff] alone for leg1 geometry; both
        // calls must resolve the pickup->dropoff leg to the same script.
        let provider = DeterministicMapProvider::new()
            .with_leg("Prague", "Brno", 55.0, 1.0)
            .with_leg("Brno", "Ostrava", 600.0, 10.9);
        let combined = provider.route(&[prague(), brno(), ostrava()]).await.unwrap();
        let dedicated = provider.route(&[brno(), ostrava()]).await.unwrap();
        assert_eq!(combined.legs[1].distance_miles, dedicated.distance_miles);
        assert_eq!(combined.legs[1].duration_hours, dedicated.duration_hours);
    }

    #[tokio::test]
    async fn route_rejects_single_waypoint() {
        let provider = DeterministicMapProvider::new();
        assert!(provider.route(&[prague()]).await.is_err());
    }

    #[tokio::test]
    async fn find_nearest_poi_always_returns_a_value_and_counts_calls() {
        let provider = DeterministicMapProvider::new();
        let poi = provider.find_nearest_poi(1.0, 2.0, PoiKind::Rest).await;
        assert_eq!(poi.lat, 1.0);
        assert_eq!(provider.poi_call_count(), 1);
    }

    #[tokio::test]
    async fn geocode_unknown_address_is_not_found() {
        let provider = DeterministicMapProvider::new();
        assert!(matches!(
            provider.geocode("nowhere").await,
            Err(MapError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn geocode_known_address_returns_seeded_location() {
        let provider = DeterministicMapProvider::new().with_geocode("Fresno, CA", brno());
        let result = provider.geocode("Fresno, CA").await.unwrap();
        assert_eq!(result.address, "Brno");
    }
}

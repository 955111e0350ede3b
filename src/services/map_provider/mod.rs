//! The `MapProvider` capability port (§4.A).
//!
//! This is the only boundary the Planner crosses that can block on network
//! I/O or fail with [`MapError`]. Implementations: [`mock::DeterministicMapProvider`]
//! for tests and offline planning, [`http::HttpMapProvider`] for a real
//! geocoding + directions backend.

pub mod http;
pub mod mock;

pub use http::{HttpMapProvider, HttpMapProviderConfig};
pub use mock::DeterministicMapProvider;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::MapError;
use crate::types::Location;

/// The kind of point of interest [`MapProvider::find_nearest_poi`] looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoiKind {
    Rest,
    Fuel,
    Lodging,
}

impl PoiKind {
    fn label(self) -> &'static str {
        match self {
            PoiKind::Rest => "Rest area",
            PoiKind::Fuel => "Fuel stop",
            PoiKind::Lodging => "Lodging",
        }
    }
}

/// Route geometry as GeoJSON-ordered `[lng, lat]` coordinates.
#[derive(Debug, Clone, Default, Serialize, serde::Deserialize, PartialEq)]
pub struct RouteGeometry {
    pub coordinates: Vec<[f64; 2]>,
}

impl RouteGeometry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_locations(locations: &[Location]) -> Self {
        Self {
            coordinates: locations.iter().map(|l| [l.lng, l.lat]).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    fn total_miles_hint(total_route_miles: f64) -> f64 {
        total_route_miles.max(f64::EPSILON)
    }
}

/// One waypoint-to-waypoint segment of a [`RouteResponse`].
#[derive(Debug, Clone, Copy)]
pub struct Leg {
    pub distance_miles: f64,
    pub duration_hours: f64,
}

/// Response from [`MapProvider::route`].
#[derive(Debug, Clone)]
pub struct RouteResponse {
    pub distance_miles: f64,
    pub duration_hours: f64,
    pub geometry: RouteGeometry,
    pub legs: Vec<Leg>,
}

/// Capability interface the core consumes for geocoding, routing, POI lookup
/// and geometry interpolation (§4.A). Any implementation — real HTTP client
/// or in-memory fake — satisfies it; the Planner never distinguishes them.
#[async_trait]
pub trait MapProvider: Send + Sync {
    /// Geocode an address to coordinates. Idempotent; returns the first match.
    async fn geocode(&self, address: &str) -> Result<Location, MapError>;

    /// Fetch a multi-waypoint driving route. `waypoints.len() >= 2`.
    async fn route(&self, waypoints: &[Location]) -> Result<RouteResponse, MapError>;

    /// Find the nearest point of interest of `kind` to `(lat, lng)`. Must
    /// always return a value — on upstream failure the implementation
    /// synthesizes a `Location` at the query coordinate.
    async fn find_nearest_poi(&self, lat: f64, lng: f64, kind: PoiKind) -> Location;

    /// Interpolate a point along `geometry` at `distance_miles` of
    /// `total_miles`, by polyline-vertex-index fraction. Clamped at bounds.
    /// Implementations may override this; the default is a pure geometric
    /// computation shared by every provider.
    fn point_along(&self, geometry: &RouteGeometry, distance_miles: f64, total_miles: f64) -> (f64, f64) {
        interpolate_point_along(geometry, distance_miles, total_miles)
    }
}

/// Shared default for [`MapProvider::point_along`]: linear interpolation by
/// vertex-index fraction, clamped to the polyline's bounds.
pub fn interpolate_point_along(geometry: &RouteGeometry, distance_miles: f64, total_miles: f64) -> (f64, f64) {
    let coords = &geometry.coordinates;
    if coords.is_empty() {
        return (0.0, 0.0);
    }
    if coords.len() == 1 {
        let [lng, lat] = coords[0];
        return (lat, lng);
    }

    let total = RouteGeometry::total_miles_hint(total_miles);
    let fraction = (distance_miles / total).clamp(0.0, 1.0);

    let last_idx = (coords.len() - 1) as f64;
    let scaled = fraction * last_idx;
    let lower = scaled.floor() as usize;
    let upper = (lower + 1).min(coords.len() - 1);
    let local_t = scaled - lower as f64;

    let [lng0, lat0] = coords[lower];
    let [lng1, lat1] = coords[upper];
    let lat = lat0 + (lat1 - lat0) * local_t;
    let lng = lng0 + (lng1 - lng0) * local_t;
    (lat, lng)
}

/// Synthesize a fallback POI location at the query coordinate with a
/// descriptive address — the behavior every `find_nearest_poi` implementation
/// falls back to when the upstream lookup fails or is unavailable.
pub fn synthesize_poi(lat: f64, lng: f64, kind: PoiKind) -> Location {
    Location {
        address: format!("{} near ({:.4}, {:.4})", kind.label(), lat, lng),
        lat,
        lng,
    }
}

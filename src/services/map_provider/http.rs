//! HTTP-backed `MapProvider`: Nominatim for geocoding, an OSRM-compatible
//! `/route` service for directions and POI search. Mirrors the shape of the
//! teacher's `nominatim.rs` and `valhalla.rs` clients: one `reqwest::Client`
//! with a fixed timeout, one base URL per upstream, JSON in and out.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{synthesize_poi, Leg, MapProvider, PoiKind, RouteGeometry, RouteResponse};
use crate::error::MapError;
use crate::types::Location;

const METERS_PER_MILE: f64 = 1609.344;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Configuration for [`HttpMapProvider`].
#[derive(Debug, Clone)]
pub struct HttpMapProviderConfig {
    /// Nominatim-compatible geocoder base URL.
    pub geocoder_base_url: String,
    /// OSRM-compatible directions engine base URL.
    pub directions_base_url: String,
    pub timeout_seconds: u64,
}

impl Default for HttpMapProviderConfig {
    fn default() -> Self {
        Self {
            geocoder_base_url: "https://nominatim.openstreetmap.org".to_string(),
            directions_base_url: "http://localhost:5000".to_string(),
            timeout_seconds: 10,
        }
    }
}

/// Real `MapProvider` backed by a Nominatim-compatible geocoder and an
/// OSRM-compatible directions engine.
pub struct HttpMapProvider {
    client: reqwest::Client,
    config: HttpMapProviderConfig,
}

impl HttpMapProvider {
    pub fn new(config: HttpMapProviderConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("hos-trip-planner/0.1")
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("failed to build HTTP client for MapProvider");
        Self { client, config }
    }

    fn transport_err(context: &str, err: impl std::fmt::Display) -> MapError {
        MapError::Transport(format!("{context}: {err}"))
    }

    /// Map a `reqwest::Error` to [`MapError`], distinguishing a client-side
    /// timeout (`reqwest::Error::is_timeout`) from every other transport
    /// failure so callers can tell "the upstream never answered within
    /// `timeout_seconds`" apart from a generic connection/parse error.
    fn request_err(&self, context: &str, err: reqwest::Error) -> MapError {
        if err.is_timeout() {
            MapError::Timeout(std::time::Duration::from_secs(self.config.timeout_seconds))
        } else {
            MapError::Transport(format!("{context}: {err}"))
        }
    }
}

#[async_trait]
impl MapProvider for HttpMapProvider {
    async fn geocode(&self, address: &str) -> Result<Location, MapError> {
        let url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.config.geocoder_base_url,
            urlencoding::encode(address)
        );

        debug!("geocoding '{}'", address);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.request_err("geocode request failed", e))?;

        if !response.status().is_success() {
            return Err(MapError::Transport(format!(
                "geocoder returned status {}",
                response.status()
            )));
        }

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .map_err(|e| Self::transport_err("failed to parse geocoder response", e))?;

        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| MapError::NotFound(address.to_string()))?;

        let lat: f64 = first
            .lat
            .parse()
            .map_err(|_| Self::transport_err("geocoder returned invalid latitude", &first.lat))?;
        let lng: f64 = first
            .lon
            .parse()
            .map_err(|_| Self::transport_err("geocoder returned invalid longitude", &first.lon))?;

        Ok(Location {
            address: first.display_name,
            lat,
            lng,
        })
    }

    async fn route(&self, waypoints: &[Location]) -> Result<RouteResponse, MapError> {
        if waypoints.len() < 2 {
            return Err(MapError::Transport(
                "route requires at least two waypoints".to_string(),
            ));
        }

        let coordinates = waypoints
            .iter()
            .map(|w| format!("{},{}", w.lng, w.lat))
            .collect::<Vec<_>>()
            .join(";");

        let url = format!(
            "{}/route/v1/driving/{}?overview=full&geometries=geojson&steps=false",
            self.config.directions_base_url, coordinates
        );

        debug!("requesting route for {} waypoints", waypoints.len());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.request_err("route request failed", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MapError::Transport(format!(
                "directions engine returned {status}: {body}"
            )));
        }

        let parsed: OsrmRouteResponse = response
            .json()
            .await
            .map_err(|e| Self::transport_err("failed to parse route response", e))?;

        let route = parsed
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| MapError::Transport("directions engine returned no routes".to_string()))?;

        let legs = route
            .legs
            .iter()
            .map(|l| Leg {
                distance_miles: l.distance / METERS_PER_MILE,
                duration_hours: l.duration / SECONDS_PER_HOUR,
            })
            .collect();

        let geometry = RouteGeometry {
            coordinates: route.geometry.coordinates,
        };

        Ok(RouteResponse {
            distance_miles: route.distance / METERS_PER_MILE,
            duration_hours: route.duration / SECONDS_PER_HOUR,
            geometry,
            legs,
        })
    }

    async fn find_nearest_poi(&self, lat: f64, lng: f64, kind: PoiKind) -> Location {
        // A real deployment would query an Overpass/POI-search endpoint here.
        // Whatever happens upstream, the port contract requires a value, so
        // any failure (including "not implemented") falls back to the same
        // synthesized location every other provider uses.
        warn!("POI search not wired to a live backend, synthesizing fallback");
        synthesize_poi(lat, lng, kind)
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    distance: f64,
    duration: f64,
}

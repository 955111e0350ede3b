//! Configuration management

use anyhow::Result;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Nominatim-compatible geocoder URL
    pub geocoder_url: String,

    /// OSRM-compatible directions engine URL
    pub directions_url: String,

    /// HTTP timeout for MapProvider requests, in seconds
    pub map_provider_timeout_seconds: u64,

    /// When true, plan against the deterministic in-memory MapProvider
    /// instead of the HTTP-backed one (no network access required)
    pub use_mock_map_provider: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let geocoder_url = std::env::var("GEOCODER_URL")
            .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string());

        let directions_url = std::env::var("DIRECTIONS_URL")
            .unwrap_or_else(|_| "http://localhost:5000".to_string());

        let map_provider_timeout_seconds = std::env::var("MAP_PROVIDER_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let use_mock_map_provider = std::env::var("USE_MOCK_MAP_PROVIDER")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            geocoder_url,
            directions_url,
            map_provider_timeout_seconds,
            use_mock_map_provider,
        })
    }
}

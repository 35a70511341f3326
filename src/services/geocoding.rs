//! Geocoding abstraction layer
//!
//! - `GoogleGeocoder` for production: one request per address, failures
//!   captured as `GeocodeResult::Failed`
//! - `MockGeocoder` for tests and dry runs (deterministic, no network)
//!
//! Selected via the GEOCODER_BACKEND env variable ("google" or "mock").

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::{Config, GeocoderBackend};
use crate::services::google::{self, GoogleGeocodingClient};
use crate::types::{
    AddressComponent, Coordinates, GeocodeMatch, GeocodeResult, Geometry, STATUS_OK,
};

/// Geocoder trait - abstraction for all geocoding implementations
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocode a free-text address. Never fails: errors come back as `Failed`.
    async fn geocode(&self, address: &str) -> GeocodeResult;

    /// Get the name of this geocoder implementation
    fn name(&self) -> &'static str;
}

/// Geocoder backed by the Google Geocoding API
pub struct GoogleGeocoder {
    client: GoogleGeocodingClient,
}

impl GoogleGeocoder {
    pub fn new(api_url: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: GoogleGeocodingClient::new(api_url, api_key)?,
        })
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> GeocodeResult {
        match self.client.fetch(address).await {
            Ok(response) => {
                if let Some(message) = &response.error_message {
                    debug!("Geocoder returned {} for '{}': {}", response.status, address, message);
                }
                google::interpret_response(response)
            }
            Err(e) => google::request_failure(&e),
        }
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

// ==========================================================================
// MockGeocoder Implementation
// ==========================================================================

/// Mock geocoder - echoes the address back as components with deterministic coordinates
pub struct MockGeocoder;

impl MockGeocoder {
    pub fn new() -> Self {
        Self
    }

    /// Generate deterministic coordinates from the address hash, inside the contiguous US
    fn hash_to_coordinates(address: &str) -> Coordinates {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        address.hash(&mut hasher);
        let hash = hasher.finish();

        const LAT_MIN: f64 = 30.0;
        const LAT_MAX: f64 = 45.0;
        const LNG_MIN: f64 = -120.0;
        const LNG_MAX: f64 = -75.0;

        let lat_normalized = ((hash >> 32) as f64) / (u32::MAX as f64);
        let lng_normalized = ((hash & 0xFFFFFFFF) as f64) / (u32::MAX as f64);

        Coordinates {
            lat: LAT_MIN + lat_normalized * (LAT_MAX - LAT_MIN),
            lng: LNG_MIN + lng_normalized * (LNG_MAX - LNG_MIN),
        }
    }

    /// Street from the first segment; city, state and zip from the last three
    fn components(address: &str) -> Vec<AddressComponent> {
        fn component(value: &str, tag: &str) -> AddressComponent {
            AddressComponent {
                long_name: value.to_string(),
                short_name: value.to_string(),
                types: vec![tag.to_string()],
            }
        }

        let parts: Vec<&str> = address.split(',').map(str::trim).collect();
        let mut components = Vec::new();

        if let Some(street) = parts.first().filter(|s| !s.is_empty()) {
            match street.split_once(' ') {
                Some((number, name)) if number.chars().all(|c| c.is_ascii_digit()) => {
                    components.push(component(number, "street_number"));
                    components.push(component(name, "route"));
                }
                _ => components.push(component(street, "route")),
            }
        }

        if parts.len() >= 4 {
            let tail = &parts[parts.len() - 3..];
            components.push(component(tail[0], "locality"));
            components.push(component(tail[1], "administrative_area_level_1"));
            components.push(component(tail[2], "postal_code"));
        }

        components.push(component("US", "country"));
        components
    }
}

impl Default for MockGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, address: &str) -> GeocodeResult {
        if address.trim().is_empty() {
            return GeocodeResult::failed("ZERO_RESULTS");
        }

        GeocodeResult::Matched {
            result: GeocodeMatch {
                address_components: Self::components(address),
                geometry: Geometry {
                    location: Self::hash_to_coordinates(address),
                    location_type: "APPROXIMATE".to_string(),
                },
                types: vec!["street_address".to_string()],
                formatted_address: Some(address.to_string()),
            },
            status: STATUS_OK.to_string(),
            match_count: 1,
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ==========================================================================
// Factory function
// ==========================================================================

/// Create the geocoder selected in the configuration
pub fn create_geocoder(config: &Config) -> Result<Arc<dyn Geocoder>> {
    match config.geocoder_backend {
        GeocoderBackend::Google => {
            info!("Using GoogleGeocoder");
            Ok(Arc::new(GoogleGeocoder::new(&config.api_url, &config.api_key)?))
        }
        GeocoderBackend::Mock => {
            info!("Using MockGeocoder");
            Ok(Arc::new(MockGeocoder::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unwrap_match(result: GeocodeResult) -> GeocodeMatch {
        match result {
            GeocodeResult::Matched { result, .. } => result,
            other => panic!("expected match, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn mock_geocoder_returns_deterministic_coordinates() {
        let geocoder = MockGeocoder::new();

        let a = unwrap_match(geocoder.geocode("1 MAIN ST,X,NY,10001").await);
        let b = unwrap_match(geocoder.geocode("1 MAIN ST,X,NY,10001").await);
        let c = unwrap_match(geocoder.geocode("9 ELM RD,Y,NJ,07001").await);

        assert_eq!(a.geometry.location, b.geometry.location);
        assert_ne!(a.geometry.location, c.geometry.location);
    }

    #[tokio::test]
    async fn mock_geocoder_splits_address_into_components() {
        let result = unwrap_match(MockGeocoder::new().geocode("1 Main St,X,NY,10001").await);
        let normalized = crate::services::normalizer::normalize(&result.address_components);

        assert_eq!(normalized.address_line_1(), "1 MAIN ST");
        assert_eq!(normalized.city, "X");
        assert_eq!(normalized.state, "NY");
        assert_eq!(normalized.zipcode, "10001");
        assert_eq!(normalized.country, "US");
    }

    #[tokio::test]
    async fn mock_geocoder_fails_on_empty_address() {
        let result = MockGeocoder::new().geocode("  ").await;
        assert_eq!(result, GeocodeResult::failed("ZERO_RESULTS"));
    }

    #[tokio::test]
    async fn google_geocoder_captures_transport_errors() {
        let geocoder = GoogleGeocoder::new("http://127.0.0.1:1/geocode?", "key").unwrap();
        match geocoder.geocode("1 MAIN ST").await {
            GeocodeResult::Failed { reason } => assert!(reason.starts_with("Failed Request")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn geocoder_names() {
        assert_eq!(MockGeocoder::new().name(), "mock");
        let google = GoogleGeocoder::new("https://example.invalid/geocode?", "key").unwrap();
        assert_eq!(google.name(), "google");
    }
}

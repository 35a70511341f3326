//! Geocoding API payloads and call outcomes

use serde::Deserialize;

/// Status string the geocoding API returns for a successful lookup
pub const STATUS_OK: &str = "OK";

/// Coordinates
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// One typed component of a geocoded address (`street_number`, `route`, ...)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl AddressComponent {
    pub fn has_type(&self, tag: &str) -> bool {
        self.types.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Geometry {
    pub location: Coordinates,
    /// ROOFTOP, RANGE_INTERPOLATED, GEOMETRIC_CENTER or APPROXIMATE
    pub location_type: String,
}

/// A single entry of the `results` array
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodeMatch {
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    pub geometry: Geometry,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

/// Raw response body of the geocoding endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeMatch>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Outcome of a single geocoding call. Never partially populated.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeResult {
    Matched {
        /// First entry of the API result list
        result: GeocodeMatch,
        status: String,
        /// Total number of results the API returned
        match_count: usize,
    },
    Failed {
        reason: String,
    },
}

impl GeocodeResult {
    pub fn failed(reason: impl Into<String>) -> Self {
        GeocodeResult::Failed { reason: reason.into() }
    }
}

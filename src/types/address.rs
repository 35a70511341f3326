//! Address types

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::geocode::GeocodeMatch;

/// Latitude/longitude written for lookups that produced no location
pub const SENTINEL_COORDINATE: f64 = -1.0;

/// Placeholder for accuracy and types of failed lookups
pub const NOT_AVAILABLE: &str = "NA";

/// One row of the source address table
#[derive(Debug, Clone, PartialEq, Default, FromRow)]
pub struct RawAddress {
    #[sqlx(rename = "address_key")]
    pub key: i64,
    pub address_line_1: String,
    pub address_line_2: String,
    /// `ATTENTION` column of the source table
    pub notes: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub county: String,
}

/// Fixed output schema produced from the geocoder's component list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedAddress {
    pub street_number: String,
    pub street_name: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub county: String,
    pub country: String,
    /// `#`-prefixed unit designator, e.g. `#4B`
    pub subpremise: String,
}

impl NormalizedAddress {
    /// Street number and street name joined by a space
    pub fn address_line_1(&self) -> String {
        format!("{} {}", self.street_number, self.street_name)
            .trim()
            .to_string()
    }
}

/// Source columns carried into the output row, trimmed
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceAddressFields {
    pub address_line_1: String,
    pub address_line_2: String,
    pub city: String,
    pub state: String,
    pub county: String,
    pub zip: String,
}

impl From<&RawAddress> for SourceAddressFields {
    fn from(raw: &RawAddress) -> Self {
        Self {
            address_line_1: raw.address_line_1.trim().to_string(),
            address_line_2: raw.address_line_2.trim().to_string(),
            city: raw.city.trim().to_string(),
            state: raw.state.trim().to_string(),
            county: raw.county.trim().to_string(),
            zip: raw.zip.trim().to_string(),
        }
    }
}

/// Normalized columns of a successfully geocoded row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CleanedAddressFields {
    pub address_line_1: String,
    pub address_line_2: String,
    pub city: String,
    pub state: String,
    pub county: String,
    pub zip: String,
    pub country: String,
}

impl From<&NormalizedAddress> for CleanedAddressFields {
    fn from(normalized: &NormalizedAddress) -> Self {
        Self {
            address_line_1: normalized.address_line_1(),
            address_line_2: normalized.subpremise.clone(),
            city: normalized.city.clone(),
            state: normalized.state.clone(),
            county: normalized.county.clone(),
            zip: normalized.zipcode.clone(),
            country: normalized.country.clone(),
        }
    }
}

/// Output row appended to the target table, once per processed source key
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedAddressRecord {
    pub key: i64,
    pub response_date: DateTime<Utc>,
    pub response_message: String,
    pub response_accuracy: String,
    pub response_types: String,
    pub response_match_count: i32,
    pub notes: String,
    pub source: SourceAddressFields,
    /// `None` for failed lookups; all normalized columns are written as NULL
    pub cleaned: Option<CleanedAddressFields>,
    pub latitude: f64,
    pub longitude: f64,
}

impl CleanedAddressRecord {
    /// Build the success shape from a matched geocoder result
    pub fn matched(
        raw: &RawAddress,
        result: &GeocodeMatch,
        normalized: &NormalizedAddress,
        status: &str,
        match_count: usize,
        response_date: DateTime<Utc>,
    ) -> Self {
        Self {
            key: raw.key,
            response_date,
            response_message: status.to_string(),
            response_accuracy: result.geometry.location_type.clone(),
            response_types: result.types.join("."),
            response_match_count: i32::try_from(match_count).unwrap_or(i32::MAX),
            notes: raw.notes.trim().to_string(),
            source: SourceAddressFields::from(raw),
            cleaned: Some(CleanedAddressFields::from(normalized)),
            latitude: result.geometry.location.lat,
            longitude: result.geometry.location.lng,
        }
    }

    /// Build the failure shape: sentinel coordinates, no normalized columns
    pub fn failed(raw: &RawAddress, reason: &str, response_date: DateTime<Utc>) -> Self {
        Self {
            key: raw.key,
            response_date,
            response_message: reason.to_string(),
            response_accuracy: NOT_AVAILABLE.to_string(),
            response_types: NOT_AVAILABLE.to_string(),
            response_match_count: 0,
            notes: raw.notes.trim().to_string(),
            source: SourceAddressFields::from(raw),
            cleaned: None,
            latitude: SENTINEL_COORDINATE,
            longitude: SENTINEL_COORDINATE,
        }
    }
}

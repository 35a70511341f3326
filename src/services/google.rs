//! Google Geocoding API client

use anyhow::{Context, Result};
use thiserror::Error;

use crate::types::{GeocodeResponse, GeocodeResult, STATUS_OK};

/// Why a request produced no usable response body
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Thin HTTP client: one GET per address, no retry
pub struct GoogleGeocodingClient {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GoogleGeocodingClient {
    /// Create a new client. `api_url` is the endpoint prefix the query string is appended to.
    pub fn new(api_url: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("address-cleanser/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    /// Full request URL for an address
    pub fn request_url(&self, address: &str) -> String {
        format!(
            "{}address={}&key={}",
            self.api_url,
            urlencoding::encode(address),
            urlencoding::encode(&self.api_key)
        )
    }

    /// Send the request and decode the body, whatever its `status`
    pub async fn fetch(&self, address: &str) -> Result<GeocodeResponse, GeocodeError> {
        let body = self
            .client
            .get(self.request_url(address))
            .send()
            .await?
            .text()
            .await?;

        Ok(serde_json::from_str(&body)?)
    }
}

/// Map a decoded response onto the call outcome
pub fn interpret_response(response: GeocodeResponse) -> GeocodeResult {
    if response.status != STATUS_OK {
        return GeocodeResult::failed(response.status);
    }

    let match_count = response.results.len();
    match response.results.into_iter().next() {
        Some(result) => GeocodeResult::Matched {
            result,
            status: response.status,
            match_count,
        },
        None => GeocodeResult::failed("Failed Request: OK status without results"),
    }
}

/// Failure reason for a request that never produced a response
pub fn request_failure(error: &GeocodeError) -> GeocodeResult {
    GeocodeResult::failed(format!("Failed Request: {}", error))
}

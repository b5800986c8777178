//! HTTP client for the ip-api.com JSON geolocation endpoint

use crate::trace::config::DEFAULT_GEO_ENDPOINT;
use serde::{Deserialize, Serialize};

/// Error type for geolocation lookups
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    /// The HTTP request could not be completed.
    #[error("geolocation request failed: {0}")]
    Request(String),

    /// The service answered but did not report success for this address.
    #[error("geolocation lookup failed for {0}")]
    LookupFailed(String),
}

/// Geographic metadata for an IP address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoInfo {
    /// Two-letter country code (e.g., "NL")
    pub country_code: String,
    /// Country name
    pub country: String,
    /// City name
    pub city: String,
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lon: f64,
}

/// Wire format of the ip-api.com JSON response. Fields other than `status`
/// are absent when the lookup fails, so everything else is optional.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    country: Option<String>,
    city: Option<String>,
}

impl ApiResponse {
    fn into_geo_info(self, ip: &str) -> Result<GeoInfo, GeoError> {
        if self.status != "success" {
            return Err(GeoError::LookupFailed(ip.to_string()));
        }
        Ok(GeoInfo {
            country_code: self.country_code.unwrap_or_default(),
            country: self.country.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            lat: self.lat.unwrap_or(0.0),
            lon: self.lon.unwrap_or(0.0),
        })
    }
}

/// Client for an ip-api.com style geolocation endpoint
#[derive(Debug, Clone)]
pub struct GeoClient {
    http: reqwest::Client,
    endpoint: String,
}

impl GeoClient {
    /// Create a client against the default public endpoint.
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_GEO_ENDPOINT)
    }

    /// Create a client against a custom endpoint base URL.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    /// Query the endpoint for one IP address.
    ///
    /// Network failures and non-`success` responses are both lookup
    /// failures; there is no retry.
    pub async fn lookup(&self, ip: &str) -> Result<GeoInfo, GeoError> {
        let url = format!("{}/{}", self.endpoint, ip);
        let response: ApiResponse = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| GeoError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| GeoError::Request(e.to_string()))?;

        response.into_geo_info(ip)
    }
}

impl Default for GeoClient {
    fn default() -> Self {
        Self::new()
    }
}

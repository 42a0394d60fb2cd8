//! Address → coordinates lookup.

use crate::config::GeocoderConfig;
use crate::endpoint::Coordinates;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    #[error("location not found: '{address}'")]
    LocationNotFound { address: String },

    #[error("geocoder network error: {0}")]
    Network(String),

    #[error("geocoder returned HTTP status {0}")]
    HttpStatus(u16),

    #[error("malformed geocoder response: {0}")]
    MalformedResponse(String),
}

/// Resolves a free-form address to coordinates.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError>;
}

/// One search hit. Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// OpenStreetMap Nominatim search client.
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| GeocodeError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Take the first hit of a search response.
    pub fn parse_body(address: &str, body: &str) -> Result<Coordinates, GeocodeError> {
        let places: Vec<Place> = serde_json::from_str(body)
            .map_err(|e| GeocodeError::MalformedResponse(e.to_string()))?;
        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::LocationNotFound {
                address: address.to_string(),
            })?;

        let lat: f64 = place
            .lat
            .parse()
            .map_err(|_| GeocodeError::MalformedResponse(format!("bad latitude '{}'", place.lat)))?;
        let lng: f64 = place
            .lon
            .parse()
            .map_err(|_| GeocodeError::MalformedResponse(format!("bad longitude '{}'", place.lon)))?;

        if let Some(name) = &place.display_name {
            info!(%address, resolved = %name, "geocoded address");
        }
        Coordinates::new(lat, lng).map_err(|e| GeocodeError::MalformedResponse(e.to_string()))
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        if address.trim().is_empty() {
            return Err(GeocodeError::LocationNotFound {
                address: address.to_string(),
            });
        }

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .map_err(|e| GeocodeError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GeocodeError::HttpStatus(status.as_u16()));
        }

        let body = resp
            .text()
            .map_err(|e| GeocodeError::Network(format!("failed to read body: {e}")))?;
        Self::parse_body(address, &body)
    }
}

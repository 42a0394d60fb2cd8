//! Query parameters for one day's request against the sunrise/sunset API.

use crate::dates::DateRange;
use crate::error::SunchartError;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Public sunrise/sunset endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.sunrise-sunset.org/json";

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Latitude must lie in [-90, 90] and longitude in [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, SunchartError> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lng_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        if !lat_ok || !lng_ok {
            return Err(SunchartError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lat = {}, lng = {}", self.latitude, self.longitude)
    }
}

/// One calendar day's query. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointRequest {
    pub coordinates: Coordinates,
    pub date: NaiveDate,
    /// 0 = ISO 8601 instants, 1 = 12-hour clock strings.
    pub formatted: u8,
    pub callback: Option<String>,
}

impl EndpointRequest {
    pub fn new(coordinates: Coordinates, date: NaiveDate) -> Self {
        Self {
            coordinates,
            date,
            formatted: 0,
            callback: None,
        }
    }

    pub fn with_formatted(mut self, formatted: u8) -> Self {
        self.formatted = formatted;
        self
    }

    pub fn with_callback(mut self, callback: impl Into<String>) -> Self {
        self.callback = Some(callback.into());
        self
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates.latitude()
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates.longitude()
    }

    /// Query string pairs: `lat`, `lng`, `date` (YYYY-MM-DD), `formatted`,
    /// and `callback` only when set.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("lat", self.latitude().to_string()),
            ("lng", self.longitude().to_string()),
            ("date", self.date.format("%Y-%m-%d").to_string()),
            ("formatted", self.formatted.to_string()),
        ];
        if let Some(callback) = &self.callback {
            pairs.push(("callback", callback.clone()));
        }
        pairs
    }
}

/// Build one request per date in the range, in range order.
pub fn build_requests(
    range: &DateRange,
    coordinates: Coordinates,
    formatted: u8,
) -> Vec<EndpointRequest> {
    range
        .iter()
        .map(|date| EndpointRequest::new(coordinates, date).with_formatted(formatted))
        .collect()
}

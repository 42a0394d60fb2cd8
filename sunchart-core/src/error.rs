//! Top-level error type for pipeline runs.
//!
//! Variants are designed to be displayable directly in the CLI; the lower
//! layers (fetching, geocoding, configuration) keep their own error enums
//! and are wrapped here.

use crate::config::ConfigError;
use crate::dates::DateBound;
use crate::geocode::GeocodeError;
use crate::provider::FetchError;
use chrono::NaiveDate;
use thiserror::Error;

/// Everything that can stop a pipeline run.
#[derive(Debug, Error)]
pub enum SunchartError {
    #[error("wrong {bound} date format: '{input}' (expected MM-DD-YYYY)")]
    DateFormat { bound: DateBound, input: String },

    #[error("invalid coordinates: lat = {latitude}, lng = {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("unknown time zone: '{name}'")]
    UnknownTimeZone { name: String },

    #[error("fetch failed for {date} (request #{index}): {source}")]
    Fetch {
        index: usize,
        date: NaiveDate,
        #[source]
        source: FetchError,
    },

    #[error("every day in the range failed to download ({failed} failures)")]
    NoSuccessfulDays { failed: usize },

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("worker pool error: {0}")]
    Pool(String),

    #[error("failed to spawn pipeline thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("pipeline thread terminated without reporting a result")]
    WorkerPanicked,
}

impl SunchartError {
    /// The underlying fetch cause, if this error came from a single day's fetch.
    pub fn fetch_cause(&self) -> Option<&FetchError> {
        match self {
            SunchartError::Fetch { source, .. } => Some(source),
            _ => None,
        }
    }
}

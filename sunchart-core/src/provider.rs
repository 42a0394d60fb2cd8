//! Day fetcher trait and structured fetch error types.
//!
//! The `DayFetcher` trait abstracts over the sunrise/sunset source so the pool
//! and pipeline can be driven by the HTTP client in production and by mocks in
//! tests.

use crate::endpoint::{Coordinates, EndpointRequest};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single day's fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Which solar event the pipeline charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolarEvent {
    #[default]
    Sunrise,
    Sunset,
}

impl std::str::FromStr for SolarEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sunrise" => Ok(SolarEvent::Sunrise),
            "sunset" => Ok(SolarEvent::Sunset),
            other => Err(format!("unknown solar event '{other}' (expected sunrise or sunset)")),
        }
    }
}

/// Sunrise and sunset for one day, as UTC instants.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarTimes {
    pub date: NaiveDate,
    pub coordinates: Coordinates,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

impl SolarTimes {
    pub fn instant(&self, event: SolarEvent) -> DateTime<Utc> {
        match event {
            SolarEvent::Sunrise => self.sunrise,
            SolarEvent::Sunset => self.sunset,
        }
    }
}

/// Outcome of one request, tagged with its position in the submitted batch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    Success(SolarTimes),
    Failure {
        index: usize,
        date: NaiveDate,
        cause: FetchError,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success(_))
    }
}

/// Fetches one day of solar times.
///
/// Each pool worker opens its own session with [`open_session`](Self::open_session)
/// and passes it to every [`fetch`](Self::fetch) it performs. Sessions are
/// never shared between threads.
pub trait DayFetcher: Send + Sync {
    /// Per-worker resource, e.g. an HTTP client holding a keep-alive connection.
    type Session;

    /// Human-readable name of this source.
    fn name(&self) -> &str;

    fn open_session(&self) -> Result<Self::Session, FetchError>;

    fn fetch(
        &self,
        session: &mut Self::Session,
        request: &EndpointRequest,
    ) -> Result<SolarTimes, FetchError>;
}

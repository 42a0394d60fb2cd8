//! sunrise-sunset.org data provider.
//!
//! Issues one blocking GET per day against the public JSON API and parses
//! `results.sunrise` / `results.sunset` into UTC instants. No retries: a
//! failed day is reported as-is to the pool.

use crate::config::ProviderConfig;
use crate::endpoint::{EndpointRequest, DEFAULT_BASE_URL};
use crate::provider::{DayFetcher, FetchError, SolarTimes};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// API response envelope. `status` is informational only; success is
/// decided by the HTTP status code and the presence of both instants.
#[derive(Debug, Deserialize)]
struct SunApiResponse {
    results: SunApiResults,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SunApiResults {
    sunrise: Option<String>,
    sunset: Option<String>,
}

/// HTTP fetcher for api.sunrise-sunset.org.
#[derive(Debug, Clone)]
pub struct SunriseSunsetClient {
    base_url: String,
    timeout: Duration,
    user_agent: String,
}

impl Default for SunriseSunsetClient {
    fn default() -> Self {
        Self::from_config(&ProviderConfig::default())
    }
}

impl SunriseSunsetClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let defaults = ProviderConfig::default();
        Self {
            base_url: base_url.into(),
            timeout: defaults.timeout(),
            user_agent: defaults.user_agent,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Parse a response body for the given request.
    pub fn parse_body(request: &EndpointRequest, body: &str) -> Result<SolarTimes, FetchError> {
        let resp: SunApiResponse = serde_json::from_str(body).map_err(|e| {
            FetchError::MalformedResponse(format!("failed to parse response for {}: {e}", request.date))
        })?;

        if let Some(status) = &resp.status {
            debug!(date = %request.date, %status, "provider status");
        }

        let sunrise = resp
            .results
            .sunrise
            .ok_or_else(|| FetchError::MalformedResponse("missing results.sunrise".into()))?;
        let sunset = resp
            .results
            .sunset
            .ok_or_else(|| FetchError::MalformedResponse("missing results.sunset".into()))?;

        Ok(SolarTimes {
            date: request.date,
            coordinates: request.coordinates,
            sunrise: parse_instant(&sunrise, request)?,
            sunset: parse_instant(&sunset, request)?,
        })
    }
}

/// Parse one instant from the API.
///
/// Unformatted responses carry ISO 8601 instants. Formatted responses carry
/// only a 12-hour UTC clock time (`7:27:02 AM`), see [`place_clock_time`].
fn parse_instant(raw: &str, request: &EndpointRequest) -> Result<DateTime<Utc>, FetchError> {
    let raw = raw.trim();
    if request.formatted == 1 {
        let time = NaiveTime::parse_from_str(raw, "%I:%M:%S %p").map_err(|e| {
            FetchError::MalformedResponse(format!("invalid clock time '{raw}': {e}"))
        })?;
        return Ok(place_clock_time(time, request.date, request.longitude()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| FetchError::MalformedResponse(format!("invalid instant '{raw}': {e}")))
}

/// Put a UTC clock time on the UTC day nearest the location's solar noon.
///
/// Sunrise and sunset both fall within twelve hours of solar noon, which is
/// roughly `12:00 - longitude / 15` hours UTC. Far east the morning lands on
/// the previous UTC day; far west the evening lands on the next one.
fn place_clock_time(time: NaiveTime, date: NaiveDate, longitude: f64) -> DateTime<Utc> {
    let offset_secs = (longitude / 15.0 * 3600.0).round() as i64;
    let solar_noon =
        date.and_time(NaiveTime::MIN).and_utc() + TimeDelta::hours(12) - TimeDelta::seconds(offset_secs);

    [date.pred_opt(), Some(date), date.succ_opt()]
        .into_iter()
        .flatten()
        .map(|day| day.and_time(time).and_utc())
        .min_by_key(|candidate| (*candidate - solar_noon).num_seconds().abs())
        .unwrap_or_else(|| date.and_time(time).and_utc())
}

impl DayFetcher for SunriseSunsetClient {
    type Session = reqwest::blocking::Client;

    fn name(&self) -> &str {
        if self.base_url == DEFAULT_BASE_URL {
            "sunrise_sunset_org"
        } else {
            "sunrise_sunset_custom"
        }
    }

    fn open_session(&self) -> Result<Self::Session, FetchError> {
        debug!(endpoint = %self.base_url, "opening HTTP session");
        reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))
    }

    fn fetch(
        &self,
        session: &mut Self::Session,
        request: &EndpointRequest,
    ) -> Result<SolarTimes, FetchError> {
        let resp = session
            .get(&self.base_url)
            .query(&request.query_pairs())
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = resp
            .text()
            .map_err(|e| FetchError::Network(format!("failed to read body: {e}")))?;
        let times = Self::parse_body(request, &body)?;

        info!(endpoint = %self.base_url, date = %request.date, "downloaded data from endpoint");
        Ok(times)
    }
}

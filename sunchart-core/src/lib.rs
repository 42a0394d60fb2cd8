//! Sunchart Core — daily sunrise/sunset fetch-and-aggregate pipeline.
//!
//! This crate contains:
//! - Inclusive date ranges and boundary date parsing
//! - Per-day endpoint requests and the sunrise-sunset.org HTTP fetcher
//! - A bounded-concurrency fetch pool with strict or partial failure policy
//! - Time-zone conversion over the IANA database
//! - Aggregation into `(date, seconds since local midnight)` rows
//! - A pipeline runner with a background completion handle
//! - Geocoding and chart-rendering collaborators, and TOML configuration

pub mod aggregate;
pub mod chart;
pub mod config;
pub mod dates;
pub mod endpoint;
pub mod error;
pub mod geocode;
pub mod pipeline;
pub mod pool;
pub mod provider;
pub mod sunrise_sunset;
pub mod timezone;

pub use aggregate::{aggregate, format_hms, AggregatedRow};
pub use chart::{ChartError, ChartRenderer, CsvChart, TextChart};
pub use config::{ConfigError, SunchartConfig};
pub use dates::{DateBound, DateRange};
pub use endpoint::{Coordinates, EndpointRequest};
pub use error::SunchartError;
pub use geocode::{GeocodeError, Geocoder, NominatimGeocoder};
pub use pipeline::{DayFailure, Pipeline, PipelineHandle, PipelineOptions, PipelineOutput, RunParams};
pub use pool::{FailurePolicy, FetchPool};
pub use provider::{DayFetcher, FetchError, FetchResult, SolarEvent, SolarTimes};
pub use sunrise_sunset::SunriseSunsetClient;
pub use timezone::{LocalizedInstant, TimeZoneConverter};

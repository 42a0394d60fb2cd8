//! Pipeline runner: date range → requests → concurrent fetch → zone
//! conversion → aggregated rows.
//!
//! Runs synchronously via [`Pipeline::run`], or on a dedicated background
//! thread via [`Pipeline::spawn`], which hands back a [`PipelineHandle`]
//! carrying a one-shot completion channel.

use crate::aggregate::{aggregate, AggregatedRow};
use crate::config::SunchartConfig;
use crate::dates::DateRange;
use crate::endpoint::{build_requests, Coordinates};
use crate::error::SunchartError;
use crate::pool::{FailurePolicy, FetchPool, DEFAULT_WORKERS};
use crate::provider::{DayFetcher, FetchError, FetchResult, SolarEvent};
use crate::timezone::{LocalizedInstant, TimeZoneConverter};
use chrono::NaiveDate;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Knobs for a pipeline instance.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub workers: usize,
    pub policy: FailurePolicy,
    pub event: SolarEvent,
    /// Value of the `formatted` query parameter (0 or 1).
    pub formatted: u8,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            policy: FailurePolicy::Strict,
            event: SolarEvent::Sunrise,
            formatted: 0,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &SunchartConfig) -> Self {
        Self {
            workers: config.pool.workers,
            policy: config.pool.failure_policy,
            event: config.output.event,
            formatted: config.provider.formatted,
        }
    }
}

/// Validated inputs for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunParams {
    pub range: DateRange,
    pub coordinates: Coordinates,
    pub zone: TimeZoneConverter,
}

impl RunParams {
    /// Parse raw user input. Checked in order: start date, end date, zone.
    pub fn parse(
        start: &str,
        end: &str,
        coordinates: Coordinates,
        zone_name: &str,
    ) -> Result<Self, SunchartError> {
        let range = DateRange::parse(start, end)?;
        let zone = TimeZoneConverter::new(zone_name)?;
        Ok(Self {
            range,
            coordinates,
            zone,
        })
    }
}

/// A day that could not be fetched under [`FailurePolicy::Partial`].
#[derive(Debug, Clone, PartialEq)]
pub struct DayFailure {
    pub index: usize,
    pub date: NaiveDate,
    pub cause: FetchError,
}

/// Rows in date order, plus any per-day failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOutput {
    pub rows: Vec<AggregatedRow>,
    pub failures: Vec<DayFailure>,
}

impl PipelineOutput {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fetch-and-aggregate pipeline over a [`DayFetcher`].
#[derive(Debug)]
pub struct Pipeline<F> {
    fetcher: F,
    pool: FetchPool,
    options: PipelineOptions,
}

impl<F: DayFetcher> Pipeline<F> {
    pub fn new(fetcher: F, options: PipelineOptions) -> Result<Self, SunchartError> {
        let pool = FetchPool::new(options.workers)?;
        Ok(Self {
            fetcher,
            pool,
            options,
        })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Parse the inputs and run to completion on the calling thread.
    pub fn run(
        &self,
        start: &str,
        end: &str,
        coordinates: Coordinates,
        zone_name: &str,
    ) -> Result<PipelineOutput, SunchartError> {
        let params = RunParams::parse(start, end, coordinates, zone_name)?;
        self.run_params(&params)
    }

    /// Run with already-validated inputs.
    pub fn run_params(&self, params: &RunParams) -> Result<PipelineOutput, SunchartError> {
        let requests = build_requests(&params.range, params.coordinates, self.options.formatted);
        debug!(
            start = %params.range.start(),
            end = %params.range.end(),
            days = requests.len(),
            zone = params.zone.name(),
            coordinates = %params.coordinates,
            "running pipeline"
        );

        let event = self.options.event;
        let (localized, failures): (Vec<LocalizedInstant>, Vec<DayFailure>) =
            match self.options.policy {
                FailurePolicy::Strict => {
                    let times = self.pool.run_all(&self.fetcher, &requests)?;
                    let localized = times
                        .iter()
                        .map(|t| params.zone.convert(t.instant(event)))
                        .collect();
                    (localized, Vec::new())
                }
                FailurePolicy::Partial => {
                    let mut localized = Vec::with_capacity(requests.len());
                    let mut failures = Vec::new();
                    for result in self.pool.run_each(&self.fetcher, &requests) {
                        match result {
                            FetchResult::Success(times) => {
                                localized.push(params.zone.convert(times.instant(event)));
                            }
                            FetchResult::Failure { index, date, cause } => {
                                warn!(%date, error = %cause, "day failed, continuing");
                                failures.push(DayFailure { index, date, cause });
                            }
                        }
                    }
                    if localized.is_empty() && !failures.is_empty() {
                        return Err(SunchartError::NoSuccessfulDays {
                            failed: failures.len(),
                        });
                    }
                    (localized, failures)
                }
            };

        let rows = aggregate(&localized);
        info!(rows = rows.len(), failures = failures.len(), "pipeline complete");
        Ok(PipelineOutput { rows, failures })
    }
}

impl<F: DayFetcher + 'static> Pipeline<F> {
    /// Run on a dedicated background thread.
    ///
    /// The caller never blocks on network I/O; it either polls
    /// [`PipelineHandle::is_finished`] or waits on the completion channel.
    /// There is no cooperative cancellation: dropping the handle abandons the
    /// result but the run itself continues to completion or first failure.
    pub fn spawn(self: Arc<Self>, params: RunParams) -> Result<PipelineHandle, SunchartError> {
        let (tx, rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("sunchart-pipeline".into())
            .spawn(move || {
                let outcome = self.run_params(&params);
                // Receiver gone means the caller abandoned the run.
                let _ = tx.send(outcome);
            })
            .map_err(SunchartError::Spawn)?;

        Ok(PipelineHandle {
            receiver: rx,
            thread: Some(thread),
        })
    }
}

/// Completion handle for a background run.
#[derive(Debug)]
pub struct PipelineHandle {
    receiver: Receiver<Result<PipelineOutput, SunchartError>>,
    thread: Option<JoinHandle<()>>,
}

impl PipelineHandle {
    /// Liveness flag: `true` once the background thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Take the result if it is ready, without blocking.
    pub fn try_result(&mut self) -> Option<Result<PipelineOutput, SunchartError>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(self.finish(outcome)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.finish(Err(SunchartError::WorkerPanicked))),
        }
    }

    /// Wait up to `timeout` for the result.
    pub fn wait_timeout(
        &mut self,
        timeout: Duration,
    ) -> Option<Result<PipelineOutput, SunchartError>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => Some(self.finish(outcome)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                Some(self.finish(Err(SunchartError::WorkerPanicked)))
            }
        }
    }

    /// Block until the run completes.
    pub fn wait(mut self) -> Result<PipelineOutput, SunchartError> {
        let outcome = self
            .receiver
            .recv()
            .unwrap_or(Err(SunchartError::WorkerPanicked));
        self.finish(outcome)
    }

    fn finish(
        &mut self,
        outcome: Result<PipelineOutput, SunchartError>,
    ) -> Result<PipelineOutput, SunchartError> {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                return Err(SunchartError::WorkerPanicked);
            }
        }
        outcome
    }
}

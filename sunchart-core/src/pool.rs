//! Bounded-concurrency batch fetching.
//!
//! A private rayon pool runs exactly `workers` long-lived tasks. Each task
//! opens one session and reuses it for every request it claims from a shared
//! cursor. Outcomes are tagged with their request index and sorted before
//! they are returned, so output position `i` always belongs to request `i`
//! whatever order the fetches complete in.

use crate::endpoint::EndpointRequest;
use crate::error::SunchartError;
use crate::provider::{DayFetcher, FetchError, FetchResult, SolarTimes};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Default number of concurrently in-flight fetches.
pub const DEFAULT_WORKERS: usize = 5;

/// What to do when a single day fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// First failure aborts the batch; no rows are produced.
    #[default]
    Strict,
    /// Keep every success and report failures per day.
    Partial,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(FailurePolicy::Strict),
            "partial" => Ok(FailurePolicy::Partial),
            other => Err(format!("unknown failure policy '{other}' (expected strict or partial)")),
        }
    }
}

/// Fixed-width worker pool for day fetches.
pub struct FetchPool {
    workers: usize,
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for FetchPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchPool")
            .field("workers", &self.workers)
            .finish()
    }
}

impl FetchPool {
    pub fn new(workers: usize) -> Result<Self, SunchartError> {
        if workers == 0 {
            return Err(SunchartError::Pool("worker width must be at least 1".into()));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sunchart-fetch-{i}"))
            .build()
            .map_err(|e| SunchartError::Pool(e.to_string()))?;
        Ok(Self { workers, pool })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Fetch every request; the first failure aborts the batch.
    ///
    /// Workers stop pulling new requests once a failure is seen. Fetches
    /// already in flight run to completion but their results are discarded.
    /// The reported error is the lowest-index failure that was observed.
    pub fn run_all<F: DayFetcher>(
        &self,
        fetcher: &F,
        requests: &[EndpointRequest],
    ) -> Result<Vec<SolarTimes>, SunchartError> {
        debug!(
            source = fetcher.name(),
            requests = requests.len(),
            workers = self.workers,
            "starting strict fetch batch"
        );
        self.drive(fetcher, requests, true)
            .into_iter()
            .map(|(index, outcome)| {
                outcome.map_err(|source| SunchartError::Fetch {
                    index,
                    date: requests[index].date,
                    source,
                })
            })
            .collect()
    }

    /// Fetch every request and report each outcome separately.
    pub fn run_each<F: DayFetcher>(
        &self,
        fetcher: &F,
        requests: &[EndpointRequest],
    ) -> Vec<FetchResult> {
        debug!(
            source = fetcher.name(),
            requests = requests.len(),
            workers = self.workers,
            "starting per-item fetch batch"
        );
        self.drive(fetcher, requests, false)
            .into_iter()
            .map(|(index, outcome)| match outcome {
                Ok(times) => FetchResult::Success(times),
                Err(cause) => FetchResult::Failure {
                    index,
                    date: requests[index].date,
                    cause,
                },
            })
            .collect()
    }

    /// Start one long-lived task per worker. Each task opens its session on
    /// first use and keeps pulling the next unclaimed index from a shared
    /// cursor until the batch is exhausted or aborted.
    ///
    /// Outcomes come back sorted by request index. With `stop_on_error` the
    /// list may be shorter than `requests`, but then it contains a failure.
    fn drive<F: DayFetcher>(
        &self,
        fetcher: &F,
        requests: &[EndpointRequest],
        stop_on_error: bool,
    ) -> Vec<(usize, Result<SolarTimes, FetchError>)> {
        let tasks = self.workers.min(requests.len());
        let cursor = AtomicUsize::new(0);
        let abort = AtomicBool::new(false);
        let collected = Mutex::new(Vec::with_capacity(requests.len()));

        self.pool.scope(|scope| {
            for _ in 0..tasks {
                scope.spawn(|_| {
                    let mut session: Option<Result<F::Session, FetchError>> = None;
                    let mut local = Vec::new();
                    while !abort.load(Ordering::Acquire) {
                        let index = cursor.fetch_add(1, Ordering::AcqRel);
                        let Some(request) = requests.get(index) else {
                            break;
                        };
                        let active = session.get_or_insert_with(|| fetcher.open_session());
                        let outcome = fetch_one(fetcher, active, request);
                        if stop_on_error && outcome.is_err() {
                            abort.store(true, Ordering::Release);
                        }
                        local.push((index, outcome));
                    }
                    collected
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .append(&mut local);
                });
            }
        });

        let mut outcomes = collected.into_inner().unwrap_or_else(PoisonError::into_inner);
        outcomes.sort_unstable_by_key(|(index, _)| *index);
        outcomes
    }
}

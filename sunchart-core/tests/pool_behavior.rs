//! Concurrency guarantees of the fetch pool: exactly-once dispatch, order
//! preservation, bounded in-flight fetches and per-worker sessions.

mod common;

use common::{date, MockFetcher};
use std::time::Duration;
use sunchart_core::dates::DateRange;
use sunchart_core::endpoint::{build_requests, Coordinates};
use sunchart_core::pool::FetchPool;
use sunchart_core::provider::{FetchError, FetchResult};
use sunchart_core::SunchartError;

fn year_2020_requests() -> Vec<sunchart_core::EndpointRequest> {
    let range = DateRange::new(date(2020, 1, 1), date(2020, 12, 31));
    build_requests(&range, Coordinates::new(52.52, 13.405).unwrap(), 0)
}

#[test]
fn every_request_fetched_exactly_once() {
    let requests = year_2020_requests();
    let fetcher = MockFetcher::sunrise_at(5, 0, 0);
    let pool = FetchPool::new(5).unwrap();

    let out = pool.run_all(&fetcher, &requests).unwrap();

    assert_eq!(out.len(), 366);
    assert_eq!(fetcher.calls(), 366);
    assert_eq!(fetcher.distinct_dates().len(), 366);
}

#[test]
fn results_follow_submission_order_not_completion_order() {
    let requests = year_2020_requests()[..30].to_vec();
    let fetcher = MockFetcher::sunrise_at(5, 0, 0).with_delay(Duration::from_millis(3));
    let pool = FetchPool::new(4).unwrap();

    let out = pool.run_all(&fetcher, &requests).unwrap();

    let got: Vec<_> = out.iter().map(|t| t.date).collect();
    let want: Vec<_> = requests.iter().map(|r| r.date).collect();
    assert_eq!(got, want);
}

#[test]
fn in_flight_fetches_never_exceed_width() {
    let requests = year_2020_requests()[..40].to_vec();
    let fetcher = MockFetcher::sunrise_at(5, 0, 0).with_delay(Duration::from_millis(5));
    let pool = FetchPool::new(3).unwrap();

    pool.run_all(&fetcher, &requests).unwrap();

    assert!(fetcher.max_in_flight() <= 3, "max in flight = {}", fetcher.max_in_flight());
    assert!(fetcher.max_in_flight() >= 1);
}

#[test]
fn sessions_are_reused_across_requests() {
    let requests = year_2020_requests();
    let fetcher = MockFetcher::sunrise_at(5, 0, 0);
    let pool = FetchPool::new(2).unwrap();

    pool.run_all(&fetcher, &requests).unwrap();

    assert!(fetcher.sessions() >= 1);
    assert!(fetcher.sessions() <= 2, "sessions opened = {}", fetcher.sessions());
}

#[test]
fn at_most_one_session_per_worker_under_load() {
    let requests = year_2020_requests();
    let fetcher = MockFetcher::sunrise_at(5, 0, 0).with_delay(Duration::from_millis(2));
    let pool = FetchPool::new(5).unwrap();

    let out = pool.run_all(&fetcher, &requests).unwrap();

    assert_eq!(out.len(), 366);
    assert!(fetcher.sessions() <= 5, "sessions opened = {}", fetcher.sessions());
}

#[test]
fn short_batch_opens_no_more_sessions_than_requests() {
    let requests = year_2020_requests()[..2].to_vec();
    let fetcher = MockFetcher::sunrise_at(5, 0, 0);
    let pool = FetchPool::new(8).unwrap();

    pool.run_each(&fetcher, &requests);

    assert!(fetcher.sessions() <= 2, "sessions opened = {}", fetcher.sessions());
}

#[test]
fn strict_batch_reports_lowest_failed_index() {
    let requests = year_2020_requests()[..20].to_vec();
    let fetcher = MockFetcher::sunrise_at(5, 0, 0)
        .failing_on(date(2020, 1, 6), FetchError::HttpStatus(500))
        .failing_on(date(2020, 1, 3), FetchError::HttpStatus(502));
    let pool = FetchPool::new(1).unwrap();

    let err = pool.run_all(&fetcher, &requests).unwrap_err();

    assert!(matches!(
        err,
        SunchartError::Fetch { index: 2, source: FetchError::HttpStatus(502), .. }
    ));
    assert_eq!(fetcher.calls(), 3);
}

#[test]
fn run_each_isolates_failures() {
    let requests = year_2020_requests()[..10].to_vec();
    let fetcher = MockFetcher::sunrise_at(5, 0, 0)
        .failing_on(date(2020, 1, 4), FetchError::HttpStatus(503))
        .failing_on(date(2020, 1, 9), FetchError::Network("reset".into()));
    let pool = FetchPool::new(5).unwrap();

    let out = pool.run_each(&fetcher, &requests);

    assert_eq!(out.len(), 10);
    assert_eq!(fetcher.calls(), 10);
    let failed: Vec<usize> = out
        .iter()
        .filter_map(|r| match r {
            FetchResult::Failure { index, .. } => Some(*index),
            FetchResult::Success(_) => None,
        })
        .collect();
    assert_eq!(failed, vec![3, 8]);
    assert_eq!(out.iter().filter(|r| r.is_success()).count(), 8);
}

#[test]
fn width_one_is_sequential() {
    let requests = year_2020_requests()[..15].to_vec();
    let fetcher = MockFetcher::sunrise_at(5, 0, 0).with_delay(Duration::from_millis(1));
    let pool = FetchPool::new(1).unwrap();

    pool.run_all(&fetcher, &requests).unwrap();

    assert_eq!(fetcher.max_in_flight(), 1);
    assert_eq!(
        fetcher.seen_dates(),
        requests.iter().map(|r| r.date).collect::<Vec<_>>()
    );
}

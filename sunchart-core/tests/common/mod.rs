//! Mock day fetchers shared by the integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use sunchart_core::endpoint::EndpointRequest;
use sunchart_core::provider::{DayFetcher, FetchError, SolarTimes};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Returns the same UTC sunrise/sunset clock times for every date, optionally
/// failing specific dates, while recording every call it receives.
pub struct MockFetcher {
    sunrise: NaiveTime,
    sunset: NaiveTime,
    failures: HashMap<NaiveDate, FetchError>,
    delay: Duration,
    calls: AtomicUsize,
    sessions: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    seen: Mutex<Vec<NaiveDate>>,
}

impl MockFetcher {
    pub fn sunrise_at(h: u32, m: u32, s: u32) -> Self {
        Self {
            sunrise: NaiveTime::from_hms_opt(h, m, s).unwrap(),
            sunset: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            failures: HashMap::new(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            sessions: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, date: NaiveDate, error: FetchError) -> Self {
        self.failures.insert(date, error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn seen_dates(&self) -> Vec<NaiveDate> {
        self.seen.lock().unwrap().clone()
    }

    pub fn distinct_dates(&self) -> HashSet<NaiveDate> {
        self.seen_dates().into_iter().collect()
    }
}

/// Per-worker session that remembers which thread opened it.
pub struct MockSession {
    pub owner: std::thread::ThreadId,
}

impl DayFetcher for MockFetcher {
    type Session = MockSession;

    fn name(&self) -> &str {
        "mock"
    }

    fn open_session(&self) -> Result<MockSession, FetchError> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(MockSession {
            owner: std::thread::current().id(),
        })
    }

    fn fetch(
        &self,
        session: &mut MockSession,
        request: &EndpointRequest,
    ) -> Result<SolarTimes, FetchError> {
        assert_eq!(
            session.owner,
            std::thread::current().id(),
            "session used on a thread other than the one that opened it"
        );

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.date);

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(err) = self.failures.get(&request.date) {
            return Err(err.clone());
        }
        Ok(SolarTimes {
            date: request.date,
            coordinates: request.coordinates,
            sunrise: request.date.and_time(self.sunrise).and_utc(),
            sunset: request.date.and_time(self.sunset).and_utc(),
        })
    }
}

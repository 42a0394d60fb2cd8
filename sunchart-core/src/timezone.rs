//! UTC → named time zone conversion backed by the IANA tz database.

use crate::error::SunchartError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// An instant projected onto a zone's wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalizedInstant {
    pub local: NaiveDateTime,
    pub instant: DateTime<Utc>,
}

impl LocalizedInstant {
    pub fn date(&self) -> NaiveDate {
        self.local.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.local.time()
    }
}

/// Converts UTC instants into one fixed zone.
///
/// The zone name is resolved once at construction; conversion itself cannot
/// fail and uses the offset in force at each instant, historical DST included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZoneConverter {
    zone: Tz,
}

impl TimeZoneConverter {
    pub fn new(zone_name: &str) -> Result<Self, SunchartError> {
        let zone = zone_name
            .trim()
            .parse::<Tz>()
            .map_err(|_| SunchartError::UnknownTimeZone {
                name: zone_name.to_string(),
            })?;
        Ok(Self { zone })
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn name(&self) -> &'static str {
        self.zone.name()
    }

    pub fn convert(&self, instant: DateTime<Utc>) -> LocalizedInstant {
        LocalizedInstant {
            local: instant.with_timezone(&self.zone).naive_local(),
            instant,
        }
    }

    /// Map a wall-clock time back to UTC. `None` when the local time is
    /// skipped or repeated by a DST transition.
    pub fn to_utc(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.zone
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Convert a single instant into the named zone.
pub fn convert(instant: DateTime<Utc>, zone_name: &str) -> Result<LocalizedInstant, SunchartError> {
    Ok(TimeZoneConverter::new(zone_name)?.convert(instant))
}

/// Every zone identifier the converter accepts.
pub fn zone_names() -> impl Iterator<Item = &'static str> {
    chrono_tz::TZ_VARIANTS.iter().map(|tz| tz.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn utc_is_identity() {
        let instant = utc("2020-01-01T06:00:00Z");
        let local = convert(instant, "UTC").unwrap();
        assert_eq!(local.local, instant.naive_utc());
        assert_eq!(local.instant, instant);
    }

    #[test]
    fn sao_paulo_without_dst_in_2020() {
        let local = convert(utc("2020-01-15T06:00:00Z"), "America/Sao_Paulo").unwrap();
        assert_eq!(local.time(), NaiveTime::from_hms_opt(3, 0, 0).unwrap());
    }

    #[test]
    fn historical_offset_not_current() {
        // Brazil still observed DST in January 2018 (UTC-2).
        let local = convert(utc("2018-01-15T06:00:00Z"), "America/Sao_Paulo").unwrap();
        assert_eq!(local.time(), NaiveTime::from_hms_opt(4, 0, 0).unwrap());
    }

    #[test]
    fn conversion_can_change_calendar_date() {
        let local = convert(utc("2020-03-01T02:30:00Z"), "America/New_York").unwrap();
        assert_eq!(local.date(), NaiveDate::from_ymd_opt(2020, 2, 29).unwrap());
    }

    #[test]
    fn unknown_zone_rejected() {
        match TimeZoneConverter::new("Mars/Olympus_Mons") {
            Err(SunchartError::UnknownTimeZone { name }) => assert_eq!(name, "Mars/Olympus_Mons"),
            other => panic!("expected UnknownTimeZone, got: {other:?}"),
        }
    }

    #[test]
    fn roundtrip_on_dst_transition_day() {
        let conv = TimeZoneConverter::new("America/New_York").unwrap();
        // 2021-03-14 is the spring-forward day; 12:00Z is after the jump (08:00 EDT).
        let instant = utc("2021-03-14T12:00:00Z");
        let local = conv.convert(instant);
        assert_eq!(local.time(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(conv.to_utc(local.local), Some(instant));
    }

    #[test]
    fn roundtrip_on_plain_day() {
        let conv = TimeZoneConverter::new("Europe/Berlin").unwrap();
        let instant = utc("2021-07-01T04:51:13Z");
        assert_eq!(conv.to_utc(conv.convert(instant).local), Some(instant));
    }

    #[test]
    fn skipped_local_time_has_no_utc() {
        let conv = TimeZoneConverter::new("America/New_York").unwrap();
        let gap = NaiveDate::from_ymd_opt(2021, 3, 14)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(conv.to_utc(gap), None);
    }

    #[test]
    fn zone_list_contains_common_zones() {
        let names: Vec<_> = zone_names().collect();
        assert!(names.contains(&"America/Sao_Paulo"));
        assert!(names.contains(&"UTC"));
    }
}

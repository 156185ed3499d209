//! FHIR date and instant values
//!
//! FHIR carries two temporal shapes in JSON strings: a calendar date
//! (`YYYY-MM-DD`, no time of day or zone) and a full timestamp (RFC 3339 with
//! a zone offset). Which grammar applies is fixed by the field's declared kind;
//! the string itself is never sniffed.

use super::error::{Error, Result};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Years a FHIR date can carry (four digits, no year zero)
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

/// `YYYY-MM-DD` with every position fixed. chrono alone tolerates padding
/// spaces and signed years.
fn is_date_shape(bytes: &[u8]) -> bool {
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Declared kind of a temporal field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    /// Calendar date, `YYYY-MM-DD`
    Date,
    /// Full timestamp with zone offset
    Instant,
}

impl fmt::Display for TemporalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporalKind::Date => f.write_str("date"),
            TemporalKind::Instant => f.write_str("instant"),
        }
    }
}

/// A calendar date without time of day or zone (e.g. `birthDate`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FhirDate(NaiveDate);

impl FhirDate {
    /// None for invalid calendar dates and years outside 0001-9999
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        if !YEAR_RANGE.contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse using the calendar-date grammar only.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidTemporalValue {
            kind: TemporalKind::Date,
            value: input.to_string(),
        };
        if !is_date_shape(input.as_bytes()) {
            return Err(invalid());
        }
        let date = NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|_| invalid())?;
        Self::try_from(date).map_err(|_| invalid())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The date as a UTC timestamp at midnight.
    pub fn to_utc_midnight(&self) -> DateTime<Utc> {
        self.0.and_time(NaiveTime::default()).and_utc()
    }
}

impl TryFrom<NaiveDate> for FhirDate {
    type Error = Error;

    fn try_from(date: NaiveDate) -> Result<Self> {
        if YEAR_RANGE.contains(&date.year()) {
            Ok(Self(date))
        } else {
            Err(Error::InvalidTemporalValue {
                kind: TemporalKind::Date,
                value: date.to_string(),
            })
        }
    }
}

impl FromStr for FhirDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FhirDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

/// A point in time with zone offset (e.g. `meta.lastUpdated`, `deceasedDateTime`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FhirInstant(DateTime<FixedOffset>);

impl FhirInstant {
    /// Parse using the RFC 3339 grammar only, with an uppercase `T` between
    /// date and time and an uppercase `Z` for UTC.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidTemporalValue {
            kind: TemporalKind::Instant,
            value: input.to_string(),
        };
        let bytes = input.as_bytes();
        if bytes.len() < 11
            || !is_date_shape(&bytes[..10])
            || bytes[10] != b'T'
            || bytes.contains(&b'z')
        {
            return Err(invalid());
        }
        DateTime::parse_from_rfc3339(input)
            .map(Self)
            .map_err(|_| invalid())
    }

    pub fn now() -> Self {
        Utc::now().into()
    }

    pub fn datetime(&self) -> DateTime<FixedOffset> {
        self.0
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        self.0.with_timezone(&Utc)
    }
}

impl From<DateTime<FixedOffset>> for FhirInstant {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self(value)
    }
}

impl From<DateTime<Utc>> for FhirInstant {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.fixed_offset())
    }
}

impl FromStr for FhirInstant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FhirInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

/// A temporal value tagged with the grammar it was parsed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Temporal {
    Date(FhirDate),
    Instant(FhirInstant),
}

impl Temporal {
    pub fn parse(kind: TemporalKind, input: &str) -> Result<Self> {
        match kind {
            TemporalKind::Date => FhirDate::parse(input).map(Temporal::Date),
            TemporalKind::Instant => FhirInstant::parse(input).map(Temporal::Instant),
        }
    }

    pub fn kind(&self) -> TemporalKind {
        match self {
            Temporal::Date(_) => TemporalKind::Date,
            Temporal::Instant(_) => TemporalKind::Instant,
        }
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Temporal::Date(date) => date.to_utc_midnight(),
            Temporal::Instant(instant) => instant.to_utc(),
        }
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temporal::Date(date) => fmt::Display::fmt(date, f),
            Temporal::Instant(instant) => fmt::Display::fmt(instant, f),
        }
    }
}

struct DateVisitor;

impl<'de> Visitor<'de> for DateVisitor {
    type Value = FhirDate;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a date string (YYYY-MM-DD)")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<FhirDate, E> {
        FhirDate::parse(v).map_err(E::custom)
    }
}

struct InstantVisitor;

impl<'de> Visitor<'de> for InstantVisitor {
    type Value = FhirInstant;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an RFC 3339 timestamp string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<FhirInstant, E> {
        FhirInstant::parse(v).map_err(E::custom)
    }
}

impl Serialize for FhirDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FhirDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_str(DateVisitor)
    }
}

impl Serialize for FhirInstant {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FhirInstant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_str(InstantVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_date() {
        let date = FhirDate::parse("2000-01-01").unwrap();
        assert_eq!(date.date().year(), 2000);
        assert_eq!(date.to_string(), "2000-01-01");

        let midnight = date.to_utc_midnight();
        assert_eq!(midnight.hour(), 0);
        assert_eq!(midnight.minute(), 0);
        assert_eq!(midnight.to_rfc3339(), "2000-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_date_rejects_other_grammars() {
        for input in [
            "not-a-date",
            "2000-1-1",
            "2000-01-01T00:00:00Z",
            "2000-02-30",
            "",
            "2000-01- 1",
            " 2000-1-01",
            "+200-01-01",
            "0000-01-01",
            "2000/01/01",
        ] {
            let err = FhirDate::parse(input).unwrap_err();
            assert!(
                matches!(err, Error::InvalidTemporalValue { kind: TemporalKind::Date, .. }),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_date_year_range() {
        assert!(FhirDate::from_ymd(1, 1, 1).is_some());
        assert!(FhirDate::from_ymd(9999, 12, 31).is_some());
        assert!(FhirDate::from_ymd(10000, 1, 1).is_none());
        assert!(FhirDate::from_ymd(0, 1, 1).is_none());
        assert!(FhirDate::from_ymd(-1, 1, 1).is_none());

        let far = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap();
        assert!(matches!(
            FhirDate::try_from(far),
            Err(Error::InvalidTemporalValue { kind: TemporalKind::Date, .. })
        ));
        let near = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(FhirDate::try_from(near).unwrap().to_string(), "2024-02-29");
    }

    #[test]
    fn test_instant_rejects_loose_separators() {
        for input in [
            "2023-01-01 12:00:00Z",
            "2023-01-01t12:00:00Z",
            "2023-01-01T12:00:00z",
            "+023-01-01T12:00:00Z",
            "2023-01-01T",
        ] {
            let err = FhirInstant::parse(input).unwrap_err();
            assert!(
                matches!(err, Error::InvalidTemporalValue { kind: TemporalKind::Instant, .. }),
                "{input:?} should be rejected"
            );
        }
        assert!(FhirInstant::parse("2023-01-01T12:00:00Z").is_ok());
    }

    #[test]
    fn test_instant_keeps_offset() {
        let instant = FhirInstant::parse("2023-01-01T12:00:00+02:00").unwrap();
        assert_eq!(instant.to_string(), "2023-01-01T12:00:00+02:00");
        assert_eq!(instant.to_utc().hour(), 10);
    }

    #[test]
    fn test_instant_utc_uses_z() {
        let instant = FhirInstant::parse("2023-01-01T12:00:00+00:00").unwrap();
        assert_eq!(instant.to_string(), "2023-01-01T12:00:00Z");

        let fractional = FhirInstant::parse("2023-01-01T12:00:00.250Z").unwrap();
        assert_eq!(fractional.to_string(), "2023-01-01T12:00:00.250Z");
    }

    #[test]
    fn test_instant_requires_zone() {
        let err = FhirInstant::parse("2023-01-01T12:00:00").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTemporalValue { kind: TemporalKind::Instant, .. }
        ));
        assert!(FhirInstant::parse("2023-01-01").is_err());
    }

    #[test]
    fn test_temporal_dispatches_on_kind() {
        let date = Temporal::parse(TemporalKind::Date, "1980-07-15").unwrap();
        assert_eq!(date.kind(), TemporalKind::Date);

        let instant = Temporal::parse(TemporalKind::Instant, "1980-07-15T08:30:00Z").unwrap();
        assert_eq!(instant.kind(), TemporalKind::Instant);

        assert!(Temporal::parse(TemporalKind::Instant, "1980-07-15").is_err());
    }

    #[test]
    fn test_serde_strings() {
        let date: FhirDate = serde_json::from_str("\"1980-07-15\"").unwrap();
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"1980-07-15\"");

        let err = serde_json::from_str::<FhirDate>("\"15/07/1980\"").unwrap_err();
        assert!(err.to_string().contains("15/07/1980"));

        let err = serde_json::from_str::<FhirDate>("19800715").unwrap_err();
        assert!(err.is_data());
    }
}

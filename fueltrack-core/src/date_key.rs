//! Canonical calendar-day keys.
//!
//! Every date that is used as a map key, a document id or a serialized
//! `date` field goes through [`DateKey`], which always renders as
//! `YYYY-MM-DD`. Older clients stored `Mon Mar 04 2024` style strings, so
//! parsing also accepts that form.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

const CANONICAL_FORMAT: &str = "%Y-%m-%d";
const LEGACY_FORMAT: &str = "%a %b %d %Y";

/// A single calendar day, independent of any timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Builds a key from year/month/day, rejecting impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, ValidationError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidDate(format!("{year}-{month}-{day}")))
    }

    /// Today according to the local clock.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn succ(&self) -> Self {
        Self(self.0 + Duration::days(1))
    }

    pub fn pred(&self) -> Self {
        Self(self.0 - Duration::days(1))
    }

    /// Parses the canonical form, an ISO timestamp, or the legacy
    /// `toDateString` form.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if let Ok(date) = NaiveDate::parse_from_str(trimmed, CANONICAL_FORMAT) {
            return Ok(Self(date));
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self(ts.date_naive()));
        }
        if let Some((day, _)) = trimmed.split_once('T') {
            if let Ok(date) = NaiveDate::parse_from_str(day, CANONICAL_FORMAT) {
                return Ok(Self(date));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, LEGACY_FORMAT) {
            return Ok(Self(date));
        }

        Err(ValidationError::InvalidDate(s.to_string()))
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Monday on or before `date`. A Sunday belongs to the week that started six
/// days earlier.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// Number of days in the given month; 0 for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return 0;
    };
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.map(|n| (n - first).num_days() as u32).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_display_is_canonical() {
        let key = DateKey::new(ymd(2024, 3, 4));
        assert_eq!(key.to_string(), "2024-03-04");
    }

    #[test]
    fn test_parse_accepted_forms() {
        let expected = DateKey::new(ymd(2024, 3, 4));
        assert_eq!(DateKey::parse("2024-03-04").unwrap(), expected);
        assert_eq!(DateKey::parse("Mon Mar 04 2024").unwrap(), expected);
        assert_eq!(DateKey::parse("2024-03-04T18:30:00Z").unwrap(), expected);
        assert_eq!(DateKey::parse("2024-03-04T18:30:00.000").unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DateKey::parse("").is_err());
        assert!(DateKey::parse("04/03/2024").is_err());
        assert!(DateKey::parse("2024-02-30").is_err());
    }

    #[test]
    fn test_from_ymd_invalid() {
        assert!(DateKey::from_ymd(2023, 2, 29).is_err());
        assert!(DateKey::from_ymd(2024, 2, 29).is_ok());
    }

    #[test]
    fn test_json_roundtrip_uses_canonical_string() {
        let key = DateKey::new(ymd(2025, 1, 15));
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2025-01-15\"");

        let legacy: DateKey = serde_json::from_str("\"Wed Jan 15 2025\"").unwrap();
        assert_eq!(legacy, key);
    }

    #[test]
    fn test_week_start_uses_monday() {
        // 2024-03-04 is a Monday, 2024-03-10 the following Sunday
        assert_eq!(week_start(ymd(2024, 3, 4)), ymd(2024, 3, 4));
        assert_eq!(week_start(ymd(2024, 3, 7)), ymd(2024, 3, 4));
        assert_eq!(week_start(ymd(2024, 3, 10)), ymd(2024, 3, 4));
        assert_eq!(week_start(ymd(2024, 3, 11)), ymd(2024, 3, 11));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
        assert_eq!(days_in_month(2024, 13), 0);
    }

    #[test]
    fn test_month_and_year_start() {
        assert_eq!(month_start(ymd(2024, 4, 17)), ymd(2024, 4, 1));
        assert_eq!(year_start(ymd(2024, 4, 17)), ymd(2024, 1, 1));
    }

    #[test]
    fn test_succ_pred() {
        let key = DateKey::new(ymd(2024, 2, 28));
        assert_eq!(key.succ().to_string(), "2024-02-29");
        assert_eq!(key.pred().to_string(), "2024-02-27");
    }
}

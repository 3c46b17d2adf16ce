use std::fmt;

use chrono::{Datelike, NaiveDate};
use derive_getters::Getters;
use serde::Serialize;

use crate::errors::{Result, TrackerError};

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

/// Inclusive date range a report covers.
#[derive(Clone, Copy, Debug, Eq, Getters, PartialEq, Serialize)]
pub struct Period {
    start: NaiveDate,
    end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(TrackerError::InvalidPeriod(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn year(year: i32) -> Result<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(TrackerError::InvalidPeriod(format!(
                "year must be between {} and {}, got {}",
                MIN_YEAR, MAX_YEAR, year
            )));
        }
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| TrackerError::InvalidPeriod(format!("invalid year {}", year)))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| TrackerError::InvalidPeriod(format!("invalid year {}", year)))?;
        Self::new(start, end)
    }

    pub fn year_to_date(today: NaiveDate) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(today.year(), 1, 1)
            .ok_or_else(|| TrackerError::InvalidPeriod(format!("invalid date {}", today)))?;
        Self::new(start, today)
    }

    /// Accepts `ytd`, a calendar year such as `2024`, or `2024-01-01..2024-06-30`.
    pub fn parse(input: &str, today: NaiveDate) -> Result<Self> {
        let input = input.trim();
        if input.eq_ignore_ascii_case("ytd") {
            return Self::year_to_date(today);
        }

        if let Some((start, end)) = input.split_once("..") {
            let start = parse_iso_date(start)?;
            let end = parse_iso_date(end)?;
            return Self::new(start, end);
        }

        let year = input.parse::<i32>().map_err(|_| {
            TrackerError::InvalidPeriod(format!(
                "'{}' is not a year, 'ytd' or a start..end range",
                input
            ))
        })?;
        Self::year(year)
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.start <= *date && *date <= self.end
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

fn parse_iso_date(field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(field.trim(), "%Y-%m-%d")
        .map_err(|_| TrackerError::InvalidPeriod(format!("'{}' is not a YYYY-MM-DD date", field)))
}

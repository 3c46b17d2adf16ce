use std::{str::FromStr, sync::LazyLock};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use rust_decimal::Decimal;

use crate::errors::{Result, TrackerError};

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%Y.%m.%d",
    "%m-%d-%Y",
];

// Offsets only follow a time of day; bare dates like 01-15-2024 keep their tail.
static TIMEZONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+[T ]\d{1,2}:\d{2}(?::\d{2}(?:\.\d+)?)?)\s*(?:[+-]\d{2}:?\d{2}|Z)$")
        .expect("timezone pattern is valid")
});

/// Parses a broker timestamp, dropping any trailing UTC offset so the wall
/// clock time of the export is kept. Bare dates land on midnight. Slash dates
/// are read month first.
pub fn parse_timestamp(field: &str, row: usize, field_name: &str) -> Result<NaiveDateTime> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::malformed(row, field_name, "is missing"));
    }

    let cleaned = TIMEZONE.replace(trimmed, "$1");

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(&cleaned, format) {
            return Ok(datetime);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }

    Err(TrackerError::malformed(
        row,
        field_name,
        format!("'{}' is not a recognised date", field),
    ))
}

pub fn parse_date(field: &str, row: usize, field_name: &str) -> Result<NaiveDate> {
    parse_timestamp(field, row, field_name).map(|timestamp| timestamp.date())
}

/// Strips quotes, currency symbols, thousands separators and accounting
/// parentheses. Returns `None` for blank, `--` and `none` cells.
pub fn clean_numeric(field: &str) -> Option<String> {
    let mut cleaned = field.trim().trim_matches(|c: char| c == '"' || c == '\'').trim();
    if cleaned.is_empty() || cleaned == "--" || cleaned.eq_ignore_ascii_case("none") {
        return None;
    }

    let negative = cleaned.starts_with('(') && cleaned.ends_with(')');
    if negative {
        cleaned = &cleaned[1..cleaned.len() - 1];
    }

    let digits: String = cleaned
        .chars()
        .filter(|&c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if digits.is_empty() {
        return None;
    }

    if negative {
        Some(format!("-{}", digits.trim_start_matches('-')))
    } else {
        Some(digits)
    }
}

/// Optional decimal cell: blank cells are `None`, garbage is an error.
pub fn parse_decimal(field: Option<&str>, row: usize, field_name: &str) -> Result<Option<Decimal>> {
    let Some(cleaned) = field.and_then(clean_numeric) else {
        return Ok(None);
    };
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map(Some)
        .map_err(|_| {
            TrackerError::malformed(
                row,
                field_name,
                format!("'{}' is not a number", field.unwrap_or_default()),
            )
        })
}

/// Like [`parse_decimal`] but the cell must be present.
pub fn require_decimal(field: Option<&str>, row: usize, field_name: &str) -> Result<Decimal> {
    parse_decimal(field, row, field_name)?
        .ok_or_else(|| TrackerError::malformed(row, field_name, "is missing"))
}

pub fn non_empty(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|value| !value.is_empty())
}

//! Runtime configuration, resolved once at startup and passed down explicitly.

use std::{env, sync::LazyLock};

use derive_getters::Getters;
use regex::Regex;

use crate::{
    app::converter::ConverterConfig,
    errors::{Result, TrackerError},
};

pub const DATABASE_URL_VAR: &str = "PTT_DATABASE_URL";
pub const REPORTING_CURRENCY_VAR: &str = "PTT_REPORTING_CURRENCY";
pub const LONG_TERM_DAYS_VAR: &str = "PTT_LONG_TERM_DAYS";
pub const DECIMAL_PLACES_VAR: &str = "PTT_DECIMAL_PLACES";
pub const MAX_TAX_YEARS_VAR: &str = "PTT_MAX_TAX_YEARS";

const MAX_DECIMAL_PLACES: u32 = 8;

static CURRENCY_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").expect("currency pattern is valid"));

#[derive(Clone, Debug, Eq, Getters, PartialEq)]
pub struct Config {
    database_url: String,
    reporting_currency: String,
    long_term_days: i64,
    decimal_places: u32,
    max_tax_years: usize,
}

/// What the lot matcher and the aggregator need to know.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportingConfig {
    pub reporting_currency: String,
    pub long_term_days: i64,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            reporting_currency: String::from("EUR"),
            long_term_days: 365,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::from("portfolio.db"),
            reporting_currency: String::from("EUR"),
            long_term_days: 365,
            decimal_places: 2,
            max_tax_years: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from defaults overridden by whatever `lookup` returns.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(DATABASE_URL_VAR) {
            config.database_url = url;
        }
        if let Some(currency) = lookup(REPORTING_CURRENCY_VAR) {
            config.reporting_currency = currency.trim().to_uppercase();
        }
        if let Some(days) = lookup(LONG_TERM_DAYS_VAR) {
            config.long_term_days = parse_setting(LONG_TERM_DAYS_VAR, &days)?;
        }
        if let Some(places) = lookup(DECIMAL_PLACES_VAR) {
            config.decimal_places = parse_setting(DECIMAL_PLACES_VAR, &places)?;
        }
        if let Some(years) = lookup(MAX_TAX_YEARS_VAR) {
            config.max_tax_years = parse_setting(MAX_TAX_YEARS_VAR, &years)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_database_url(mut self, database_url: &str) -> Self {
        self.database_url = database_url.to_string();
        self
    }

    pub fn with_reporting_currency(mut self, currency: &str) -> Result<Self> {
        self.reporting_currency = currency.trim().to_uppercase();
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push(String::from("database url cannot be empty"));
        }
        if !CURRENCY_CODE.is_match(&self.reporting_currency) {
            errors.push(format!(
                "reporting currency '{}' is not a three letter code",
                self.reporting_currency
            ));
        }
        if self.long_term_days <= 0 {
            errors.push(String::from("long term threshold must be positive"));
        }
        if self.decimal_places > MAX_DECIMAL_PLACES {
            errors.push(format!(
                "decimal places must be at most {}",
                MAX_DECIMAL_PLACES
            ));
        }
        if self.max_tax_years == 0 {
            errors.push(String::from("max tax years must be positive"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TrackerError::Config(errors.join("; ")))
        }
    }

    pub fn reporting(&self) -> ReportingConfig {
        ReportingConfig {
            reporting_currency: self.reporting_currency.clone(),
            long_term_days: self.long_term_days,
        }
    }

    pub fn converter(&self) -> ConverterConfig {
        ConverterConfig {
            decimal_places: self.decimal_places,
        }
    }
}

fn parse_setting<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| TrackerError::Config(format!("{} has invalid value '{}'", key, value)))
}

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::{
    errors::{Result, TrackerError},
    models::{CurrencyPair, ExchangeRate},
};

/// Read access to historical exchange rates.
pub trait RateStore {
    /// Rate stored for exactly `date`.
    fn get_rate(&self, pair: &CurrencyPair, date: NaiveDate) -> Option<Decimal>;

    /// Most recent rate stored on or before `date`, with the day it was observed.
    fn latest_on_or_before(
        &self,
        pair: &CurrencyPair,
        date: NaiveDate,
    ) -> Option<(NaiveDate, Decimal)>;
}

/// In-memory daily rate table, one ordered series per currency pair.
#[derive(Clone, Debug, Default)]
pub struct RateTable {
    rates: HashMap<CurrencyPair, BTreeMap<NaiveDate, Decimal>>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rates(rates: impl IntoIterator<Item = ExchangeRate>) -> Self {
        let mut table = Self::new();
        for rate in rates {
            table.insert(rate);
        }
        table
    }

    /// Appends a rate. The first rate stored for a pair and day wins.
    pub fn insert(&mut self, rate: ExchangeRate) {
        if rate.pair().base() == rate.pair().quote() || *rate.rate() <= Decimal::ZERO {
            return;
        }
        self.rates
            .entry(rate.pair().clone())
            .or_default()
            .entry(*rate.date())
            .or_insert(*rate.rate());
    }

    pub fn len(&self) -> usize {
        self.rates.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RateStore for RateTable {
    fn get_rate(&self, pair: &CurrencyPair, date: NaiveDate) -> Option<Decimal> {
        self.rates.get(pair)?.get(&date).copied()
    }

    fn latest_on_or_before(
        &self,
        pair: &CurrencyPair,
        date: NaiveDate,
    ) -> Option<(NaiveDate, Decimal)> {
        self.rates
            .get(pair)?
            .range(..=date)
            .next_back()
            .map(|(day, rate)| (*day, *rate))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConverterConfig {
    pub decimal_places: u32,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self { decimal_places: 2 }
    }
}

/// A rate as resolved for one conversion.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ResolvedRate {
    pub rate: Decimal,
    pub observed_on: NaiveDate,
    pub inverted: bool,
}

/// Converts native amounts into another currency with the rate in force on a
/// given day. Missing days fall back to the latest earlier observation and
/// never to a later one.
#[derive(Clone, Debug)]
pub struct CurrencyConverter<S> {
    store: S,
    config: ConverterConfig,
}

impl<S: RateStore> CurrencyConverter<S> {
    pub fn new(store: S, config: ConverterConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Resolves the rate for `currency -> target` on `date`. A direct
    /// observation is preferred; the inverse pair is used only when no direct
    /// rate exists on or before the date.
    pub fn rate(&self, currency: &str, target: &str, date: NaiveDate) -> Result<ResolvedRate> {
        let pair = CurrencyPair::new(currency, target);
        if pair.base() == pair.quote() {
            return Ok(ResolvedRate {
                rate: Decimal::ONE,
                observed_on: date,
                inverted: false,
            });
        }

        if let Some((observed_on, rate)) = self.store.latest_on_or_before(&pair, date) {
            return Ok(ResolvedRate {
                rate,
                observed_on,
                inverted: false,
            });
        }

        match self.store.latest_on_or_before(&pair.inverse(), date) {
            Some((observed_on, rate)) if !rate.is_zero() => Ok(ResolvedRate {
                rate: Decimal::ONE / rate,
                observed_on,
                inverted: true,
            }),
            _ => Err(TrackerError::RateUnavailable { pair, date }),
        }
    }

    pub fn convert(
        &self,
        amount: Decimal,
        currency: &str,
        date: NaiveDate,
        target: &str,
    ) -> Result<Decimal> {
        if currency.trim().eq_ignore_ascii_case(target.trim()) {
            return Ok(amount);
        }
        let resolved = self.rate(currency, target, date)?;
        Ok(self.round(amount * resolved.rate))
    }

    /// Rounds to the currency subunit, half to even.
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(
            self.config.decimal_places,
            RoundingStrategy::MidpointNearestEven,
        )
    }
}

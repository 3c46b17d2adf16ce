use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{CurrencyPair, ExchangeRate};

/// Response of a Frankfurter time series request, one map of quote
/// currencies per business day.
#[derive(Debug, Deserialize, Getters, new)]
pub struct FrankTimeSeriesDto {
    amount: Decimal,
    base: String,
    start_date: String,
    end_date: String,
    rates: BTreeMap<String, HashMap<String, Decimal>>,
}

impl FrankTimeSeriesDto {
    /// Daily `base/quote` rates, oldest first. Days that cannot be parsed or
    /// lack the quote currency are left out.
    pub fn to_exchange_rates(&self, quote: &str) -> Vec<ExchangeRate> {
        let pair = CurrencyPair::new(&self.base, quote);
        self.rates
            .iter()
            .filter_map(|(day, quotes)| {
                let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
                let rate = quotes.get(pair.quote())?;
                if self.amount.is_zero() || *rate <= Decimal::ZERO {
                    return None;
                }
                Some(ExchangeRate::new(pair.clone(), date, *rate / self.amount))
            })
            .collect()
    }
}

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::Price;

/// Source of instrument prices for valuing open lots.
pub trait QuoteProvider {
    fn get_price(&self, instrument: &str, as_of: NaiveDate) -> Option<Decimal>;
}

/// Stored prices, answering with the latest price on or before the date.
#[derive(Clone, Debug, Default)]
pub struct PriceTable {
    prices: HashMap<String, BTreeMap<NaiveDate, Decimal>>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_prices(prices: impl IntoIterator<Item = Price>) -> Self {
        let mut table = Self::new();
        for price in prices {
            table.insert(price);
        }
        table
    }

    /// Later inserts for the same symbol and day replace earlier ones.
    pub fn insert(&mut self, price: Price) {
        self.prices
            .entry(price.symbol().trim().to_uppercase())
            .or_default()
            .insert(*price.date(), *price.price());
    }

    pub fn len(&self) -> usize {
        self.prices.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QuoteProvider for PriceTable {
    fn get_price(&self, instrument: &str, as_of: NaiveDate) -> Option<Decimal> {
        self.prices
            .get(&instrument.trim().to_uppercase())?
            .range(..=as_of)
            .next_back()
            .map(|(_, price)| *price)
    }
}

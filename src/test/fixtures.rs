use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use crate::{
    app::converter::{ConverterConfig, CurrencyConverter, RateTable},
    config::ReportingConfig,
    models::{AssetCategory, CurrencyPair, ExchangeRate, Transaction, TransactionType},
};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn transaction(
    id: i64,
    instrument: &str,
    transaction_type: TransactionType,
    quantity: Decimal,
    price: Decimal,
    trade_date: NaiveDate,
) -> Transaction {
    traded_in(id, instrument, transaction_type, quantity, price, trade_date, "USD")
}

pub fn traded_in(
    id: i64,
    instrument: &str,
    transaction_type: TransactionType,
    quantity: Decimal,
    price: Decimal,
    trade_date: NaiveDate,
    currency: &str,
) -> Transaction {
    with_fees(
        id,
        instrument,
        transaction_type,
        quantity,
        price,
        trade_date,
        currency,
        Decimal::ZERO,
    )
}

#[allow(clippy::too_many_arguments)]
pub fn with_fees(
    id: i64,
    instrument: &str,
    transaction_type: TransactionType,
    quantity: Decimal,
    price: Decimal,
    trade_date: NaiveDate,
    currency: &str,
    fees: Decimal,
) -> Transaction {
    Transaction::new(
        id,
        instrument.to_string(),
        transaction_type,
        quantity,
        price,
        currency.to_string(),
        trade_date,
        NaiveTime::MIN,
        trade_date,
        fees,
        AssetCategory::Stock,
        String::new(),
    )
}

pub fn intraday(
    id: i64,
    instrument: &str,
    transaction_type: TransactionType,
    quantity: Decimal,
    price: Decimal,
    trade_date: NaiveDate,
    trade_time: NaiveTime,
) -> Transaction {
    Transaction::new(
        id,
        instrument.to_string(),
        transaction_type,
        quantity,
        price,
        String::from("USD"),
        trade_date,
        trade_time,
        trade_date,
        Decimal::ZERO,
        AssetCategory::Stock,
        String::new(),
    )
}

pub fn rate(base: &str, quote: &str, on: NaiveDate, value: Decimal) -> ExchangeRate {
    ExchangeRate::new(CurrencyPair::new(base, quote), on, value)
}

pub fn converter(rates: Vec<ExchangeRate>) -> CurrencyConverter<RateTable> {
    CurrencyConverter::new(RateTable::from_rates(rates), ConverterConfig::default())
}

pub fn reporting(currency: &str) -> ReportingConfig {
    ReportingConfig {
        reporting_currency: currency.to_string(),
        long_term_days: 365,
    }
}

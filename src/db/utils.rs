use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sqlx::{Row, sqlite::SqliteRow};

use crate::models::{
    AssetCategory, CurrencyPair, ExchangeRate, Price, Transaction, TransactionType,
};

/// Decimals are stored as normalized text so no value passes through `f64`.
pub fn decimal_to_text(value: &Decimal) -> String {
    value.normalize().to_string()
}

pub fn parse_i64_from_row(row: &SqliteRow, column: &str) -> Result<i64> {
    row.try_get::<i64, _>(column)
        .with_context(|| format!("Failed to parse i64 from column '{}'", column))
}

pub fn parse_string_from_row(row: &SqliteRow, column: &str) -> Result<String> {
    row.try_get::<String, _>(column)
        .with_context(|| format!("Failed to parse String from column '{}'", column))
}

pub fn parse_decimal_from_row(row: &SqliteRow, column: &str) -> Result<Decimal> {
    let value = parse_string_from_row(row, column)?;
    Decimal::from_str(&value)
        .with_context(|| format!("Failed to parse Decimal '{}' from column '{}'", value, column))
}

pub fn parse_date_from_row(row: &SqliteRow, column: &str) -> Result<NaiveDate> {
    row.try_get::<NaiveDate, _>(column)
        .with_context(|| format!("Failed to parse date from column '{}'", column))
}

pub fn parse_time_from_row(row: &SqliteRow, column: &str) -> Result<NaiveTime> {
    row.try_get::<NaiveTime, _>(column)
        .with_context(|| format!("Failed to parse time from column '{}'", column))
}

pub fn parse_transaction_type_from_row(row: &SqliteRow, column: &str) -> Result<TransactionType> {
    let type_str = parse_string_from_row(row, column)?;
    TransactionType::parse_str(&type_str)
        .with_context(|| format!("Failed to parse TransactionType from column '{}'", column))
}

pub fn parse_asset_category_from_row(row: &SqliteRow, column: &str) -> Result<AssetCategory> {
    let category_str = parse_string_from_row(row, column)?;
    AssetCategory::parse_str(&category_str)
        .with_context(|| format!("Failed to parse AssetCategory from column '{}'", column))
}

pub fn parse_transaction(row: SqliteRow) -> Result<Transaction> {
    let id = parse_i64_from_row(&row, "id")?;
    let instrument = parse_string_from_row(&row, "instrument")?;
    let transaction_type = parse_transaction_type_from_row(&row, "transaction_type")?;
    let quantity = parse_decimal_from_row(&row, "quantity")?;
    let price = parse_decimal_from_row(&row, "price")?;
    let currency = parse_string_from_row(&row, "currency")?;
    let trade_date = parse_date_from_row(&row, "trade_date")?;
    let trade_time = parse_time_from_row(&row, "trade_time")?;
    let settlement_date = parse_date_from_row(&row, "settlement_date")?;
    let fees = parse_decimal_from_row(&row, "fees")?;
    let asset_category = parse_asset_category_from_row(&row, "asset_category")?;
    let description = parse_string_from_row(&row, "description")?;

    Ok(Transaction::new(
        id,
        instrument,
        transaction_type,
        quantity,
        price,
        currency,
        trade_date,
        trade_time,
        settlement_date,
        fees,
        asset_category,
        description,
    ))
}

pub fn parse_exchange_rate(row: SqliteRow) -> Result<ExchangeRate> {
    let base = parse_string_from_row(&row, "base_currency")?;
    let quote = parse_string_from_row(&row, "quote_currency")?;
    let date = parse_date_from_row(&row, "rate_date")?;
    let rate = parse_decimal_from_row(&row, "rate")?;

    Ok(ExchangeRate::new(CurrencyPair::new(&base, &quote), date, rate))
}

pub fn parse_price(row: SqliteRow) -> Result<Price> {
    let symbol = parse_string_from_row(&row, "symbol")?;
    let date = parse_date_from_row(&row, "price_date")?;
    let price = parse_decimal_from_row(&row, "price")?;

    Ok(Price::new(symbol, date, price))
}

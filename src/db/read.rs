use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sqlx::{Pool, Row, Sqlite};

use crate::{
    db::utils::{parse_decimal_from_row, parse_exchange_rate, parse_price, parse_transaction},
    models::{CurrencyPair, ExchangeRate, Period, Price, Transaction},
};

/// Transactions ordered by trade date, time of day, then id. Both filters are optional.
pub async fn list_transactions(
    connection: &Pool<Sqlite>,
    instrument: Option<&str>,
    period: Option<&Period>,
) -> Result<Vec<Transaction>> {
    let instrument = instrument.map(|instrument| instrument.trim().to_uppercase());
    let start = period.map(|period| *period.start());
    let end = period.map(|period| *period.end());

    let rows = sqlx::query(
        r#"
        SELECT id, instrument, transaction_type, quantity, price, currency,
               trade_date, trade_time, settlement_date, fees, asset_category, description
        FROM transactions
        WHERE (?1 IS NULL OR instrument = ?1)
          AND (?2 IS NULL OR trade_date >= ?2)
          AND (?3 IS NULL OR trade_date <= ?3)
        ORDER BY trade_date ASC, trade_time ASC, id ASC
        "#,
    )
    .bind(instrument)
    .bind(start)
    .bind(end)
    .fetch_all(connection)
    .await
    .context("Failed to load transactions")?;

    rows.into_iter().map(parse_transaction).collect()
}

pub async fn list_rates(connection: &Pool<Sqlite>) -> Result<Vec<ExchangeRate>> {
    let rows = sqlx::query(
        r#"
        SELECT base_currency, quote_currency, rate_date, rate
        FROM exchange_rates
        ORDER BY base_currency, quote_currency, rate_date
        "#,
    )
    .fetch_all(connection)
    .await
    .context("Failed to load exchange rates")?;

    rows.into_iter().map(parse_exchange_rate).collect()
}

/// The rate stored for exactly `date`, if any.
pub async fn get_rate(
    connection: &Pool<Sqlite>,
    pair: &CurrencyPair,
    date: NaiveDate,
) -> Result<Option<Decimal>> {
    let row = sqlx::query(
        r#"
        SELECT rate FROM exchange_rates
        WHERE base_currency = ? AND quote_currency = ? AND rate_date = ?
        "#,
    )
    .bind(pair.base())
    .bind(pair.quote())
    .bind(date)
    .fetch_optional(connection)
    .await
    .with_context(|| format!("Failed to load {} rate for {}", pair, date))?;

    row.map(|row| parse_decimal_from_row(&row, "rate"))
        .transpose()
}

pub async fn list_prices(connection: &Pool<Sqlite>) -> Result<Vec<Price>> {
    let rows = sqlx::query(
        r#"
        SELECT symbol, price_date, price
        FROM prices
        ORDER BY symbol, price_date
        "#,
    )
    .fetch_all(connection)
    .await
    .context("Failed to load prices")?;

    rows.into_iter().map(parse_price).collect()
}

/// Years offered for tax reports: the current year plus every earlier year
/// with transactions, at most `max_years` back, newest first.
pub async fn list_tax_years(
    connection: &Pool<Sqlite>,
    max_years: usize,
    today: NaiveDate,
) -> Result<Vec<i32>> {
    let rows = sqlx::query(
        r#"
        SELECT DISTINCT substr(trade_date, 1, 4) AS year
        FROM transactions
        ORDER BY year DESC
        "#,
    )
    .fetch_all(connection)
    .await
    .context("Failed to load transaction years")?;

    let transaction_years: Vec<i32> = rows
        .iter()
        .filter_map(|row| row.try_get::<String, _>("year").ok())
        .filter_map(|year| year.parse::<i32>().ok())
        .collect();

    let current_year = today.year();
    let span = i32::try_from(max_years).unwrap_or(i32::MAX);
    let earliest = current_year.saturating_sub(span.saturating_sub(1));

    Ok((earliest..=current_year)
        .rev()
        .filter(|year| *year == current_year || transaction_years.contains(year))
        .collect())
}

use anyhow::Result;
use sqlx::{Pool, Sqlite};

use crate::{
    db::utils::decimal_to_text,
    models::{ExchangeRate, NewTransaction, Price},
};

/// Inserts a transaction unless an identical one is already stored. Returns
/// the new id, or `None` for a duplicate.
pub async fn insert_transaction(
    transaction: &NewTransaction,
    tx: &mut sqlx::Transaction<'_, Sqlite>,
) -> Result<Option<i64>> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO transactions
        (
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
            description
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(transaction.instrument())
    .bind(transaction.transaction_type().to_str())
    .bind(decimal_to_text(transaction.quantity()))
    .bind(decimal_to_text(transaction.price()))
    .bind(transaction.currency())
    .bind(transaction.trade_date())
    .bind(transaction.trade_time())
    .bind(transaction.settlement_date())
    .bind(decimal_to_text(transaction.fees()))
    .bind(transaction.asset_category().to_str())
    .bind(transaction.description())
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(Some(result.last_insert_rowid()))
}

/// Returns whether the rate was new.
pub async fn insert_rate(rate: &ExchangeRate, tx: &mut sqlx::Transaction<'_, Sqlite>) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO exchange_rates
        (base_currency, quote_currency, rate_date, rate)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(rate.pair().base())
    .bind(rate.pair().quote())
    .bind(rate.date())
    .bind(decimal_to_text(rate.rate()))
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Inserts rates in one transaction and returns how many were new.
pub async fn insert_rates(connection: &Pool<Sqlite>, rates: &[ExchangeRate]) -> Result<usize> {
    let mut tx = connection.begin().await?;
    let mut inserted = 0;
    for rate in rates {
        if insert_rate(rate, &mut tx).await? {
            inserted += 1;
        }
    }
    tx.commit().await?;
    Ok(inserted)
}

/// Stores a price, replacing any earlier price for the same symbol and day.
pub async fn insert_price(price: &Price, tx: &mut sqlx::Transaction<'_, Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO prices (symbol, price_date, price)
        VALUES (?, ?, ?)
        ON CONFLICT (symbol, price_date) DO UPDATE SET price = excluded.price
        "#,
    )
    .bind(price.symbol())
    .bind(price.date())
    .bind(decimal_to_text(price.price()))
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn insert_prices(connection: &Pool<Sqlite>, prices: &[Price]) -> Result<usize> {
    let mut tx = connection.begin().await?;
    for price in prices {
        insert_price(price, &mut tx).await?;
    }
    tx.commit().await?;
    Ok(prices.len())
}

pub async fn truncate_tables(connection: &Pool<Sqlite>, clear_market_data: bool) -> Result<()> {
    let mut tx = connection.begin().await?;

    sqlx::query("DELETE FROM transactions")
        .execute(&mut *tx)
        .await?;

    if clear_market_data {
        sqlx::query("DELETE FROM exchange_rates")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM prices").execute(&mut *tx).await?;
    }

    tx.commit().await?;

    Ok(())
}

use anyhow::{Context, Result};
use sqlx::{Pool, Sqlite, sqlite::SqliteQueryResult};

pub async fn create_transactions(
    connection: &Pool<Sqlite>,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            instrument TEXT NOT NULL,
            transaction_type TEXT NOT NULL,
            quantity TEXT NOT NULL,
            price TEXT NOT NULL,
            currency TEXT NOT NULL,
            trade_date TEXT NOT NULL,
            trade_time TEXT NOT NULL DEFAULT '00:00:00',
            settlement_date TEXT NOT NULL,
            fees TEXT NOT NULL,
            asset_category TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (trade_date, trade_time, instrument, transaction_type, quantity, price, fees, currency, description)
        )
        "#,
    )
    .execute(connection)
    .await
}

pub async fn create_exchange_rates(
    connection: &Pool<Sqlite>,
) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS exchange_rates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            base_currency TEXT NOT NULL,
            quote_currency TEXT NOT NULL,
            rate_date TEXT NOT NULL,
            rate TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (base_currency, quote_currency, rate_date)
        )
        "#,
    )
    .execute(connection)
    .await
}

pub async fn create_prices(connection: &Pool<Sqlite>) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS prices (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            symbol TEXT NOT NULL,
            price_date TEXT NOT NULL,
            price TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (symbol, price_date)
        )
        "#,
    )
    .execute(connection)
    .await
}

pub async fn create_indexes(connection: &Pool<Sqlite>) -> Result<SqliteQueryResult, sqlx::Error> {
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_transactions_instrument_date
        ON transactions (instrument, trade_date, trade_time, id)
        "#,
    )
    .execute(connection)
    .await
}

/// Creates every table the tracker uses. Safe to run on each start.
pub async fn init_tables(connection: &Pool<Sqlite>) -> Result<()> {
    create_transactions(connection)
        .await
        .context("Failed to create transactions table")?;
    create_exchange_rates(connection)
        .await
        .context("Failed to create exchange_rates table")?;
    create_prices(connection)
        .await
        .context("Failed to create prices table")?;
    create_indexes(connection)
        .await
        .context("Failed to create indexes")?;
    Ok(())
}

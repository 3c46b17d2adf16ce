use std::{fs::File, io::Write};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use derive_getters::Getters;
use reqwest::Client;
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

use crate::{
    api::frank,
    app::{
        aggregator::Aggregator,
        calc::{LedgerMatch, LotMatcher},
        converter::{CurrencyConverter, RateTable},
        import::{ImportSummary, read_prices, read_rates, read_transactions},
        prices::PriceTable,
    },
    config::{Config, ReportingConfig},
    db,
    models::{IncomeReport, Period, RealizedReport, Transaction, UnrealizedReport},
};

/// Ledger, rates and prices read once. Reports computed from the same
/// snapshot never see a half finished import.
#[derive(Debug, Getters)]
pub struct Snapshot {
    transactions: Vec<Transaction>,
    prices: PriceTable,
    converter: CurrencyConverter<RateTable>,
    reporting: ReportingConfig,
}

impl Snapshot {
    pub fn new(
        transactions: Vec<Transaction>,
        rates: RateTable,
        prices: PriceTable,
        config: &Config,
    ) -> Self {
        Self {
            transactions,
            prices,
            converter: CurrencyConverter::new(rates, config.converter()),
            reporting: config.reporting(),
        }
    }

    /// FIFO matching over every transaction traded on or before `until`.
    pub fn ledger(&self, until: NaiveDate) -> LedgerMatch {
        let transactions: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|transaction| *transaction.trade_date() <= until)
            .cloned()
            .collect();
        LotMatcher::new(&self.reporting, &self.converter).match_ledger(&transactions)
    }

    pub fn realized(&self, period: &Period) -> RealizedReport {
        let ledger = self.ledger(*period.end());
        self.aggregator().realized(&ledger, period)
    }

    pub fn unrealized(&self, as_of: NaiveDate) -> UnrealizedReport {
        let ledger = self.ledger(as_of);
        self.aggregator()
            .unrealized(&ledger, &self.transactions, &self.prices, as_of)
    }

    pub fn income(&self, period: &Period) -> IncomeReport {
        self.aggregator().income(&self.transactions, period)
    }

    fn aggregator(&self) -> Aggregator<'_, RateTable> {
        Aggregator::new(&self.reporting, &self.converter)
    }
}

/// Writes transactions as CSV, one column per stored field.
pub fn write_ledger<W: Write>(writer: W, transactions: &[Transaction]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for transaction in transactions {
        writer
            .serialize(transaction)
            .with_context(|| format!("Failed to write transaction {}", transaction.id()))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize)]
pub struct TaxYears {
    current_year: i32,
    ytd_label: String,
    available_years: Vec<i32>,
}

#[derive(Clone, Debug)]
pub struct Portfolio {
    connection: Pool<Sqlite>,
    config: Config,
    client: Client,
}

impl Portfolio {
    pub fn new(connection: Pool<Sqlite>, config: Config) -> Self {
        Self {
            connection,
            config,
            client: Client::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connection(&self) -> &Pool<Sqlite> {
        &self.connection
    }

    /// Imports a broker export in one database transaction. Rows already
    /// stored are counted as duplicates and left alone.
    pub async fn import_transactions(&self, path: &str, skip_errors: bool) -> Result<ImportSummary> {
        let path = shellexpand::tilde(path);
        let file = File::open(path.as_ref())
            .with_context(|| format!("Failed to open CSV file at path: {}", path))?;
        let parsed = read_transactions(file, skip_errors)
            .with_context(|| format!("Failed to import {}", path))?;

        let mut tx = self.connection.begin().await?;
        let mut imported = 0;
        let mut duplicates = 0;
        for transaction in parsed.transactions() {
            match db::insert_transaction(transaction, &mut tx).await? {
                Some(_) => imported += 1,
                None => duplicates += 1,
            }
        }
        tx.commit()
            .await
            .context("Failed to commit imported transactions")?;

        for err in parsed.errors() {
            warn!(error = %err, "Row not imported");
        }
        info!(
            path = %path,
            imported,
            duplicates,
            skipped = parsed.skipped(),
            errors = parsed.errors().len(),
            "Imported transactions"
        );

        Ok(ImportSummary::new(imported, duplicates, &parsed))
    }

    pub async fn import_rates(&self, path: &str) -> Result<ImportSummary> {
        let path = shellexpand::tilde(path);
        let file = File::open(path.as_ref())
            .with_context(|| format!("Failed to open CSV file at path: {}", path))?;
        let rates = read_rates(file).with_context(|| format!("Failed to import {}", path))?;

        let imported = db::insert_rates(&self.connection, &rates).await?;
        info!(path = %path, imported, "Imported exchange rates");

        Ok(ImportSummary::count(imported, rates.len() - imported))
    }

    pub async fn import_prices(&self, path: &str) -> Result<ImportSummary> {
        let path = shellexpand::tilde(path);
        let file = File::open(path.as_ref())
            .with_context(|| format!("Failed to open CSV file at path: {}", path))?;
        let prices = read_prices(file).with_context(|| format!("Failed to import {}", path))?;

        let imported = db::insert_prices(&self.connection, &prices).await?;
        info!(path = %path, imported, "Imported prices");

        Ok(ImportSummary::count(imported, 0))
    }

    /// Downloads daily `from/to` rates for the range and stores the new ones.
    pub async fn fetch_rates(
        &self,
        from_currency: &str,
        to_currency: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ImportSummary> {
        let series =
            frank::get_forex_history(from_currency, to_currency, start, end, &self.client)
                .await
                .with_context(|| {
                    format!("Frankfurter ({}/{})", from_currency, to_currency)
                })?;
        let rates = series.to_exchange_rates(to_currency);

        let imported = db::insert_rates(&self.connection, &rates).await?;
        info!(
            from = from_currency,
            to = to_currency,
            received = rates.len(),
            imported,
            "Stored downloaded exchange rates"
        );

        Ok(ImportSummary::count(imported, rates.len() - imported))
    }

    /// Stored transactions in ledger order, optionally for one instrument
    /// and one period.
    pub async fn transactions(
        &self,
        instrument: Option<&str>,
        period: Option<&Period>,
    ) -> Result<Vec<Transaction>> {
        db::list_transactions(&self.connection, instrument, period).await
    }

    pub async fn export_transactions(
        &self,
        path: &str,
        instrument: Option<&str>,
        period: Option<&Period>,
    ) -> Result<usize> {
        let transactions = self.transactions(instrument, period).await?;

        let path = shellexpand::tilde(path);
        let file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create CSV file at path: {}", path))?;
        write_ledger(file, &transactions).with_context(|| format!("Failed to export {}", path))?;
        info!(path = %path, exported = transactions.len(), "Exported transactions");

        Ok(transactions.len())
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        let transactions = db::list_transactions(&self.connection, None, None).await?;
        let rates = RateTable::from_rates(db::list_rates(&self.connection).await?);
        let prices = PriceTable::from_prices(db::list_prices(&self.connection).await?);

        Ok(Snapshot::new(transactions, rates, prices, &self.config))
    }

    pub async fn realized_report(&self, period: &Period) -> Result<RealizedReport> {
        let report = self.snapshot().await?.realized(period);
        info!(%period, rows = report.rows().len(), failures = report.failures().len(), "Realized report");
        Ok(report)
    }

    pub async fn unrealized_report(&self, as_of: NaiveDate) -> Result<UnrealizedReport> {
        let report = self.snapshot().await?.unrealized(as_of);
        info!(%as_of, positions = report.positions().len(), failures = report.failures().len(), "Unrealized report");
        Ok(report)
    }

    pub async fn income_report(&self, period: &Period) -> Result<IncomeReport> {
        let report = self.snapshot().await?.income(period);
        info!(%period, instruments = report.by_instrument().len(), failures = report.failures().len(), "Income report");
        Ok(report)
    }

    pub async fn tax_years(&self, today: NaiveDate) -> Result<TaxYears> {
        let available_years =
            db::list_tax_years(&self.connection, *self.config.max_tax_years(), today).await?;
        let current_year = today.year();

        Ok(TaxYears {
            current_year,
            ytd_label: format!("Year to Date ({})", current_year),
            available_years,
        })
    }

    pub async fn reset(&self, clear_market_data: bool) -> Result<()> {
        db::truncate_tables(&self.connection, clear_market_data).await?;
        info!(clear_market_data, "Cleared stored data");
        Ok(())
    }
}

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use portfolio_tax_tracker::{
    app::{Portfolio, render},
    config::Config,
    db,
    models::Period,
};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// FIFO gains, open positions and dividend income from broker exports.
#[derive(Parser)]
#[command(name = "portfolio-tax-tracker", version)]
struct Cli {
    /// SQLite database file (overrides PTT_DATABASE_URL)
    #[arg(long, global = true)]
    database: Option<String>,

    /// Reporting currency (overrides PTT_REPORTING_CURRENCY)
    #[arg(long, global = true)]
    currency: Option<String>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a broker transaction export
    Import {
        path: String,
        /// Keep valid rows and list malformed ones instead of aborting
        #[arg(long)]
        skip_errors: bool,
    },
    /// Import exchange rates from a date,from,to,rate CSV
    ImportRates { path: String },
    /// Import prices from a date,symbol,price CSV
    ImportPrices { path: String },
    /// Download daily exchange rates from Frankfurter
    FetchRates {
        from: String,
        to: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// Realized gains for a year, ytd or start..end
    Realized { period: String },
    /// Open positions valued at the latest stored prices
    Unrealized {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Dividends, withholding tax and fees for a period
    Income { period: String },
    /// List stored transactions
    Transactions {
        #[arg(long)]
        instrument: Option<String>,
        /// Year, ytd or start..end
        #[arg(long)]
        period: Option<String>,
    },
    /// Write stored transactions to a CSV file
    Export {
        path: String,
        #[arg(long)]
        instrument: Option<String>,
        /// Year, ytd or start..end
        #[arg(long)]
        period: Option<String>,
    },
    /// Years available for tax reports
    TaxYears,
    /// Delete stored transactions
    Reset {
        /// Also delete exchange rates and prices
        #[arg(long)]
        all: bool,
    },
}

fn print<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text(value));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_tax_tracker=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(database) = &cli.database {
        config = config.with_database_url(database);
    }
    if let Some(currency) = &cli.currency {
        config = config.with_reporting_currency(currency)?;
    }
    debug!(?config, "Resolved configuration");

    let db_connect_options = SqliteConnectOptions::new()
        .filename(config.database_url())
        .create_if_missing(true);
    let connection = SqlitePool::connect_with(db_connect_options)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url()))?;
    db::init_tables(&connection).await?;

    let portfolio = Portfolio::new(connection, config);
    let today = Local::now().date_naive();

    match cli.command {
        Command::Import { path, skip_errors } => {
            let summary = portfolio.import_transactions(&path, skip_errors).await?;
            print(cli.json, &summary, render::import_summary)?;
        }
        Command::ImportRates { path } => {
            let summary = portfolio.import_rates(&path).await?;
            print(cli.json, &summary, render::import_summary)?;
        }
        Command::ImportPrices { path } => {
            let summary = portfolio.import_prices(&path).await?;
            print(cli.json, &summary, render::import_summary)?;
        }
        Command::FetchRates {
            from,
            to,
            start,
            end,
        } => {
            let summary = portfolio.fetch_rates(&from, &to, start, end).await?;
            print(cli.json, &summary, render::import_summary)?;
        }
        Command::Realized { period } => {
            let period = Period::parse(&period, today)?;
            let report = portfolio.realized_report(&period).await?;
            print(cli.json, &report, render::realized)?;
        }
        Command::Unrealized { date } => {
            let report = portfolio.unrealized_report(date.unwrap_or(today)).await?;
            print(cli.json, &report, render::unrealized)?;
        }
        Command::Income { period } => {
            let period = Period::parse(&period, today)?;
            let report = portfolio.income_report(&period).await?;
            print(cli.json, &report, render::income)?;
        }
        Command::Transactions { instrument, period } => {
            let period = period
                .map(|period| Period::parse(&period, today))
                .transpose()?;
            let transactions = portfolio
                .transactions(instrument.as_deref(), period.as_ref())
                .await?;
            print(cli.json, &transactions, |transactions| {
                render::transactions(transactions)
            })?;
        }
        Command::Export {
            path,
            instrument,
            period,
        } => {
            let period = period
                .map(|period| Period::parse(&period, today))
                .transpose()?;
            let exported = portfolio
                .export_transactions(&path, instrument.as_deref(), period.as_ref())
                .await?;
            println!("Exported {} transactions to {}", exported, path);
        }
        Command::TaxYears => {
            let years = portfolio.tax_years(today).await?;
            print(cli.json, &years, render::tax_years)?;
        }
        Command::Reset { all } => {
            portfolio.reset(all).await?;
            println!("Cleared stored data");
        }
    }

    Ok(())
}

//! Reading broker exports, exchange rates and prices from CSV.
//!
//! Everything here is pure: rows are validated into models and handed back,
//! storing them is up to the caller.

use std::io::Read;

use csv::{ReaderBuilder, Trim};
use derive_getters::Getters;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    app::utils::{non_empty, parse_date, parse_decimal, parse_timestamp, require_decimal},
    errors::{Result, TrackerError},
    models::{AssetCategory, CurrencyPair, ExchangeRate, NewTransaction, Price, TransactionType},
};

pub const DEFAULT_CURRENCY: &str = "USD";

/// Instrument that account level fees without a symbol are booked against.
pub const ACCOUNT_INSTRUMENT: &str = "CASH";

/// One line of a broker transaction export.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BrokerRow {
    #[serde(rename = "Date", default)]
    pub date: Option<String>,
    #[serde(rename = "Type", default)]
    pub kind: Option<String>,
    #[serde(rename = "Sub Type", default)]
    pub sub_type: Option<String>,
    #[serde(rename = "Action", default)]
    pub action: Option<String>,
    #[serde(rename = "Symbol", default)]
    pub symbol: Option<String>,
    #[serde(rename = "Instrument Type", default)]
    pub instrument_type: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Value", default)]
    pub value: Option<String>,
    #[serde(rename = "Quantity", default)]
    pub quantity: Option<String>,
    #[serde(rename = "Average Price", default)]
    pub average_price: Option<String>,
    #[serde(rename = "Commissions", default)]
    pub commissions: Option<String>,
    #[serde(rename = "Fees", default)]
    pub fees: Option<String>,
    #[serde(rename = "Currency", default)]
    pub currency: Option<String>,
    #[serde(rename = "Settlement Date", default)]
    pub settlement_date: Option<String>,
}

#[derive(Debug, Default, Getters)]
pub struct ParsedImport {
    transactions: Vec<NewTransaction>,
    skipped: usize,
    errors: Vec<TrackerError>,
}

/// What an import did, as shown to the user.
#[derive(Clone, Debug, Default, Eq, Getters, PartialEq, Serialize)]
pub struct ImportSummary {
    imported: usize,
    duplicates: usize,
    skipped: usize,
    errors: Vec<String>,
}

impl ImportSummary {
    pub fn new(imported: usize, duplicates: usize, parsed: &ParsedImport) -> Self {
        Self {
            imported,
            duplicates,
            skipped: parsed.skipped,
            errors: parsed.errors.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn count(imported: usize, duplicates: usize) -> Self {
        Self {
            imported,
            duplicates,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
struct RateRow {
    date: String,
    #[serde(alias = "base")]
    from: String,
    #[serde(alias = "quote")]
    to: String,
    rate: String,
}

#[derive(Clone, Debug, Deserialize)]
struct PriceRow {
    date: String,
    symbol: String,
    price: String,
}

/// Validates one export row. `Ok(None)` means the row is not a ledger event
/// (cash deposits, interest and the like) and was skipped.
pub fn parse_row(row: usize, record: &BrokerRow) -> Result<Option<NewTransaction>> {
    let Some(transaction_type) = classify(record) else {
        return Ok(None);
    };

    let traded_at = parse_timestamp(record.date.as_deref().unwrap_or_default(), row, "Date")?;
    let trade_date = traded_at.date();
    let settlement_date = match non_empty(record.settlement_date.as_deref()) {
        Some(field) => parse_date(field, row, "Settlement Date")?,
        None => trade_date,
    };

    let symbol = non_empty(record.symbol.as_deref()).map(str::to_uppercase);
    let instrument = match (symbol, transaction_type) {
        (Some(symbol), _) => symbol,
        (None, TransactionType::Fee) => ACCOUNT_INSTRUMENT.to_string(),
        (None, TransactionType::Dividend) => return Ok(None),
        (None, _) => return Err(TrackerError::malformed(row, "Symbol", "is missing")),
    };

    let currency = non_empty(record.currency.as_deref())
        .unwrap_or(DEFAULT_CURRENCY)
        .to_uppercase();
    let charges = parse_decimal(record.fees.as_deref(), row, "Fees")?
        .unwrap_or_default()
        .abs()
        + parse_decimal(record.commissions.as_deref(), row, "Commissions")?
            .unwrap_or_default()
            .abs();

    let (quantity, price, fees) = match transaction_type {
        TransactionType::Buy | TransactionType::Sell => {
            let quantity = require_decimal(record.quantity.as_deref(), row, "Quantity")?;
            if quantity <= Decimal::ZERO {
                return Err(TrackerError::malformed(row, "Quantity", "must be positive"));
            }
            let price = if is_removal(record) {
                Decimal::ZERO
            } else {
                unit_price(record, quantity, row)?
            };
            let signed = if transaction_type == TransactionType::Sell {
                -quantity
            } else {
                quantity
            };
            (signed, price, charges)
        }
        TransactionType::Transfer => {
            let quantity = require_decimal(record.quantity.as_deref(), row, "Quantity")?;
            if quantity.is_zero() {
                return Err(TrackerError::malformed(row, "Quantity", "cannot be zero"));
            }
            let signed = match action(record).as_str() {
                "WITHDRAWAL" => -quantity.abs(),
                "DEPOSIT" => quantity.abs(),
                _ => quantity,
            };
            let price = unit_price(record, quantity.abs(), row)?;
            if signed > Decimal::ZERO && price.is_zero() {
                return Err(TrackerError::malformed(
                    row,
                    "Average Price",
                    "must be positive for an inbound transfer",
                ));
            }
            (signed, price, charges)
        }
        TransactionType::Dividend => {
            let value = require_decimal(record.value.as_deref(), row, "Value")?;
            (Decimal::ONE, value, charges)
        }
        TransactionType::Fee => {
            let value = require_decimal(record.value.as_deref(), row, "Value")?;
            (Decimal::ZERO, Decimal::ZERO, value.abs() + charges)
        }
    };

    Ok(Some(NewTransaction::new(
        instrument,
        transaction_type,
        quantity,
        price,
        currency,
        trade_date,
        traded_at.time(),
        settlement_date,
        fees,
        AssetCategory::from_instrument_type(record.instrument_type.as_deref().unwrap_or_default()),
        record.description.clone().unwrap_or_default().trim().to_string(),
    )))
}

fn action(record: &BrokerRow) -> String {
    non_empty(record.action.as_deref())
        .unwrap_or_default()
        .to_uppercase()
}

fn lowered(field: &Option<String>) -> String {
    non_empty(field.as_deref()).unwrap_or_default().to_lowercase()
}

fn is_trade_action(action: &str) -> bool {
    action.starts_with("BUY") || action.starts_with("SELL")
}

/// Option expirations, assignments and exercises take contracts out of the
/// account without a trade. They close lots at a price of zero.
fn is_removal(record: &BrokerRow) -> bool {
    let sub_type = lowered(&record.sub_type);
    lowered(&record.kind) == "receive deliver"
        && !is_trade_action(&action(record))
        && ["expiration", "assignment", "exercise"]
            .iter()
            .any(|removal| sub_type.contains(removal))
}

fn classify(record: &BrokerRow) -> Option<TransactionType> {
    match action(record).as_str() {
        "BUY_TO_OPEN" | "BUY_TO_CLOSE" | "BUY" => return Some(TransactionType::Buy),
        "SELL_TO_CLOSE" | "SELL_TO_OPEN" | "SELL" => return Some(TransactionType::Sell),
        "DEPOSIT" | "WITHDRAWAL" if non_empty(record.symbol.as_deref()).is_some() => {
            return Some(TransactionType::Transfer);
        }
        _ => {}
    }
    if is_removal(record) {
        return Some(TransactionType::Sell);
    }

    match (lowered(&record.kind).as_str(), lowered(&record.sub_type).as_str()) {
        ("money movement", "dividend") => Some(TransactionType::Dividend),
        ("money movement", "fee" | "commission") => Some(TransactionType::Fee),
        ("receive deliver", _) => Some(TransactionType::Transfer),
        _ => None,
    }
}

/// Unit price from `Average Price`, or `Value / Quantity` when the export
/// leaves it out. The export signs prices by cash direction, which the ledger
/// already carries in the quantity.
fn unit_price(record: &BrokerRow, quantity: Decimal, row: usize) -> Result<Decimal> {
    if let Some(price) = parse_decimal(record.average_price.as_deref(), row, "Average Price")? {
        return Ok(price.abs());
    }
    match parse_decimal(record.value.as_deref(), row, "Value")? {
        Some(value) if !quantity.is_zero() => Ok((value / quantity).abs()),
        _ => Err(TrackerError::malformed(row, "Average Price", "is missing")),
    }
}

/// Reads a whole broker export. Without `skip_errors` the first malformed row
/// aborts the read; with it, malformed rows are collected and the rest kept.
/// Valid rows come back in timestamp order, file order breaking ties.
pub fn read_transactions<R: Read>(reader: R, skip_errors: bool) -> Result<ParsedImport> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut parsed = ParsedImport::default();

    for (row_idx, record) in reader.deserialize::<BrokerRow>().enumerate() {
        let row = row_idx + 1;
        let outcome = record
            .map_err(|e| TrackerError::malformed(row, "record", e.to_string()))
            .and_then(|record| parse_row(row, &record));

        match outcome {
            Ok(Some(transaction)) => parsed.transactions.push(transaction),
            Ok(None) => parsed.skipped += 1,
            Err(err) if skip_errors => {
                warn!(row, error = %err, "Skipping malformed row");
                parsed.errors.push(err);
            }
            Err(err) => return Err(err),
        }
    }

    // Exports may list the newest row first; store ids follow the clock.
    parsed.transactions.sort_by_key(NewTransaction::traded_at);

    debug!(
        valid = parsed.transactions.len(),
        skipped = parsed.skipped,
        errors = parsed.errors.len(),
        "Parsed transaction export"
    );
    Ok(parsed)
}

/// Reads `date,from,to,rate` lines. Rates must be positive.
pub fn read_rates<R: Read>(reader: R) -> Result<Vec<ExchangeRate>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut rates = Vec::new();

    for (row_idx, record) in reader.deserialize::<RateRow>().enumerate() {
        let row = row_idx + 1;
        let record = record.map_err(|e| TrackerError::malformed(row, "record", e.to_string()))?;

        let date = parse_date(&record.date, row, "date")?;
        let rate = require_decimal(Some(record.rate.as_str()), row, "rate")?;
        if rate <= Decimal::ZERO {
            return Err(TrackerError::malformed(row, "rate", "must be positive"));
        }
        let pair = CurrencyPair::new(&record.from, &record.to);
        if pair.base().len() != 3 || pair.quote().len() != 3 {
            return Err(TrackerError::malformed(
                row,
                "from/to",
                format!("'{}' is not a currency pair", pair),
            ));
        }
        rates.push(ExchangeRate::new(pair, date, rate));
    }

    Ok(rates)
}

/// Reads `date,symbol,price` lines. Prices cannot be negative.
pub fn read_prices<R: Read>(reader: R) -> Result<Vec<Price>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut prices = Vec::new();

    for (row_idx, record) in reader.deserialize::<PriceRow>().enumerate() {
        let row = row_idx + 1;
        let record = record.map_err(|e| TrackerError::malformed(row, "record", e.to_string()))?;

        let date = parse_date(&record.date, row, "date")?;
        let price = require_decimal(Some(record.price.as_str()), row, "price")?;
        if price < Decimal::ZERO {
            return Err(TrackerError::malformed(row, "price", "cannot be negative"));
        }
        let symbol = record.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(TrackerError::malformed(row, "symbol", "is missing"));
        }
        prices.push(Price::new(symbol, date, price));
    }

    Ok(prices)
}

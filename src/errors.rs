use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::CurrencyPair;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("No {pair} exchange rate on or before {date}")]
    RateUnavailable { pair: CurrencyPair, date: NaiveDate },

    #[error(
        "Selling {requested} {instrument} (transaction {transaction_id} on {date}) exceeds the open quantity {available} by {deficit}"
    )]
    InsufficientLots {
        instrument: String,
        transaction_id: i64,
        date: NaiveDate,
        requested: Decimal,
        available: Decimal,
        deficit: Decimal,
    },

    #[error("Malformed transaction at row {row}: '{field}' {reason}")]
    MalformedTransaction {
        row: usize,
        field: String,
        reason: String,
    },

    #[error("No price for {instrument} on or before {date}")]
    QuoteUnavailable { instrument: String, date: NaiveDate },

    #[error(
        "Transaction {transaction_id} for {instrument} is in {found} but its open lots are in {expected}"
    )]
    CurrencyMismatch {
        instrument: String,
        transaction_id: i64,
        expected: String,
        found: String,
    },

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{instrument} transaction {transaction_id} on {date}: {source}")]
    Context {
        instrument: String,
        transaction_id: i64,
        date: NaiveDate,
        #[source]
        source: Box<TrackerError>,
    },
}

impl TrackerError {
    pub fn malformed(row: usize, field: &str, reason: impl Into<String>) -> Self {
        TrackerError::MalformedTransaction {
            row,
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Attaches the transaction that was being processed when the error occurred.
    pub fn in_transaction(self, instrument: &str, transaction_id: i64, date: NaiveDate) -> Self {
        match self {
            TrackerError::Context { .. }
            | TrackerError::InsufficientLots { .. }
            | TrackerError::CurrencyMismatch { .. } => self,
            other => TrackerError::Context {
                instrument: instrument.to_string(),
                transaction_id,
                date,
                source: Box::new(other),
            },
        }
    }

    /// The underlying error kind, with any transaction context stripped.
    pub fn root(&self) -> &TrackerError {
        match self {
            TrackerError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn transaction_id(&self) -> Option<i64> {
        match self {
            TrackerError::Context { transaction_id, .. }
            | TrackerError::InsufficientLots { transaction_id, .. }
            | TrackerError::CurrencyMismatch { transaction_id, .. } => Some(*transaction_id),
            _ => None,
        }
    }

    /// The day the failing event happened, when the error knows it.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            TrackerError::Context { date, .. }
            | TrackerError::InsufficientLots { date, .. }
            | TrackerError::RateUnavailable { date, .. }
            | TrackerError::QuoteUnavailable { date, .. } => Some(*date),
            _ => None,
        }
    }
}

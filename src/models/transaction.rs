use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Clone, Debug, Deserialize, Eq, Getters, PartialEq, Serialize, new)]
pub struct Transaction {
    id: i64,
    instrument: String,
    transaction_type: TransactionType,
    quantity: Decimal,
    price: Decimal,
    currency: String,
    trade_date: NaiveDate,
    trade_time: NaiveTime,
    settlement_date: NaiveDate,
    fees: Decimal,
    asset_category: AssetCategory,
    description: String,
}

impl Transaction {
    /// Ledger order: trade date, time of day, then store id.
    pub fn sequence_key(&self) -> (NaiveDate, NaiveTime, i64) {
        (self.trade_date, self.trade_time, self.id)
    }

    /// Signed cash value of the event: quantity times unit price.
    pub fn amount(&self) -> Decimal {
        self.quantity * self.price
    }

    /// Buys and inbound transfers open lots.
    pub fn is_acquisition(&self) -> bool {
        match self.transaction_type {
            TransactionType::Buy => true,
            TransactionType::Transfer => self.quantity > Decimal::ZERO,
            _ => false,
        }
    }

    /// Sells and outbound transfers consume lots.
    pub fn is_disposal(&self) -> bool {
        match self.transaction_type {
            TransactionType::Sell => true,
            TransactionType::Transfer => self.quantity < Decimal::ZERO,
            _ => false,
        }
    }
}

/// A validated ledger event that has not been assigned a store id yet.
#[derive(Clone, Debug, Eq, Getters, PartialEq, new)]
pub struct NewTransaction {
    instrument: String,
    transaction_type: TransactionType,
    quantity: Decimal,
    price: Decimal,
    currency: String,
    trade_date: NaiveDate,
    trade_time: NaiveTime,
    settlement_date: NaiveDate,
    fees: Decimal,
    asset_category: AssetCategory,
    description: String,
}

impl NewTransaction {
    pub fn traded_at(&self) -> NaiveDateTime {
        self.trade_date.and_time(self.trade_time)
    }

    pub fn into_transaction(self, id: i64) -> Transaction {
        Transaction::new(
            id,
            self.instrument,
            self.transaction_type,
            self.quantity,
            self.price,
            self.currency,
            self.trade_date,
            self.trade_time,
            self.settlement_date,
            self.fees,
            self.asset_category,
            self.description,
        )
    }
}

#[derive(
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    EnumString,
    Eq,
    Hash,
    PartialEq,
    Serialize,
)]
pub enum TransactionType {
    Buy,
    Sell,
    Dividend,
    Fee,
    Transfer,
}

impl TransactionType {
    pub fn parse_str(s: &str) -> Result<TransactionType> {
        s.parse::<TransactionType>()
            .map_err(|_| anyhow::anyhow!("Unknown transaction type '{}'", s))
    }

    pub fn to_str(&self) -> &str {
        self.as_ref()
    }
}

#[derive(
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    EnumString,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub enum AssetCategory {
    Stock,
    Etf,
    Option,
    Other,
}

impl AssetCategory {
    pub fn parse_str(s: &str) -> Result<AssetCategory> {
        s.parse::<AssetCategory>()
            .map_err(|_| anyhow::anyhow!("Unknown asset category '{}'", s))
    }

    pub fn to_str(&self) -> &str {
        self.as_ref()
    }

    /// Classifies an export's instrument type column.
    pub fn from_instrument_type(instrument_type: &str) -> AssetCategory {
        let lowered = instrument_type.trim().to_lowercase();
        if lowered.contains("option") {
            AssetCategory::Option
        } else if lowered.contains("etf") || lowered.contains("fund") {
            AssetCategory::Etf
        } else if lowered.is_empty() || lowered.contains("equity") || lowered.contains("stock") {
            AssetCategory::Stock
        } else {
            AssetCategory::Other
        }
    }
}

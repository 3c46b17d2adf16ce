use chrono::NaiveDate;
use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::AssetCategory;

/// One slice of a disposal matched against one lot.
#[derive(Clone, Debug, Deserialize, Eq, Getters, PartialEq, Serialize, new)]
pub struct MatchedGain {
    instrument: String,
    asset_category: AssetCategory,
    opening_transaction_id: i64,
    closing_transaction_id: i64,
    open_date: NaiveDate,
    close_date: NaiveDate,
    quantity: Decimal,
    currency: String,
    proceeds: Decimal,
    cost: Decimal,
    gain: Decimal,
    reporting_currency: String,
    proceeds_reporting: Decimal,
    cost_reporting: Decimal,
    gain_reporting: Decimal,
    holding_days: i64,
    term: Term,
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
pub enum Term {
    Short,
    Long,
}

impl Term {
    /// Holdings of at least `threshold_days` are long term.
    pub fn classify(holding_days: i64, threshold_days: i64) -> Term {
        if holding_days >= threshold_days {
            Term::Long
        } else {
            Term::Short
        }
    }
}

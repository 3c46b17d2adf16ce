use chrono::NaiveDate;
use derive_getters::Getters;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{AssetCategory, Transaction};

/// Open quantity of an instrument acquired by a single transaction.
#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize)]
pub struct Lot {
    instrument: String,
    opening_transaction_id: i64,
    open_date: NaiveDate,
    currency: String,
    asset_category: AssetCategory,
    quantity: Decimal,
    remaining: Decimal,
    cost_basis: Decimal,
    remaining_cost: Decimal,
}

impl Lot {
    /// Opens a lot from a buy or inbound transfer. Fees are capitalised into
    /// the cost basis.
    pub fn open(transaction: &Transaction) -> Self {
        let quantity = transaction.quantity().abs();
        let cost_basis = quantity * *transaction.price() + *transaction.fees();
        Self {
            instrument: transaction.instrument().clone(),
            opening_transaction_id: *transaction.id(),
            open_date: *transaction.trade_date(),
            currency: transaction.currency().clone(),
            asset_category: *transaction.asset_category(),
            quantity,
            remaining: quantity,
            cost_basis,
            remaining_cost: cost_basis,
        }
    }

    pub fn unit_cost(&self) -> Decimal {
        if self.quantity.is_zero() {
            return Decimal::ZERO;
        }
        self.cost_basis / self.quantity
    }

    /// Removes `quantity` units (capped at what remains) and returns their cost.
    /// Closing the lot hands out the exact remaining cost so nothing is lost to
    /// division.
    pub fn consume(&mut self, quantity: Decimal) -> Decimal {
        let taken = quantity.min(self.remaining);
        let cost = if taken == self.remaining {
            self.remaining_cost
        } else {
            self.unit_cost() * taken
        };
        self.remaining -= taken;
        self.remaining_cost -= cost;
        cost
    }

    pub fn is_closed(&self) -> bool {
        self.remaining.is_zero()
    }
}

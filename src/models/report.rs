use std::collections::BTreeMap;

use chrono::NaiveDate;
use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{MatchedGain, Period, Term};
use crate::errors::TrackerError;

/// An instrument (or single event) left out of a report and why.
#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize, new)]
pub struct ReportFailure {
    instrument: String,
    transaction_id: Option<i64>,
    date: Option<NaiveDate>,
    message: String,
}

impl ReportFailure {
    pub fn from_error(instrument: &str, error: &TrackerError) -> Self {
        Self {
            instrument: instrument.to_string(),
            transaction_id: error.transaction_id(),
            date: error.date(),
            message: error.to_string(),
        }
    }
}

/// Gains and losses kept apart, as tax forms ask for them separately.
#[derive(Clone, Debug, Default, Eq, Getters, PartialEq, Serialize)]
pub struct GainTotals {
    proceeds: Decimal,
    cost: Decimal,
    gains: Decimal,
    losses: Decimal,
    net: Decimal,
}

impl GainTotals {
    pub fn add(&mut self, proceeds: Decimal, cost: Decimal, gain: Decimal) {
        self.proceeds += proceeds;
        self.cost += cost;
        if gain > Decimal::ZERO {
            self.gains += gain;
        } else {
            self.losses += gain.abs();
        }
        self.net = self.gains - self.losses;
    }
}

#[derive(Clone, Debug, Default, Eq, Getters, PartialEq, Serialize)]
pub struct InstrumentSummary {
    currency: String,
    quantity: Decimal,
    native: GainTotals,
    reporting: GainTotals,
    short_term: Decimal,
    long_term: Decimal,
}

impl InstrumentSummary {
    pub fn add(&mut self, gain: &MatchedGain) {
        if self.currency.is_empty() {
            self.currency = gain.currency().clone();
        }
        self.quantity += *gain.quantity();
        self.native.add(*gain.proceeds(), *gain.cost(), *gain.gain());
        self.reporting.add(
            *gain.proceeds_reporting(),
            *gain.cost_reporting(),
            *gain.gain_reporting(),
        );
        match gain.term() {
            Term::Short => self.short_term += *gain.gain_reporting(),
            Term::Long => self.long_term += *gain.gain_reporting(),
        }
    }
}

/// Realized totals for a period, in the reporting currency unless noted.
#[derive(Clone, Debug, Default, Eq, Getters, PartialEq, Serialize)]
pub struct PeriodSummary {
    short_term: GainTotals,
    long_term: GainTotals,
    total: GainTotals,
    native: BTreeMap<String, GainTotals>,
    by_instrument: BTreeMap<String, InstrumentSummary>,
    by_category: BTreeMap<String, GainTotals>,
}

impl PeriodSummary {
    pub fn add(&mut self, gain: &MatchedGain) {
        let proceeds = *gain.proceeds_reporting();
        let cost = *gain.cost_reporting();
        let amount = *gain.gain_reporting();

        match gain.term() {
            Term::Short => self.short_term.add(proceeds, cost, amount),
            Term::Long => self.long_term.add(proceeds, cost, amount),
        }
        self.total.add(proceeds, cost, amount);

        self.native
            .entry(gain.currency().clone())
            .or_default()
            .add(*gain.proceeds(), *gain.cost(), *gain.gain());
        self.by_instrument
            .entry(gain.instrument().clone())
            .or_default()
            .add(gain);
        self.by_category
            .entry(gain.asset_category().to_string())
            .or_default()
            .add(proceeds, cost, amount);
    }
}

#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize, new)]
pub struct RealizedReport {
    period: Period,
    reporting_currency: String,
    rows: Vec<MatchedGain>,
    summary: PeriodSummary,
    failures: Vec<ReportFailure>,
}

#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize, new)]
pub struct UnrealizedPosition {
    instrument: String,
    currency: String,
    quantity: Decimal,
    average_cost: Decimal,
    price: Decimal,
    cost_basis: Decimal,
    market_value: Decimal,
    unrealized_gain: Decimal,
    cost_basis_reporting: Decimal,
    market_value_reporting: Decimal,
    unrealized_gain_reporting: Decimal,
    dividends_reporting: Decimal,
    first_open_date: NaiveDate,
}

#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize, new)]
pub struct UnrealizedReport {
    as_of: NaiveDate,
    reporting_currency: String,
    positions: Vec<UnrealizedPosition>,
    total_cost_basis: Decimal,
    total_market_value: Decimal,
    total_unrealized_gain: Decimal,
    failures: Vec<ReportFailure>,
}

/// Dividend and fee income of one instrument, native amounts unless noted.
#[derive(Clone, Debug, Default, Eq, Getters, PartialEq, Serialize)]
pub struct InstrumentIncome {
    currency: String,
    gross_dividends: Decimal,
    withholding_tax: Decimal,
    net_dividends: Decimal,
    fees: Decimal,
    net_dividends_reporting: Decimal,
    fees_reporting: Decimal,
    payments: usize,
}

impl InstrumentIncome {
    pub fn add_dividend(&mut self, currency: &str, amount: Decimal, amount_reporting: Decimal) {
        if self.currency.is_empty() {
            self.currency = currency.to_string();
        }
        if amount >= Decimal::ZERO {
            self.gross_dividends += amount;
            self.payments += 1;
        } else {
            self.withholding_tax += amount.abs();
        }
        self.net_dividends = self.gross_dividends - self.withholding_tax;
        self.net_dividends_reporting += amount_reporting;
    }

    pub fn add_fee(&mut self, currency: &str, fee: Decimal, fee_reporting: Decimal) {
        if self.currency.is_empty() {
            self.currency = currency.to_string();
        }
        self.fees += fee;
        self.fees_reporting += fee_reporting;
    }
}

#[derive(Clone, Debug, Eq, Getters, PartialEq, Serialize, new)]
pub struct IncomeReport {
    period: Period,
    reporting_currency: String,
    gross_dividends: Decimal,
    withholding_tax: Decimal,
    net_dividends: Decimal,
    fees: Decimal,
    by_instrument: BTreeMap<String, InstrumentIncome>,
    failures: Vec<ReportFailure>,
}

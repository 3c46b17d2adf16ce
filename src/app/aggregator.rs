use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::{
    app::{
        calc::{LedgerMatch, MatchOutcome},
        converter::{CurrencyConverter, RateStore},
        prices::QuoteProvider,
    },
    config::ReportingConfig,
    errors::{Result, TrackerError},
    models::{
        IncomeReport, InstrumentIncome, MatchedGain, Period, PeriodSummary, RealizedReport,
        ReportFailure, Transaction, TransactionType, UnrealizedPosition, UnrealizedReport,
    },
};

/// Turns matched lots and ledger events into reports. Every method is a pure
/// function of its arguments.
pub struct Aggregator<'a, S> {
    config: &'a ReportingConfig,
    converter: &'a CurrencyConverter<S>,
}

impl<'a, S: RateStore> Aggregator<'a, S> {
    pub fn new(config: &'a ReportingConfig, converter: &'a CurrencyConverter<S>) -> Self {
        Self { config, converter }
    }

    /// Matched slices closed inside `period`, with totals by term, instrument,
    /// asset category and native currency.
    pub fn realized(&self, ledger: &LedgerMatch, period: &Period) -> RealizedReport {
        let mut rows: Vec<MatchedGain> = ledger
            .outcomes()
            .values()
            .flat_map(|outcome| outcome.gains().iter())
            .filter(|gain| period.contains(gain.close_date()))
            .cloned()
            .collect();
        rows.sort_by_key(|gain| {
            (
                *gain.close_date(),
                *gain.closing_transaction_id(),
                *gain.opening_transaction_id(),
            )
        });

        let mut summary = PeriodSummary::default();
        for gain in &rows {
            summary.add(gain);
        }

        let mut failures = ledger.failures().clone();
        failures.extend(
            ledger
                .outcomes()
                .values()
                .flat_map(|outcome| outcome.failures().iter())
                .filter(|failure| failure.date().is_some_and(|date| period.contains(&date)))
                .cloned(),
        );

        debug!(%period, rows = rows.len(), "Realized report built");

        RealizedReport::new(
            *period,
            self.config.reporting_currency.clone(),
            rows,
            summary,
            failures,
        )
    }

    /// Values the open lots of every instrument at the latest price on or
    /// before `as_of`. Dividends received up to that day are attached to each
    /// position.
    pub fn unrealized<Q: QuoteProvider>(
        &self,
        ledger: &LedgerMatch,
        transactions: &[Transaction],
        quotes: &Q,
        as_of: NaiveDate,
    ) -> UnrealizedReport {
        let mut positions = Vec::new();
        let mut failures = ledger.failures().clone();

        for (instrument, outcome) in ledger.outcomes() {
            if outcome.open_lots().is_empty() {
                continue;
            }
            match self.position(outcome, transactions, quotes, as_of, &mut failures) {
                Ok(position) => positions.push(position),
                Err(err) => {
                    warn!(instrument = instrument.as_str(), error = %err, "Skipping open position");
                    failures.push(ReportFailure::from_error(instrument, &err));
                }
            }
        }

        let total_cost_basis = positions
            .iter()
            .map(|position| *position.cost_basis_reporting())
            .sum();
        let total_market_value = positions
            .iter()
            .map(|position| *position.market_value_reporting())
            .sum();
        let total_unrealized_gain = positions
            .iter()
            .map(|position| *position.unrealized_gain_reporting())
            .sum();

        UnrealizedReport::new(
            as_of,
            self.config.reporting_currency.clone(),
            positions,
            total_cost_basis,
            total_market_value,
            total_unrealized_gain,
            failures,
        )
    }

    /// Values one instrument's open lots. Dividends that cannot be converted
    /// are left out of the position's dividend total and added to `failures`.
    fn position<Q: QuoteProvider>(
        &self,
        outcome: &MatchOutcome,
        transactions: &[Transaction],
        quotes: &Q,
        as_of: NaiveDate,
        failures: &mut Vec<ReportFailure>,
    ) -> Result<UnrealizedPosition> {
        let instrument = outcome.instrument();
        let lots = outcome.open_lots();
        let reporting_currency = &self.config.reporting_currency;

        let price = quotes
            .get_price(instrument, as_of)
            .ok_or_else(|| TrackerError::QuoteUnavailable {
                instrument: instrument.clone(),
                date: as_of,
            })?;

        // Lots of one instrument share a currency; the matcher rejects mixing.
        let currency = lots
            .first()
            .map(|lot| lot.currency().clone())
            .unwrap_or_else(|| reporting_currency.clone());
        let quantity = outcome.open_quantity();
        let first_open_date = lots
            .iter()
            .map(|lot| *lot.open_date())
            .min()
            .unwrap_or(as_of);

        let cost_basis = self
            .converter
            .round(lots.iter().map(|lot| *lot.remaining_cost()).sum());
        let unrealized_gain = self.converter.round(
            lots.iter()
                .map(|lot| (price - lot.unit_cost()) * *lot.remaining())
                .sum(),
        );
        let market_value = cost_basis + unrealized_gain;
        let average_cost = if quantity.is_zero() {
            Decimal::ZERO
        } else {
            self.converter.round(cost_basis / quantity)
        };

        let cost_basis_reporting =
            self.converter
                .convert(cost_basis, &currency, as_of, reporting_currency)?;
        let market_value_reporting =
            self.converter
                .convert(market_value, &currency, as_of, reporting_currency)?;

        let mut dividends_reporting = Decimal::ZERO;
        for dividend in transactions.iter().filter(|transaction| {
            transaction.instrument() == instrument
                && *transaction.transaction_type() == TransactionType::Dividend
                && *transaction.trade_date() <= as_of
        }) {
            match self.converted_amount(dividend.amount(), dividend, reporting_currency) {
                Ok(amount) => dividends_reporting += amount,
                Err(err) => failures.push(self.event_failure(dividend, err)),
            }
        }

        Ok(UnrealizedPosition::new(
            instrument.clone(),
            currency,
            quantity,
            average_cost,
            price,
            cost_basis,
            market_value,
            unrealized_gain,
            cost_basis_reporting,
            market_value_reporting,
            market_value_reporting - cost_basis_reporting,
            dividends_reporting,
            first_open_date,
        ))
    }

    /// Dividends, withholding tax and fees whose trade date falls inside
    /// `period`, each converted with the rate of its own date. Events that
    /// cannot be converted are listed as failures and left out of the totals.
    pub fn income(&self, transactions: &[Transaction], period: &Period) -> IncomeReport {
        let reporting_currency = &self.config.reporting_currency;

        let mut ordered: Vec<&Transaction> = transactions
            .iter()
            .filter(|transaction| period.contains(transaction.trade_date()))
            .collect();
        ordered.sort_by_key(|transaction| transaction.sequence_key());

        let mut gross_dividends = Decimal::ZERO;
        let mut withholding_tax = Decimal::ZERO;
        let mut fees = Decimal::ZERO;
        let mut by_instrument: BTreeMap<String, InstrumentIncome> = BTreeMap::new();
        let mut failures = Vec::new();

        for transaction in ordered {
            let instrument = transaction.instrument();

            if *transaction.transaction_type() == TransactionType::Dividend {
                let amount = self.converter.round(transaction.amount());
                match self.converted_amount(amount, transaction, reporting_currency) {
                    Ok(amount_reporting) => {
                        if amount >= Decimal::ZERO {
                            gross_dividends += amount_reporting;
                        } else {
                            withholding_tax += amount_reporting.abs();
                        }
                        by_instrument.entry(instrument.clone()).or_default().add_dividend(
                            transaction.currency(),
                            amount,
                            amount_reporting,
                        );
                    }
                    Err(err) => failures.push(self.event_failure(transaction, err)),
                }
            }

            let fee = self.converter.round(*transaction.fees());
            if fee.is_zero() {
                continue;
            }
            match self.converted_amount(fee, transaction, reporting_currency) {
                Ok(fee_reporting) => {
                    fees += fee_reporting;
                    by_instrument.entry(instrument.clone()).or_default().add_fee(
                        transaction.currency(),
                        fee,
                        fee_reporting,
                    );
                }
                Err(err) => failures.push(self.event_failure(transaction, err)),
            }
        }

        debug!(%period, instruments = by_instrument.len(), "Income report built");

        IncomeReport::new(
            *period,
            reporting_currency.clone(),
            gross_dividends,
            withholding_tax,
            gross_dividends - withholding_tax,
            fees,
            by_instrument,
            failures,
        )
    }

    fn converted_amount(
        &self,
        amount: Decimal,
        transaction: &Transaction,
        target: &str,
    ) -> Result<Decimal> {
        self.converter
            .convert(amount, transaction.currency(), *transaction.trade_date(), target)
            .map_err(|err| {
                err.in_transaction(
                    transaction.instrument(),
                    *transaction.id(),
                    *transaction.trade_date(),
                )
            })
    }

    fn event_failure(&self, transaction: &Transaction, err: TrackerError) -> ReportFailure {
        warn!(
            instrument = transaction.instrument().as_str(),
            transaction_id = *transaction.id(),
            error = %err,
            "Leaving event out"
        );
        ReportFailure::from_error(transaction.instrument(), &err)
    }
}

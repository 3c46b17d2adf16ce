use std::collections::{BTreeMap, VecDeque};

use derive_getters::Getters;
use derive_new::new;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    app::converter::{CurrencyConverter, RateStore},
    config::ReportingConfig,
    errors::{Result, TrackerError},
    models::{Lot, MatchedGain, ReportFailure, Term, Transaction},
};

/// Matched slices and still-open lots of one instrument. Sales that matched
/// but could not be converted to the reporting currency are listed in
/// `failures` instead of `gains`.
#[derive(Clone, Debug, Getters, Serialize, new)]
pub struct MatchOutcome {
    instrument: String,
    gains: Vec<MatchedGain>,
    open_lots: Vec<Lot>,
    failures: Vec<ReportFailure>,
}

impl MatchOutcome {
    pub fn open_quantity(&self) -> Decimal {
        self.open_lots.iter().map(|lot| *lot.remaining()).sum()
    }

    pub fn matched_quantity(&self) -> Decimal {
        self.gains.iter().map(|gain| *gain.quantity()).sum()
    }
}

/// Part of a sale matched against one lot, in the trade currency.
struct Slice {
    lot: Lot,
    quantity: Decimal,
    proceeds: Decimal,
    cost: Decimal,
}

/// Every instrument of a ledger, matched independently. An instrument that
/// fails lands in `failures` and has no outcome.
#[derive(Clone, Debug, Default, Getters, Serialize)]
pub struct LedgerMatch {
    outcomes: BTreeMap<String, MatchOutcome>,
    failures: Vec<ReportFailure>,
}

pub struct LotMatcher<'a, S> {
    config: &'a ReportingConfig,
    converter: &'a CurrencyConverter<S>,
}

impl<'a, S: RateStore> LotMatcher<'a, S> {
    pub fn new(config: &'a ReportingConfig, converter: &'a CurrencyConverter<S>) -> Self {
        Self { config, converter }
    }

    pub fn match_ledger(&self, transactions: &[Transaction]) -> LedgerMatch {
        let mut by_instrument: BTreeMap<&str, Vec<&Transaction>> = BTreeMap::new();
        for transaction in transactions {
            by_instrument
                .entry(transaction.instrument().as_str())
                .or_default()
                .push(transaction);
        }

        let mut ledger = LedgerMatch::default();
        for (instrument, instrument_transactions) in by_instrument {
            match self.fifo(instrument, instrument_transactions) {
                Ok(outcome) => {
                    ledger.outcomes.insert(instrument.to_string(), outcome);
                }
                Err(err) => {
                    warn!(instrument, error = %err, "FIFO matching failed");
                    ledger
                        .failures
                        .push(ReportFailure::from_error(instrument, &err));
                }
            }
        }
        ledger
    }

    /// Runs FIFO matching for one instrument. Transactions are processed by
    /// trade date and time, ties broken by ascending id; those of other
    /// instruments are ignored.
    ///
    /// Lots are matched in the trade currency first. An oversell or a currency
    /// mismatch fails the whole instrument; a sale whose gain cannot be
    /// converted only drops that sale.
    pub fn fifo<'t>(
        &self,
        instrument: &str,
        transactions: impl IntoIterator<Item = &'t Transaction>,
    ) -> Result<MatchOutcome> {
        let mut ordered: Vec<&Transaction> = transactions
            .into_iter()
            .filter(|transaction| transaction.instrument() == instrument)
            .collect();
        ordered.sort_by_key(|transaction| transaction.sequence_key());

        let mut queue: VecDeque<Lot> = VecDeque::new();
        let mut gains = Vec::new();
        let mut failures = Vec::new();

        for transaction in ordered {
            if transaction.is_acquisition() {
                queue.push_back(Lot::open(transaction));
                continue;
            }
            if !transaction.is_disposal() {
                continue;
            }

            let slices = self
                .close(instrument, &mut queue, transaction)
                .map_err(|err| in_context(err, transaction))?;
            let converted: Result<Vec<MatchedGain>> = slices
                .into_iter()
                .map(|slice| self.matched_gain(slice, transaction))
                .collect();
            match converted {
                Ok(slices) => gains.extend(slices),
                Err(err) => {
                    let err = in_context(err, transaction);
                    warn!(instrument, error = %err, "Leaving unconverted sale out");
                    failures.push(ReportFailure::from_error(instrument, &err));
                }
            }
        }

        debug!(
            instrument,
            matched = gains.len(),
            open_lots = queue.len(),
            unconverted = failures.len(),
            "FIFO matching done"
        );

        Ok(MatchOutcome::new(
            instrument.to_string(),
            gains,
            queue.into_iter().collect(),
            failures,
        ))
    }

    fn close(
        &self,
        instrument: &str,
        queue: &mut VecDeque<Lot>,
        transaction: &Transaction,
    ) -> Result<Vec<Slice>> {
        let requested = transaction.quantity().abs();
        let available: Decimal = queue.iter().map(|lot| *lot.remaining()).sum();
        if requested > available {
            return Err(TrackerError::InsufficientLots {
                instrument: instrument.to_string(),
                transaction_id: *transaction.id(),
                date: *transaction.trade_date(),
                requested,
                available,
                deficit: requested - available,
            });
        }

        let fees = *transaction.fees();
        let mut fees_left = fees;
        let mut remaining = requested;
        let mut slices = Vec::new();

        while remaining > Decimal::ZERO {
            let Some(lot) = queue.front_mut() else {
                break;
            };
            if lot.currency() != transaction.currency() {
                return Err(TrackerError::CurrencyMismatch {
                    instrument: instrument.to_string(),
                    transaction_id: *transaction.id(),
                    expected: lot.currency().clone(),
                    found: transaction.currency().clone(),
                });
            }

            let quantity = remaining.min(*lot.remaining());
            let cost = lot.consume(quantity);
            remaining -= quantity;

            // Last slice of the sell takes whatever fee is left.
            let fee_share = if remaining.is_zero() {
                fees_left
            } else {
                fees * quantity / requested
            };
            fees_left -= fee_share;

            slices.push(Slice {
                lot: lot.clone(),
                quantity,
                proceeds: quantity * *transaction.price() - fee_share,
                cost,
            });

            if lot.is_closed() {
                queue.pop_front();
            }
        }

        Ok(slices)
    }

    fn matched_gain(&self, slice: Slice, transaction: &Transaction) -> Result<MatchedGain> {
        let Slice {
            lot,
            quantity,
            proceeds,
            cost,
        } = slice;
        let close_date = *transaction.trade_date();
        let currency = transaction.currency();
        let reporting_currency = &self.config.reporting_currency;

        let proceeds = self.converter.round(proceeds);
        let cost = self.converter.round(cost);
        let proceeds_reporting =
            self.converter
                .convert(proceeds, currency, close_date, reporting_currency)?;
        let cost_reporting = self
            .converter
            .convert(cost, currency, close_date, reporting_currency)?;

        let holding_days = (close_date - *lot.open_date()).num_days();

        Ok(MatchedGain::new(
            lot.instrument().clone(),
            *lot.asset_category(),
            *lot.opening_transaction_id(),
            *transaction.id(),
            *lot.open_date(),
            close_date,
            quantity,
            currency.clone(),
            proceeds,
            cost,
            proceeds - cost,
            reporting_currency.clone(),
            proceeds_reporting,
            cost_reporting,
            proceeds_reporting - cost_reporting,
            holding_days,
            Term::classify(holding_days, self.config.long_term_days),
        ))
    }
}

fn in_context(err: TrackerError, transaction: &Transaction) -> TrackerError {
    err.in_transaction(
        transaction.instrument(),
        *transaction.id(),
        *transaction.trade_date(),
    )
}

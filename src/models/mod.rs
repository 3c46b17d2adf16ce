pub mod exchange_rate;
pub mod lot;
pub mod matched_gain;
pub mod period;
pub mod price;
pub mod report;
pub mod transaction;

pub use exchange_rate::{CurrencyPair, ExchangeRate};
pub use lot::Lot;
pub use matched_gain::{MatchedGain, Term};
pub use period::Period;
pub use price::Price;
pub use report::{
    GainTotals, IncomeReport, InstrumentIncome, InstrumentSummary, PeriodSummary, RealizedReport,
    ReportFailure, UnrealizedPosition, UnrealizedReport,
};
pub use transaction::{AssetCategory, NewTransaction, Transaction, TransactionType};

pub mod aggregator;
pub mod calc;
pub mod converter;
pub mod import;
pub mod portfolio;
pub mod prices;
pub mod render;
pub mod utils;

pub use aggregator::Aggregator;
pub use calc::{LedgerMatch, LotMatcher, MatchOutcome};
pub use converter::{ConverterConfig, CurrencyConverter, RateStore, RateTable};
pub use portfolio::{Portfolio, Snapshot};
pub use prices::{PriceTable, QuoteProvider};

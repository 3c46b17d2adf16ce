pub mod init;
pub mod read;
pub mod utils;
pub mod write;

pub use init::init_tables;
pub use read::{get_rate, list_prices, list_rates, list_tax_years, list_transactions};
pub use write::{insert_prices, insert_rates, insert_transaction, truncate_tables};

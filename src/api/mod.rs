pub mod frank;
pub mod frank_dto;
pub mod utils;

pub use frank::get_forex_history;
pub use frank_dto::FrankTimeSeriesDto;

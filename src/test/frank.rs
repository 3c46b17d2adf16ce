#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::{
        api::frank_dto::FrankTimeSeriesDto,
        test::fixtures::date,
    };

    const RESPONSE: &str = r#"{
        "amount": 1.0,
        "base": "USD",
        "start_date": "2024-01-02",
        "end_date": "2024-01-05",
        "rates": {
            "2024-01-02": {"EUR": 0.5},
            "2024-01-03": {"EUR": 1.25},
            "2024-01-04": {"GBP": 0.75}
        }
    }"#;

    #[test]
    fn converts_time_series_to_rates() {
        let dto: FrankTimeSeriesDto = serde_json::from_str(RESPONSE).unwrap();

        let rates = dto.to_exchange_rates("eur");

        assert_eq!(dto.base(), "USD");
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].pair().to_string(), "USD/EUR");
        assert_eq!(*rates[0].date(), date(2024, 1, 2));
        assert_eq!(*rates[0].rate(), dec!(0.5));
        assert_eq!(*rates[1].date(), date(2024, 1, 3));
        assert_eq!(*rates[1].rate(), dec!(1.25));
    }
}

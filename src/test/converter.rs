#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::{
        app::converter::{RateStore, RateTable},
        errors::TrackerError,
        models::CurrencyPair,
        test::fixtures::{converter, date, rate},
    };

    #[test]
    fn same_currency_is_returned_unchanged() {
        let converter = converter(vec![]);

        let amount = converter
            .convert(dec!(123.456), "USD", date(2024, 1, 1), "usd")
            .unwrap();

        assert_eq!(amount, dec!(123.456));
    }

    #[test]
    fn falls_back_to_prior_rate_only() {
        let converter = converter(vec![
            rate("USD", "EUR", date(2024, 1, 1), dec!(0.9)),
            rate("USD", "EUR", date(2024, 1, 5), dec!(0.95)),
        ]);

        let resolved = converter.rate("USD", "EUR", date(2024, 1, 3)).unwrap();
        assert_eq!(resolved.rate, dec!(0.9));
        assert_eq!(resolved.observed_on, date(2024, 1, 1));
        assert!(!resolved.inverted);

        let exact = converter.rate("USD", "EUR", date(2024, 1, 5)).unwrap();
        assert_eq!(exact.rate, dec!(0.95));

        let err = converter
            .convert(dec!(10), "USD", date(2023, 12, 31), "EUR")
            .unwrap_err();
        match err {
            TrackerError::RateUnavailable { pair, date: day } => {
                assert_eq!(pair, CurrencyPair::new("USD", "EUR"));
                assert_eq!(day, date(2023, 12, 31));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn round_trip_stays_within_one_unit() {
        let converter = converter(vec![rate("USD", "EUR", date(2024, 1, 2), dec!(0.9))]);
        let day = date(2024, 1, 2);

        let eur = converter.convert(dec!(100), "USD", day, "EUR").unwrap();
        assert_eq!(eur, dec!(90.00));

        let usd = converter.convert(eur, "EUR", day, "USD").unwrap();
        assert!((usd - dec!(100)).abs() <= dec!(0.01));
    }

    #[test]
    fn direct_rate_wins_over_inverse() {
        let converter = converter(vec![
            rate("USD", "EUR", date(2024, 1, 1), dec!(0.9)),
            rate("EUR", "USD", date(2024, 1, 3), dec!(1.25)),
        ]);

        let resolved = converter.rate("USD", "EUR", date(2024, 1, 3)).unwrap();
        assert_eq!(resolved.rate, dec!(0.9));
        assert!(!resolved.inverted);
    }

    #[test]
    fn inverse_rate_is_used_when_no_direct_rate() {
        let converter = converter(vec![rate("EUR", "USD", date(2024, 1, 1), dec!(1.25))]);

        let resolved = converter.rate("USD", "EUR", date(2024, 1, 2)).unwrap();
        assert_eq!(resolved.rate, dec!(0.8));
        assert!(resolved.inverted);

        let amount = converter
            .convert(dec!(50), "USD", date(2024, 1, 2), "EUR")
            .unwrap();
        assert_eq!(amount, dec!(40.00));
    }

    #[test]
    fn rounds_half_to_even() {
        let converter = converter(vec![rate("USD", "CHF", date(2024, 1, 1), dec!(1))]);
        let day = date(2024, 1, 1);

        assert_eq!(converter.convert(dec!(0.125), "USD", day, "CHF").unwrap(), dec!(0.12));
        assert_eq!(converter.convert(dec!(0.135), "USD", day, "CHF").unwrap(), dec!(0.14));
        assert_eq!(converter.convert(dec!(-0.125), "USD", day, "CHF").unwrap(), dec!(-0.12));
    }

    #[test]
    fn rate_table_keeps_first_rate_per_day() {
        let pair = CurrencyPair::new("usd", "eur");
        let table = RateTable::from_rates(vec![
            rate("USD", "EUR", date(2024, 1, 1), dec!(0.9)),
            rate("USD", "EUR", date(2024, 1, 1), dec!(0.7)),
            rate("USD", "USD", date(2024, 1, 1), dec!(1)),
            rate("GBP", "EUR", date(2024, 1, 1), dec!(0)),
        ]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get_rate(&pair, date(2024, 1, 1)), Some(dec!(0.9)));
        assert_eq!(table.get_rate(&pair, date(2024, 1, 2)), None);
        assert_eq!(
            table.latest_on_or_before(&pair, date(2024, 1, 2)),
            Some((date(2024, 1, 1), dec!(0.9)))
        );
    }
}

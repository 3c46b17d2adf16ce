#[cfg(test)]
mod tests {
    use crate::{errors::TrackerError, models::Period, test::fixtures::date};

    #[test]
    fn parses_calendar_year() {
        let period = Period::parse("2024", date(2025, 3, 1)).unwrap();

        assert_eq!(*period.start(), date(2024, 1, 1));
        assert_eq!(*period.end(), date(2024, 12, 31));
        assert_eq!(period.to_string(), "2024-01-01..2024-12-31");
    }

    #[test]
    fn parses_year_to_date() {
        let period = Period::parse("YTD", date(2024, 5, 10)).unwrap();

        assert_eq!(*period.start(), date(2024, 1, 1));
        assert_eq!(*period.end(), date(2024, 5, 10));
        assert!(period.contains(&date(2024, 5, 10)));
        assert!(!period.contains(&date(2024, 5, 11)));
    }

    #[test]
    fn parses_explicit_range() {
        let period = Period::parse("2024-01-01..2024-06-30", date(2025, 1, 1)).unwrap();

        assert_eq!(*period.start(), date(2024, 1, 1));
        assert_eq!(*period.end(), date(2024, 6, 30));
    }

    #[test]
    fn rejects_bad_input() {
        let today = date(2024, 1, 1);

        for input in ["1899", "2101", "last year", "2024-06-30..2024-01-01", "2024-13-01..2024-12-31"] {
            let err = Period::parse(input, today).unwrap_err();
            assert!(
                matches!(err, TrackerError::InvalidPeriod(_)),
                "{} gave {:?}",
                input,
                err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::{
        config::{
            Config, DATABASE_URL_VAR, DECIMAL_PLACES_VAR, LONG_TERM_DAYS_VAR, MAX_TAX_YEARS_VAR,
            REPORTING_CURRENCY_VAR,
        },
        errors::TrackerError,
    };

    fn from_vars(vars: &[(&str, &str)]) -> Result<Config, TrackerError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = from_vars(&[]).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.database_url(), "portfolio.db");
        assert_eq!(config.reporting_currency(), "EUR");
        assert_eq!(*config.long_term_days(), 365);
        assert_eq!(config.converter().decimal_places, 2);
        assert_eq!(*config.max_tax_years(), 10);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = from_vars(&[
            (DATABASE_URL_VAR, "/tmp/ledger.db"),
            (REPORTING_CURRENCY_VAR, " usd "),
            (LONG_TERM_DAYS_VAR, "730"),
            (DECIMAL_PLACES_VAR, "4"),
            (MAX_TAX_YEARS_VAR, "5"),
        ])
        .unwrap();

        assert_eq!(config.database_url(), "/tmp/ledger.db");
        assert_eq!(config.reporting().reporting_currency, "USD");
        assert_eq!(config.reporting().long_term_days, 730);
        assert_eq!(config.converter().decimal_places, 4);
        assert_eq!(*config.max_tax_years(), 5);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for vars in [
            vec![(REPORTING_CURRENCY_VAR, "EURO")],
            vec![(LONG_TERM_DAYS_VAR, "0")],
            vec![(LONG_TERM_DAYS_VAR, "a year")],
            vec![(DECIMAL_PLACES_VAR, "12")],
            vec![(MAX_TAX_YEARS_VAR, "0")],
        ] {
            let err = from_vars(&vars).unwrap_err();
            assert!(matches!(err, TrackerError::Config(_)), "{:?}", vars);
        }
    }

    #[test]
    fn cli_currency_is_validated() {
        let config = Config::default().with_reporting_currency("chf").unwrap();
        assert_eq!(config.reporting_currency(), "CHF");

        assert!(Config::default().with_reporting_currency("").is_err());
    }
}

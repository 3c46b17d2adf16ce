#[cfg(test)]
mod tests {
    use std::io::Write;

    use rust_decimal_macros::dec;
    use sqlx::{Pool, Sqlite, sqlite::SqlitePoolOptions};
    use tempfile::NamedTempFile;

    use crate::{
        app::portfolio::{Portfolio, write_ledger},
        config::Config,
        db,
        models::{AssetCategory, CurrencyPair, NewTransaction, Period, Price, TransactionType},
        test::fixtures::{date, rate, time, transaction},
    };

    async fn memory_pool() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::init_tables(&pool).await.unwrap();
        pool
    }

    fn new_transaction(
        instrument: &str,
        transaction_type: TransactionType,
        quantity: rust_decimal::Decimal,
        trade_date: chrono::NaiveDate,
    ) -> NewTransaction {
        NewTransaction::new(
            instrument.to_string(),
            transaction_type,
            quantity,
            dec!(101.123456789),
            String::from("USD"),
            trade_date,
            chrono::NaiveTime::MIN,
            trade_date,
            dec!(0.1),
            AssetCategory::Etf,
            String::from("test"),
        )
    }

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn transactions_round_trip_in_order() {
        let pool = memory_pool().await;

        let mut tx = pool.begin().await.unwrap();
        let later = db::insert_transaction(
            &new_transaction("VOO", TransactionType::Sell, dec!(-1.5), date(2024, 2, 1)),
            &mut tx,
        )
        .await
        .unwrap();
        let earlier = db::insert_transaction(
            &new_transaction("VOO", TransactionType::Buy, dec!(2.25), date(2024, 1, 1)),
            &mut tx,
        )
        .await
        .unwrap();
        let other = db::insert_transaction(
            &new_transaction("BND", TransactionType::Buy, dec!(4), date(2024, 1, 1)),
            &mut tx,
        )
        .await
        .unwrap();
        let duplicate = db::insert_transaction(
            &new_transaction("VOO", TransactionType::Buy, dec!(2.250), date(2024, 1, 1)),
            &mut tx,
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        assert!(later.is_some() && earlier.is_some() && other.is_some());
        assert!(duplicate.is_none());

        let all = db::list_transactions(&pool, None, None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(Some(*all[0].id()), earlier);
        assert_eq!(Some(*all[1].id()), other);
        assert_eq!(Some(*all[2].id()), later);
        assert_eq!(*all[0].quantity(), dec!(2.25));
        assert_eq!(*all[0].price(), dec!(101.123456789));
        assert_eq!(*all[0].fees(), dec!(0.1));
        assert_eq!(*all[0].asset_category(), AssetCategory::Etf);
        assert_eq!(*all[2].transaction_type(), TransactionType::Sell);

        let voo = db::list_transactions(&pool, Some("voo"), None).await.unwrap();
        assert_eq!(voo.len(), 2);

        let january = Period::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        let in_january = db::list_transactions(&pool, Some("VOO"), Some(&january))
            .await
            .unwrap();
        assert_eq!(in_january.len(), 1);
        assert_eq!(Some(*in_january[0].id()), earlier);
    }

    #[tokio::test]
    async fn rates_and_prices_round_trip() {
        let pool = memory_pool().await;
        let rates = vec![
            rate("USD", "EUR", date(2024, 1, 2), dec!(0.9123)),
            rate("USD", "EUR", date(2024, 1, 3), dec!(0.915)),
        ];

        assert_eq!(db::insert_rates(&pool, &rates).await.unwrap(), 2);
        assert_eq!(db::insert_rates(&pool, &rates).await.unwrap(), 0);

        let pair = CurrencyPair::new("USD", "EUR");
        assert_eq!(
            db::get_rate(&pool, &pair, date(2024, 1, 2)).await.unwrap(),
            Some(dec!(0.9123))
        );
        assert_eq!(db::get_rate(&pool, &pair, date(2024, 1, 4)).await.unwrap(), None);
        assert_eq!(db::list_rates(&pool).await.unwrap(), rates);

        let prices = vec![
            Price::new(String::from("AAPL"), date(2024, 1, 2), dec!(185.64)),
            Price::new(String::from("AAPL"), date(2024, 1, 2), dec!(186.00)),
        ];
        db::insert_prices(&pool, &prices).await.unwrap();
        let stored = db::list_prices(&pool).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(*stored[0].price(), dec!(186));
    }

    #[tokio::test]
    async fn tax_years_cover_current_and_traded_years() {
        let pool = memory_pool().await;
        let mut tx = pool.begin().await.unwrap();
        for year in [2010, 2019, 2021] {
            db::insert_transaction(
                &new_transaction("VOO", TransactionType::Buy, dec!(1), date(year, 6, 1)),
                &mut tx,
            )
            .await
            .unwrap();
        }
        tx.commit().await.unwrap();

        let years = db::list_tax_years(&pool, 10, date(2024, 5, 1)).await.unwrap();

        assert_eq!(years, vec![2024, 2021, 2019]);
    }

    #[tokio::test]
    async fn truncate_keeps_market_data_unless_asked() {
        let pool = memory_pool().await;
        let mut tx = pool.begin().await.unwrap();
        db::insert_transaction(
            &new_transaction("VOO", TransactionType::Buy, dec!(1), date(2024, 1, 1)),
            &mut tx,
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        db::insert_rates(&pool, &[rate("USD", "EUR", date(2024, 1, 2), dec!(0.9))])
            .await
            .unwrap();

        db::truncate_tables(&pool, false).await.unwrap();
        assert!(db::list_transactions(&pool, None, None).await.unwrap().is_empty());
        assert_eq!(db::list_rates(&pool).await.unwrap().len(), 1);

        db::truncate_tables(&pool, true).await.unwrap();
        assert!(db::list_rates(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn portfolio_imports_and_reports() {
        let pool = memory_pool().await;
        let portfolio = Portfolio::new(pool, Config::default());

        let transactions = csv_file(
            "Date,Type,Sub Type,Action,Symbol,Instrument Type,Description,Value,Quantity,Average Price,Commissions,Fees,Currency\n\
             2023-03-01,Trade,Buy to Open,BUY_TO_OPEN,AAPL,Equity,Bought,-1000.00,10,-100.00,0,0,USD\n\
             2024-03-04,Trade,Sell to Close,SELL_TO_CLOSE,AAPL,Equity,Sold,600.00,4,150.00,0,0,USD\n\
             2024-04-02,Money Movement,Dividend,,AAPL,Equity,Dividend,5.00,0,--,0,0,USD\n",
        );
        let rates = csv_file("date,from,to,rate\n2023-01-02,USD,EUR,0.9\n");
        let prices = csv_file("date,symbol,price\n2024-06-28,AAPL,200\n");
        let path = transactions.path().to_str().unwrap();

        let first = portfolio.import_transactions(path, false).await.unwrap();
        assert_eq!(*first.imported(), 3);
        assert_eq!(*first.duplicates(), 0);

        let second = portfolio.import_transactions(path, false).await.unwrap();
        assert_eq!(*second.imported(), 0);
        assert_eq!(*second.duplicates(), 3);

        portfolio
            .import_rates(rates.path().to_str().unwrap())
            .await
            .unwrap();
        portfolio
            .import_prices(prices.path().to_str().unwrap())
            .await
            .unwrap();

        let realized = portfolio
            .realized_report(&Period::year(2024).unwrap())
            .await
            .unwrap();
        assert_eq!(realized.rows().len(), 1);
        assert_eq!(*realized.summary().long_term().net(), dec!(180.00));

        let unrealized = portfolio.unrealized_report(date(2024, 6, 30)).await.unwrap();
        assert_eq!(*unrealized.total_unrealized_gain(), dec!(540.00));
        assert_eq!(*unrealized.positions()[0].dividends_reporting(), dec!(4.50));

        let income = portfolio
            .income_report(&Period::year(2024).unwrap())
            .await
            .unwrap();
        assert_eq!(*income.gross_dividends(), dec!(4.50));

        let years = portfolio.tax_years(date(2024, 12, 1)).await.unwrap();
        assert_eq!(years.available_years(), &vec![2024, 2023]);
    }

    const HEADER: &str = "Date,Type,Sub Type,Action,Symbol,Instrument Type,Description,Value,Quantity,Average Price,Commissions,Fees,Currency";

    #[tokio::test]
    async fn intraday_round_trip_from_newest_first_export() {
        let pool = memory_pool().await;
        let portfolio = Portfolio::new(pool.clone(), Config::default());

        let transactions = csv_file(
            &[
                HEADER,
                "2024-03-04T15:00:00-0500,Trade,Sell to Close,SELL_TO_CLOSE,AAPL,Equity,Sold,680.00,4,170.00,0,0,USD",
                "2024-03-04T10:00:00-0500,Trade,Buy to Open,BUY_TO_OPEN,AAPL,Equity,Bought,-600.00,4,-150.00,0,0,USD",
            ]
            .join("\n"),
        );
        let rates = csv_file("date,from,to,rate\n2024-01-02,USD,EUR,0.9\n");

        portfolio
            .import_transactions(transactions.path().to_str().unwrap(), false)
            .await
            .unwrap();
        portfolio
            .import_rates(rates.path().to_str().unwrap())
            .await
            .unwrap();

        let stored = db::list_transactions(&pool, None, None).await.unwrap();
        assert_eq!(*stored[0].transaction_type(), TransactionType::Buy);
        assert_eq!(*stored[0].trade_time(), time(10, 0));
        assert_eq!(*stored[1].trade_time(), time(15, 0));

        let realized = portfolio
            .realized_report(&Period::year(2024).unwrap())
            .await
            .unwrap();
        assert!(realized.failures().is_empty());
        assert_eq!(realized.rows().len(), 1);
        assert_eq!(*realized.summary().short_term().net(), dec!(72.00));
    }

    #[tokio::test]
    async fn same_day_rows_order_by_time_not_id() {
        let pool = memory_pool().await;
        let day = date(2024, 5, 2);
        let sell = NewTransaction::new(
            String::from("MSFT"),
            TransactionType::Sell,
            dec!(-1),
            dec!(410),
            String::from("USD"),
            day,
            time(15, 30),
            day,
            dec!(0),
            AssetCategory::Stock,
            String::new(),
        );
        let buy = NewTransaction::new(
            String::from("MSFT"),
            TransactionType::Buy,
            dec!(1),
            dec!(400),
            String::from("USD"),
            day,
            time(9, 45),
            day,
            dec!(0),
            AssetCategory::Stock,
            String::new(),
        );

        let mut tx = pool.begin().await.unwrap();
        let sell_id = db::insert_transaction(&sell, &mut tx).await.unwrap();
        let buy_id = db::insert_transaction(&buy, &mut tx).await.unwrap();
        tx.commit().await.unwrap();
        assert!(sell_id < buy_id);

        let stored = db::list_transactions(&pool, Some("MSFT"), None).await.unwrap();
        assert_eq!(Some(*stored[0].id()), buy_id);
        assert_eq!(Some(*stored[1].id()), sell_id);
    }

    #[tokio::test]
    async fn lists_and_exports_filtered_ledger() {
        let pool = memory_pool().await;
        let portfolio = Portfolio::new(pool, Config::default());

        let transactions = csv_file(
            &[
                HEADER,
                "2023-03-01,Trade,Buy to Open,BUY_TO_OPEN,AAPL,Equity,Bought,-1000.00,10,-100.00,0,0,USD",
                "2024-03-04,Trade,Sell to Close,SELL_TO_CLOSE,AAPL,Equity,Sold,600.00,4,150.00,0,0,USD",
                "2024-03-05,Trade,Buy to Open,BUY_TO_OPEN,MSFT,Equity,Bought,-400.00,1,-400.00,0,0,USD",
            ]
            .join("\n"),
        );
        portfolio
            .import_transactions(transactions.path().to_str().unwrap(), false)
            .await
            .unwrap();

        let year = Period::year(2024).unwrap();
        let aapl_2024 = portfolio.transactions(Some("aapl"), Some(&year)).await.unwrap();
        assert_eq!(aapl_2024.len(), 1);
        assert_eq!(*aapl_2024[0].transaction_type(), TransactionType::Sell);
        assert_eq!(portfolio.transactions(None, Some(&year)).await.unwrap().len(), 2);

        let export = NamedTempFile::new().unwrap();
        let exported = portfolio
            .export_transactions(export.path().to_str().unwrap(), Some("AAPL"), None)
            .await
            .unwrap();
        assert_eq!(exported, 2);

        let written = std::fs::read_to_string(export.path()).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("id,instrument,transaction_type,quantity,price,currency,trade_date,trade_time,settlement_date,fees,asset_category,description")
        );
        let first = lines.next().unwrap();
        assert!(first.contains(",AAPL,Buy,10,100,USD,2023-03-01,00:00:00,2023-03-01,"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn empty_ledger_writes_nothing() {
        let mut out = Vec::new();
        write_ledger(&mut out, &[]).unwrap();
        assert!(out.is_empty());

        write_ledger(
            &mut out,
            &[transaction(7, "KO", TransactionType::Dividend, dec!(1), dec!(-0.5), date(2024, 4, 1))],
        )
        .unwrap();
        let written = String::from_utf8(out).unwrap();
        assert!(written.ends_with("7,KO,Dividend,1,-0.5,USD,2024-04-01,00:00:00,2024-04-01,0,Stock,\n"));
    }
}

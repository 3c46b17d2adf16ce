use anyhow::{Error, Result};
use chrono::NaiveDate;
use reqwest::Client;
use tracing::info;

use super::{
    frank_dto::FrankTimeSeriesDto,
    utils::{make_request, parse_response_object},
};

pub const FRANKFURTER_URL: &str = "https://api.frankfurter.app";

pub async fn get_forex_history(
    from_currency: &str,
    to_currency: &str,
    start: NaiveDate,
    end: NaiveDate,
    client: &Client,
) -> Result<FrankTimeSeriesDto> {
    if start > end {
        return Err(Error::msg(format!(
            "Start date {} is after end date {}",
            start, end
        )));
    }

    let endpoint = format!("{}..{}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"));
    let params = format!(
        "from={}&to={}",
        from_currency.to_uppercase(),
        to_currency.to_uppercase()
    );
    info!(from = from_currency, to = to_currency, %start, %end, "Downloading exchange rates");

    let res = make_request(client, FRANKFURTER_URL, &endpoint, &params).await?;
    parse_response_object::<FrankTimeSeriesDto>(
        res,
        &format!(
            "No exchange rates between {} and {} from {} to {}",
            start, end, from_currency, to_currency
        ),
    )
    .await
}

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::traits::MarketDataProvider;
use crate::errors::CoreError;
use crate::models::price::{normalize_series, PricePoint, PriceQuote};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER: &str = "Alpha Vantage";

/// "compact" returns the latest 100 trading days (~140 calendar days).
const COMPACT_CALENDAR_DAYS: i64 = 140;

/// Alpha Vantage provider, used as a fallback for equity quotes and history.
///
/// - **Free tier**: 25 requests/day (across ALL endpoints).
/// - **Requires**: API key (settings key "alphavantage").
/// - **Coverage**: US listings; Canadian tickers use the `.TRT` suffix there,
///   so `.TO` symbols usually come back empty and are skipped.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, api_key }
    }

    /// Fetch the daily time series for a symbol, sized to cover `from`.
    async fn fetch_daily_series(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<String, DailyData>, CoreError> {
        let output_size = if (to - from).num_days() <= COMPACT_CALENDAR_DAYS {
            "compact"
        } else {
            "full"
        };

        let resp: TimeSeriesResponse = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", &symbol.to_uppercase()),
                ("outputsize", output_size),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to parse time series for {symbol}: {e}"),
            })?;

        if let Some(note) = resp.note.or(resp.information) {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: note,
            });
        }

        // An "Error Message" body means the symbol is unknown: no data, not a failure.
        Ok(resp.time_series.unwrap_or_default())
    }
}

// ── Alpha Vantage API response types ────────────────────────────────

#[derive(Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "08. previous close")]
    previous_close: Option<String>,
}

#[derive(Deserialize)]
struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, DailyData>>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Deserialize)]
struct DailyData {
    #[serde(rename = "4. close")]
    close: String,
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_quote(&self, symbol: &str) -> Result<Option<PriceQuote>, CoreError> {
        let resp: GlobalQuoteResponse = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", &symbol.to_uppercase()),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to parse quote for {symbol}: {e}"),
            })?;

        if let Some(note) = resp.note.or(resp.information) {
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: note,
            });
        }

        // Unknown symbols come back as an empty "Global Quote" object.
        let Some(quote) = resp.global_quote else {
            return Ok(None);
        };
        let Some(price) = quote.price.as_deref().and_then(|p| p.parse::<f64>().ok()) else {
            return Ok(None);
        };
        let previous = quote
            .previous_close
            .as_deref()
            .and_then(|p| p.parse::<f64>().ok())
            .unwrap_or(price);

        Ok(Some(PriceQuote::new(symbol, price, previous)))
    }

    async fn get_history(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let time_series = self.fetch_daily_series(symbol, from, to).await?;

        let points: Vec<PricePoint> = time_series
            .iter()
            .filter_map(|(date_str, data)| {
                let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
                if date >= from && date <= to {
                    let price: f64 = data.close.parse().ok()?;
                    Some(PricePoint { date, price })
                } else {
                    None
                }
            })
            .collect();

        Ok(normalize_series(points))
    }
}

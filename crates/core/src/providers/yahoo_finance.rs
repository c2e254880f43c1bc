use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use time::OffsetDateTime;
use tracing::debug;

use super::traits::{ExchangeRateProvider, MarketDataProvider};
use crate::errors::CoreError;
use crate::models::holding::Currency;
use crate::models::price::{normalize_series, PricePoint, PriceQuote};

const PROVIDER: &str = "Yahoo Finance";

/// Yahoo Finance ticker quoting CAD per 1 USD.
const USD_CAD_TICKER: &str = "CAD=X";

/// Yahoo Finance provider for equities, ETFs, options and FX.
///
/// - **Free**: No API key required.
/// - **Coverage**: US and Canadian listings (`.TO`, `.NE`), option contracts.
/// - **Data**: Daily closes in the listing's native currency.
///
/// Uses the `yahoo_finance_api` crate. Also serves the USD/CAD rate through
/// the `CAD=X` ticker, so a single provider is enough for a full run.
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to create connector: {e}"),
        })?;
        Ok(Self { connector })
    }

    /// Convert a `chrono::NaiveDate` to `time::OffsetDateTime` (midnight UTC).
    fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, CoreError> {
        let month = u8::try_from(date.month())
            .ok()
            .and_then(|m| time::Month::try_from(m).ok())
            .ok_or_else(|| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Invalid month in {date}"),
            })?;
        let day = u8::try_from(date.day()).map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Invalid day in {date}: {e}"),
        })?;

        let odt = time::Date::from_calendar_date(date.year(), month, day)
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Invalid date {date}: {e}"),
            })?
            .with_hms(0, 0, 0)
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Invalid time for {date}: {e}"),
            })?
            .assume_utc();
        Ok(odt)
    }

    /// Convert a unix timestamp (seconds) to `chrono::NaiveDate`.
    fn timestamp_to_naive_date(ts: i64) -> Option<NaiveDate> {
        chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
    }

    /// Yahoo reports missing closes as 0 or NaN; those are not prices.
    fn is_valid_close(close: f64) -> bool {
        close.is_finite() && close > 0.0
    }

    async fn latest_close(&self, ticker: &str) -> Result<f64, CoreError> {
        let resp = self
            .connector
            .get_latest_quotes(ticker, "1d")
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to fetch latest quote for {ticker}: {e}"),
            })?;

        let quote = resp.last_quote().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("No quote data for {ticker}: {e}"),
        })?;

        Ok(quote.close)
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_quote(&self, symbol: &str) -> Result<Option<PriceQuote>, CoreError> {
        // A few days of daily bars covers weekends and holidays.
        let resp = self
            .connector
            .get_quote_range(symbol, "1d", "5d")
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to fetch recent quotes for {symbol}: {e}"),
            })?;

        let quotes = match resp.quotes() {
            Ok(quotes) => quotes,
            Err(e) => {
                debug!(symbol, error = %e, "yahoo returned no quotes");
                return Ok(None);
            }
        };

        let mut closes: Vec<(i64, f64)> = quotes
            .iter()
            .filter(|q| Self::is_valid_close(q.close))
            .map(|q| (q.timestamp, q.close))
            .collect();
        closes.sort_by_key(|(ts, _)| *ts);
        let closes: Vec<f64> = closes.into_iter().map(|(_, close)| close).collect();

        Ok(PriceQuote::from_closes(symbol, &closes))
    }

    async fn get_history(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let start = Self::to_offset_datetime(from)?;
        let end = Self::to_offset_datetime(to + chrono::Duration::days(1))?; // inclusive end

        let resp = self
            .connector
            .get_quote_history(symbol, start, end)
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to fetch history range for {symbol}: {e}"),
            })?;

        let quotes = match resp.quotes() {
            Ok(quotes) => quotes,
            Err(e) => {
                debug!(symbol, error = %e, "yahoo returned no history");
                return Ok(Vec::new());
            }
        };

        let points: Vec<PricePoint> = quotes
            .iter()
            .filter(|q| Self::is_valid_close(q.close))
            .filter_map(|q| {
                let date = Self::timestamp_to_naive_date(q.timestamp)?;
                (date >= from && date <= to).then_some(PricePoint {
                    date,
                    price: q.close,
                })
            })
            .collect();

        Ok(normalize_series(points))
    }
}

#[async_trait]
impl ExchangeRateProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_rate(&self, base: Currency, quote: Currency) -> Result<f64, CoreError> {
        if base == quote {
            return Ok(1.0);
        }
        let usd_cad = self.latest_close(USD_CAD_TICKER).await?;
        match base {
            Currency::Usd => Ok(usd_cad),
            Currency::Cad if usd_cad == 0.0 => Err(CoreError::InvalidExchangeRate(usd_cad)),
            Currency::Cad => Ok(1.0 / usd_cad),
        }
    }
}

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::holding::Currency;
use crate::models::price::{PricePoint, PriceQuote};

/// Source of security prices (Yahoo Finance, Alpha Vantage, test mocks).
///
/// "No data" is a normal answer, not an error: `get_quote` returns
/// `Ok(None)` and `get_history` an empty `Vec`. Errors are reserved for
/// transport or parsing failures; the price service falls back to the next
/// provider on either.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Latest close and the close before it.
    async fn get_quote(&self, symbol: &str) -> Result<Option<PriceQuote>, CoreError>;

    /// Daily closes in `[from, to]`, sorted by date.
    async fn get_history(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError>;
}

/// Source of the spot exchange rate used for every conversion of a run.
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Units of `quote` per one unit of `base` (USD→CAD ≈ 1.35).
    async fn get_rate(&self, base: Currency, quote: Currency) -> Result<f64, CoreError>;
}

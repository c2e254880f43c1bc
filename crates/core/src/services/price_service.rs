use chrono::NaiveDate;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::holding::Currency;
use crate::models::price::{MarketDataCache, PricePoint, PriceQuote};
use crate::providers::registry::ProviderRegistry;
use crate::services::currency_service::ExchangeRate;

/// Fetches quotes, histories and the exchange rate from the registered
/// providers, in priority order.
///
/// Quote and history lookups never fail: when every provider errors or
/// returns nothing, the result is `None` / an empty series and the caller
/// skips the symbol. Each lookup is memoized in a per-run
/// [`MarketDataCache`] and never retried.
///
/// The exchange rate is different: without it nothing can be converted, so
/// [`PriceService::get_exchange_rate`] fails the run.
pub struct PriceService {
    registry: ProviderRegistry,
}

impl PriceService {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// USD→CAD rate from the first provider that returns a usable one.
    pub async fn get_exchange_rate(&self) -> Result<ExchangeRate, CoreError> {
        let providers = self.registry.exchange_rate_providers();
        let mut last_error: Option<CoreError> = None;

        for provider in providers {
            match provider.get_rate(Currency::Usd, Currency::Cad).await {
                Ok(rate) => match ExchangeRate::new(rate) {
                    Ok(rate) => {
                        debug!(provider = provider.name(), rate = rate.usd_to_cad(), "exchange rate fetched");
                        return Ok(rate);
                    }
                    Err(e) => last_error = Some(e),
                },
                Err(e) => {
                    debug!(provider = provider.name(), error = %e, "exchange rate provider failed");
                    last_error = Some(e);
                }
            }
        }

        let reason = match last_error {
            Some(e) => e.to_string(),
            None => "no exchange rate provider registered".to_string(),
        };
        Err(CoreError::ExchangeRateUnavailable {
            base: Currency::Usd.code().to_string(),
            quote: Currency::Cad.code().to_string(),
            reason,
        })
    }

    /// Latest quote for `symbol`, or `None` when no provider has data.
    pub async fn get_quote(&self, cache: &mut MarketDataCache, symbol: &str) -> Option<PriceQuote> {
        if let Some(cached) = cache.get_quote(symbol) {
            return cached;
        }

        let quote = self.fetch_quote(symbol).await;
        cache.set_quote(symbol, quote.clone());
        quote
    }

    /// Daily closes for `symbol` in `[from, to]`; empty when no provider has data.
    pub async fn get_history(
        &self,
        cache: &mut MarketDataCache,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<PricePoint> {
        if let Some(cached) = cache.get_history(symbol, from, to) {
            return cached.to_vec();
        }

        let points = self.fetch_history(symbol, from, to).await;
        cache.set_history(symbol, from, to, points);
        cache
            .get_history(symbol, from, to)
            .map(<[PricePoint]>::to_vec)
            .unwrap_or_default()
    }

    /// Try each provider in turn. Provider errors are treated as "no data"
    /// once all fallbacks are exhausted.
    async fn fetch_quote(&self, symbol: &str) -> Option<PriceQuote> {
        for provider in self.registry.market_data_providers() {
            match provider.get_quote(symbol).await {
                Ok(Some(quote)) => {
                    if !is_valid_price(quote.last_close) || !is_valid_price(quote.previous_close) {
                        debug!(
                            provider = provider.name(),
                            symbol,
                            last_close = quote.last_close,
                            previous_close = quote.previous_close,
                            "discarding invalid quote"
                        );
                        continue;
                    }
                    return Some(quote);
                }
                Ok(None) => {
                    debug!(provider = provider.name(), symbol, "no quote data");
                }
                Err(e) => {
                    debug!(provider = provider.name(), symbol, error = %e, "quote fetch failed");
                }
            }
        }
        None
    }

    async fn fetch_history(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> Vec<PricePoint> {
        for provider in self.registry.market_data_providers() {
            match provider.get_history(symbol, from, to).await {
                Ok(points) => {
                    let points: Vec<PricePoint> = points
                        .into_iter()
                        .filter(|p| is_valid_price(p.price) && p.date >= from && p.date <= to)
                        .collect();
                    if !points.is_empty() {
                        return points;
                    }
                    debug!(provider = provider.name(), symbol, "no history data");
                }
                Err(e) => {
                    debug!(provider = provider.name(), symbol, error = %e, "history fetch failed");
                }
            }
        }
        Vec::new()
    }
}

/// Prices must be finite and non-negative.
fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}

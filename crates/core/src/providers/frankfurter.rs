use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::traits::ExchangeRateProvider;
use crate::errors::CoreError;
use crate::models::holding::Currency;

const BASE_URL: &str = "https://api.frankfurter.dev/v1";
const PROVIDER: &str = "Frankfurter";

/// Frankfurter API provider for fiat exchange rates.
///
/// - **Free**: No API key, no rate limits, open-source.
/// - **Source**: European Central Bank reference rates (published once per
///   business day, so it lags Yahoo's intraday `CAD=X`).
///
/// Registered after Yahoo Finance as the exchange-rate fallback.
pub struct FrankfurterProvider {
    client: Client,
}

impl FrankfurterProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

impl Default for FrankfurterProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

#[async_trait]
impl ExchangeRateProvider for FrankfurterProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_rate(&self, base: Currency, quote: Currency) -> Result<f64, CoreError> {
        if base == quote {
            return Ok(1.0);
        }

        let base = base.code();
        let target = quote.code();
        let url = format!("{BASE_URL}/latest?base={base}&symbols={target}");

        let resp: RatesResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to parse response for {base}/{target}: {e}"),
            })?;

        resp.rates.get(target).copied().ok_or_else(|| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("No rate found for {base} → {target}"),
        })
    }
}

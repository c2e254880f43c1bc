use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use super::alphavantage::AlphaVantageProvider;
use super::frankfurter::FrankfurterProvider;
use super::traits::{ExchangeRateProvider, MarketDataProvider};
use super::yahoo_finance::YahooFinanceProvider;

/// Registry of the available market-data and exchange-rate providers.
///
/// Both lists are kept in priority order: the price service asks the first
/// provider and falls back to the next one when it fails or has no data.
pub struct ProviderRegistry {
    market_data: Vec<Arc<dyn MarketDataProvider>>,
    exchange_rates: Vec<Arc<dyn ExchangeRateProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            market_data: Vec::new(),
            exchange_rates: Vec::new(),
        }
    }

    /// Create a registry with all default providers pre-configured.
    pub fn new_with_defaults(api_keys: &HashMap<String, String>) -> Self {
        let mut registry = Self::new();

        // Yahoo Finance: quotes, history and USD/CAD, no API key (primary)
        match YahooFinanceProvider::new() {
            Ok(yahoo) => {
                let yahoo = Arc::new(yahoo);
                registry.register_market_data(yahoo.clone());
                registry.register_exchange_rate(yahoo);
            }
            Err(e) => warn!(error = %e, "Yahoo Finance provider unavailable"),
        }

        // Alpha Vantage: quotes and history, requires API key (fallback)
        if let Some(key) = api_keys.get("alphavantage").filter(|k| !k.trim().is_empty()) {
            registry.register_market_data(Arc::new(AlphaVantageProvider::new(key.clone())));
        }

        // Frankfurter: ECB reference rates, no API key (fallback)
        registry.register_exchange_rate(Arc::new(FrankfurterProvider::new()));

        registry
    }

    /// Register a market-data provider at the lowest priority.
    pub fn register_market_data(&mut self, provider: Arc<dyn MarketDataProvider>) {
        self.market_data.push(provider);
    }

    /// Register an exchange-rate provider at the lowest priority.
    pub fn register_exchange_rate(&mut self, provider: Arc<dyn ExchangeRateProvider>) {
        self.exchange_rates.push(provider);
    }

    /// Market-data providers in priority order.
    pub fn market_data_providers(&self) -> &[Arc<dyn MarketDataProvider>] {
        &self.market_data
    }

    /// Exchange-rate providers in priority order.
    pub fn exchange_rate_providers(&self) -> &[Arc<dyn ExchangeRateProvider>] {
        &self.exchange_rates
    }

    pub fn market_data_names(&self) -> Vec<String> {
        self.market_data.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn exchange_rate_names(&self) -> Vec<String> {
        self.exchange_rates
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

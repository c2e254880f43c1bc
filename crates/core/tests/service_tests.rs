// ═══════════════════════════════════════════════════════════════════
// Service Tests — CurrencyService, ValuationService, HistoryService,
// PriceService (fallback and memoization)
// ═══════════════════════════════════════════════════════════════════

use approx::assert_relative_eq;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use portfolio_dashboard_core::errors::CoreError;
use portfolio_dashboard_core::models::holding::{Currency, HoldingSpec};
use portfolio_dashboard_core::models::price::{MarketDataCache, PricePoint, PriceQuote};
use portfolio_dashboard_core::providers::registry::ProviderRegistry;
use portfolio_dashboard_core::providers::traits::{ExchangeRateProvider, MarketDataProvider};
use portfolio_dashboard_core::services::currency_service::{CurrencyService, ExchangeRate};
use portfolio_dashboard_core::services::history_service::{day_over_day_change, HistoryService};
use portfolio_dashboard_core::services::price_service::PriceService;
use portfolio_dashboard_core::services::valuation_service::{percent_change, ValuationService};

// ═══════════════════════════════════════════════════════════════════
// Mock Providers
// ═══════════════════════════════════════════════════════════════════

/// Serves fixed quotes and histories and counts every call.
struct MockMarketData {
    name: String,
    quotes: HashMap<String, PriceQuote>,
    history: HashMap<String, Vec<PricePoint>>,
    calls: AtomicUsize,
}

impl MockMarketData {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            quotes: HashMap::new(),
            history: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn with_quote(mut self, symbol: &str, last: f64, previous: f64) -> Self {
        self.quotes
            .insert(symbol.to_string(), PriceQuote::new(symbol, last, previous));
        self
    }

    fn with_history(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.history.insert(symbol.to_string(), points);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketData {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_quote(&self, symbol: &str) -> Result<Option<PriceQuote>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.quotes.get(symbol).cloned())
    }

    async fn get_history(
        &self,
        symbol: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.history.get(symbol).cloned().unwrap_or_default())
    }
}

/// Always errors, like a provider behind a dead network.
struct FailingMarketData;

#[async_trait]
impl MarketDataProvider for FailingMarketData {
    fn name(&self) -> &str {
        "Failing"
    }

    async fn get_quote(&self, _symbol: &str) -> Result<Option<PriceQuote>, CoreError> {
        Err(CoreError::Network("unreachable".into()))
    }

    async fn get_history(
        &self,
        _symbol: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        Err(CoreError::Network("unreachable".into()))
    }
}

struct FixedRate(Result<f64, String>);

#[async_trait]
impl ExchangeRateProvider for FixedRate {
    fn name(&self) -> &str {
        "FixedRate"
    }

    async fn get_rate(&self, _base: Currency, _quote: Currency) -> Result<f64, CoreError> {
        self.0.clone().map_err(CoreError::Network)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
}

fn series(values: &[(u32, f64)]) -> Vec<PricePoint> {
    values
        .iter()
        .map(|&(d, price)| PricePoint { date: date(d), price })
        .collect()
}

fn rate(r: f64) -> ExchangeRate {
    ExchangeRate::new(r).unwrap()
}

fn price_service(providers: Vec<Arc<dyn MarketDataProvider>>) -> PriceService {
    let mut registry = ProviderRegistry::new();
    for p in providers {
        registry.register_market_data(p);
    }
    PriceService::new(registry)
}

// ═══════════════════════════════════════════════════════════════════
// CurrencyService
// ═══════════════════════════════════════════════════════════════════

mod currency_service {
    use super::*;

    #[test]
    fn usd_amount_to_both_currencies() {
        let c = CurrencyService::new().convert(60.0, Currency::Usd, rate(1.35));
        assert_relative_eq!(c.cad, 81.0, epsilon = 1e-9);
        assert_relative_eq!(c.usd, 60.0, epsilon = 1e-9);
    }

    #[test]
    fn cad_amount_to_both_currencies() {
        let c = CurrencyService::new().convert(135.0, Currency::Cad, rate(1.35));
        assert_relative_eq!(c.cad, 135.0, epsilon = 1e-9);
        assert_relative_eq!(c.usd, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn round_trip_recovers_amount() {
        let svc = CurrencyService::new();
        let r = rate(1.3721);
        for amount in [0.01, 1.0, 1234.56, 98765.4321] {
            let cad = svc.to_cad(amount, Currency::Usd, r);
            assert_relative_eq!(svc.to_usd(cad, Currency::Cad, r), amount, max_relative = 1e-12);
        }
    }

    #[test]
    fn rate_must_be_positive_and_finite() {
        assert!(matches!(ExchangeRate::new(0.0), Err(CoreError::InvalidExchangeRate(_))));
        assert!(ExchangeRate::new(-1.35).is_err());
        assert!(ExchangeRate::new(f64::NAN).is_err());
        assert!(ExchangeRate::new(f64::INFINITY).is_err());
    }

    #[test]
    fn rate_deserialization_validates() {
        assert!(serde_json::from_str::<ExchangeRate>("1.35").is_ok());
        assert!(serde_json::from_str::<ExchangeRate>("0").is_err());
    }
}

// ═══════════════════════════════════════════════════════════════════
// ValuationService
// ═══════════════════════════════════════════════════════════════════

mod valuation_service {
    use super::*;

    #[test]
    fn worked_example() {
        let holding = HoldingSpec::usd("A", 10.0, 5.0);
        let quote = PriceQuote::new("A", 6.0, 5.5);
        let m = ValuationService::new().compute_metrics(&holding, &quote, rate(1.35));

        assert_relative_eq!(m.book_value, 50.0, epsilon = 1e-9);
        assert_relative_eq!(m.value_native, 60.0, epsilon = 1e-9);
        assert_relative_eq!(m.value_cad, 81.0, epsilon = 1e-9);
        assert_relative_eq!(m.value_usd, 60.0, epsilon = 1e-9);
        assert_relative_eq!(m.pct_change_cost_basis.unwrap(), 20.0, epsilon = 1e-9);
        assert_relative_eq!(m.pct_change_day.unwrap(), 9.090909, epsilon = 1e-5);
        assert!(m.portfolio_share.is_none());
    }

    #[test]
    fn cad_holding_converts_to_usd() {
        let holding = HoldingSpec::cad("SHOP.TO", 4.0, 96.58);
        let quote = PriceQuote::new("SHOP.TO", 135.0, 130.0);
        let m = ValuationService::new().compute_metrics(&holding, &quote, rate(1.35));
        assert_relative_eq!(m.value_cad, 540.0, epsilon = 1e-9);
        assert_relative_eq!(m.value_usd, 400.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_cost_basis_is_undefined_not_infinite() {
        let holding = HoldingSpec::usd("FREE", 3.0, 0.0);
        let quote = PriceQuote::new("FREE", 2.0, 0.0);
        let m = ValuationService::new().compute_metrics(&holding, &quote, rate(1.35));
        assert!(m.pct_change_cost_basis.is_none());
        assert!(m.pct_change_day.is_none());
    }

    #[test]
    fn shares_sum_to_one() {
        let priced = vec![
            (HoldingSpec::usd("A", 10.0, 5.0), Some(PriceQuote::new("A", 6.0, 5.5))),
            (HoldingSpec::cad("B", 3.0, 20.0), Some(PriceQuote::new("B", 25.0, 24.0))),
            (HoldingSpec::usd("C", 0.5, 100.0), Some(PriceQuote::new("C", 90.0, 95.0))),
        ];
        let snapshot = ValuationService::new().build_snapshot("Main", &priced, rate(1.35));

        let sum: f64 = snapshot.rows.iter().map(|r| r.portfolio_share.unwrap()).sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-9);
        let total: f64 = snapshot.rows.iter().map(|r| r.value_cad).sum();
        assert_relative_eq!(snapshot.totals.total_value_cad, total, epsilon = 1e-9);
    }

    #[test]
    fn holding_without_quote_is_skipped() {
        let priced = vec![
            (HoldingSpec::usd("A", 10.0, 5.0), Some(PriceQuote::new("A", 6.0, 5.5))),
            (HoldingSpec::usd("GONE", 100.0, 1.0), None),
        ];
        let snapshot = ValuationService::new().build_snapshot("Main", &priced, rate(1.35));

        assert_eq!(snapshot.rows.len(), 1);
        assert!(snapshot.row("GONE").is_none());
        assert_eq!(snapshot.skipped, vec!["GONE".to_string()]);
        assert_relative_eq!(snapshot.totals.total_book_value, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn single_row_total_equals_row() {
        let priced = vec![(HoldingSpec::usd("A", 10.0, 5.0), Some(PriceQuote::new("A", 6.0, 5.5)))];
        let snapshot = ValuationService::new().build_snapshot("Main", &priced, rate(1.35));

        let row = snapshot.row("A").unwrap();
        assert_relative_eq!(snapshot.totals.total_value_cad, row.value_cad, epsilon = 1e-9);
        assert_relative_eq!(snapshot.totals.total_value_usd, row.value_usd, epsilon = 1e-9);
        assert_relative_eq!(row.portfolio_share.unwrap(), 1.0, epsilon = 1e-9);
        // 81 CAD against 50 of book value
        assert_relative_eq!(snapshot.totals.total_gain_loss, 31.0, epsilon = 1e-9);
        assert_relative_eq!(snapshot.totals.pct_gain_loss.unwrap(), 62.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_portfolio_has_zero_totals() {
        let snapshot = ValuationService::new().build_snapshot("Empty", &[], rate(1.35));
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.totals.total_value_cad, 0.0);
        assert!(snapshot.totals.pct_gain_loss.is_none());
    }

    #[test]
    fn zero_valued_portfolio_has_undefined_shares() {
        let priced = vec![(HoldingSpec::usd("A", 0.0, 5.0), Some(PriceQuote::new("A", 6.0, 5.5)))];
        let snapshot = ValuationService::new().build_snapshot("Main", &priced, rate(1.35));
        assert!(snapshot.rows[0].portfolio_share.is_none());
    }

    #[test]
    fn same_inputs_same_snapshot() {
        let priced = vec![
            (HoldingSpec::usd("A", 10.0, 5.0), Some(PriceQuote::new("A", 6.0, 5.5))),
            (HoldingSpec::cad("B", 3.0, 20.0), Some(PriceQuote::new("B", 25.0, 24.0))),
        ];
        let svc = ValuationService::new();
        assert_eq!(
            svc.build_snapshot("Main", &priced, rate(1.35)),
            svc.build_snapshot("Main", &priced, rate(1.35))
        );
    }

    #[test]
    fn percent_change_helper() {
        assert_relative_eq!(percent_change(6.0, 5.0).unwrap(), 20.0, epsilon = 1e-9);
        assert_relative_eq!(percent_change(4.0, 5.0).unwrap(), -20.0, epsilon = 1e-9);
        assert!(percent_change(1.0, 0.0).is_none());
    }
}

// ═══════════════════════════════════════════════════════════════════
// HistoryService
// ═══════════════════════════════════════════════════════════════════

mod history_service {
    use super::*;

    #[test]
    fn outer_join_sums_available_holdings() {
        let inputs = vec![
            (HoldingSpec::usd("A", 1.0, 10.0), series(&[(1, 10.0), (2, 11.0), (3, 12.0)])),
            (HoldingSpec::cad("B", 1.0, 5.0), series(&[(2, 2.0), (3, 2.2)])),
        ];
        let s = HistoryService::new().aggregate(&inputs, rate(1.25), 0.5);

        assert_eq!(s.dates(), vec![date(1), date(2), date(3)]);
        // day 1: only A; day 2: A + B
        assert_relative_eq!(s.points[0].portfolio_value, 12.5, epsilon = 1e-9);
        assert_relative_eq!(s.points[1].portfolio_value, 11.0 * 1.25 + 2.0, epsilon = 1e-9);
        assert_relative_eq!(s.points[0].book_value, 10.0, epsilon = 1e-9);
        assert_relative_eq!(s.points[1].book_value, 15.0, epsilon = 1e-9);
    }

    #[test]
    fn two_hundred_percent_jump_is_dropped_with_book_value() {
        let inputs = vec![(
            HoldingSpec::cad("A", 1.0, 90.0),
            series(&[(1, 100.0), (2, 101.0), (3, 303.0), (4, 300.0), (5, 305.0)]),
        )];
        let s = HistoryService::new().aggregate(&inputs, rate(1.35), 0.5);

        assert_eq!(s.dropped, vec![date(3)]);
        assert!(!s.dates().contains(&date(3)));
        assert!(!s.book_values().iter().any(|(d, _)| *d == date(3)));
        assert_eq!(s.len(), 4);
        assert_eq!(s.portfolio_values().len(), s.book_values().len());
    }

    #[test]
    fn change_is_measured_against_previous_raw_date() {
        // 300 → 100 is a -67% move from the dropped spike, so it goes too
        let inputs = vec![(
            HoldingSpec::cad("A", 1.0, 90.0),
            series(&[(1, 100.0), (2, 300.0), (3, 100.0), (4, 101.0)]),
        )];
        let s = HistoryService::new().aggregate(&inputs, rate(1.35), 0.5);
        assert_eq!(s.dropped, vec![date(2), date(3)]);
        assert_eq!(s.dates(), vec![date(1), date(4)]);
    }

    #[test]
    fn exactly_fifty_percent_is_kept() {
        let inputs = vec![(HoldingSpec::cad("A", 1.0, 1.0), series(&[(1, 100.0), (2, 150.0)]))];
        let s = HistoryService::new().aggregate(&inputs, rate(1.35), 0.5);
        assert_eq!(s.len(), 2);
        assert!(s.dropped.is_empty());
    }

    #[test]
    fn first_date_always_kept() {
        let inputs = vec![(HoldingSpec::cad("A", 1.0, 1.0), series(&[(1, 1000.0)]))];
        let s = HistoryService::new().aggregate(&inputs, rate(1.35), 0.5);
        assert_eq!(s.dates(), vec![date(1)]);
    }

    #[test]
    fn holding_without_history_is_omitted() {
        let inputs = vec![
            (HoldingSpec::cad("A", 1.0, 1.0), series(&[(1, 10.0), (2, 10.5)])),
            (HoldingSpec::usd("NONE", 5.0, 1.0), vec![]),
        ];
        let s = HistoryService::new().aggregate(&inputs, rate(1.35), 0.5);
        assert_eq!(s.omitted, vec!["NONE".to_string()]);
        assert_relative_eq!(s.points[0].book_value, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn unsorted_input_is_ordered() {
        let inputs = vec![(HoldingSpec::cad("A", 1.0, 1.0), series(&[(3, 12.0), (1, 10.0), (2, 11.0)]))];
        let s = HistoryService::new().aggregate(&inputs, rate(1.35), 0.5);
        assert_eq!(s.dates(), vec![date(1), date(2), date(3)]);
    }

    #[test]
    fn zero_to_zero_is_kept() {
        assert!(day_over_day_change(0.0, 0.0).is_nan());
        assert!(day_over_day_change(0.0, 5.0).is_infinite());
        let inputs = vec![(HoldingSpec::cad("A", 0.0, 1.0), series(&[(1, 10.0), (2, 11.0)]))];
        let s = HistoryService::new().aggregate(&inputs, rate(1.35), 0.5);
        assert_eq!(s.len(), 2);
    }

    #[tokio::test]
    async fn build_history_fetches_each_holding() {
        let provider = Arc::new(
            MockMarketData::new("Mock")
                .with_history("A", series(&[(1, 10.0), (2, 10.5)]))
                .with_history("B", series(&[(2, 4.0)])),
        );
        let prices = price_service(vec![provider.clone()]);
        let portfolio = portfolio_dashboard_core::models::holding::PortfolioConfig::new(
            "Main",
            vec![
                HoldingSpec::cad("A", 1.0, 10.0),
                HoldingSpec::cad("B", 1.0, 4.0),
                HoldingSpec::cad("C", 1.0, 1.0),
            ],
        );
        let mut cache = MarketDataCache::new();

        let s = HistoryService::new()
            .build_history(&portfolio, &prices, &mut cache, rate(1.35), date(1), date(31), 0.5)
            .await;

        assert_eq!(s.len(), 2);
        assert_eq!(s.omitted, vec!["C".to_string()]);
        assert_relative_eq!(s.points[1].portfolio_value, 14.5, epsilon = 1e-9);
        assert_eq!(provider.calls(), 3);
    }
}

// ═══════════════════════════════════════════════════════════════════
// PriceService
// ═══════════════════════════════════════════════════════════════════

mod price_service {
    use super::*;

    #[tokio::test]
    async fn falls_back_to_next_provider() {
        let backup = Arc::new(MockMarketData::new("Backup").with_quote("A", 6.0, 5.5));
        let prices = price_service(vec![Arc::new(FailingMarketData), backup.clone()]);
        let mut cache = MarketDataCache::new();

        let quote = prices.get_quote(&mut cache, "A").await.unwrap();
        assert_eq!(quote.last_close, 6.0);
        assert_eq!(backup.calls(), 1);
    }

    #[tokio::test]
    async fn empty_result_falls_back_too() {
        let primary = Arc::new(MockMarketData::new("Primary"));
        let backup = Arc::new(MockMarketData::new("Backup").with_history("A", series(&[(1, 1.0)])));
        let prices = price_service(vec![primary.clone(), backup.clone()]);
        let mut cache = MarketDataCache::new();

        let points = prices.get_history(&mut cache, "A", date(1), date(31)).await;
        assert_eq!(points.len(), 1);
        assert_eq!(primary.calls(), 1);
        assert_eq!(backup.calls(), 1);
    }

    #[tokio::test]
    async fn all_providers_failing_is_no_data() {
        let prices = price_service(vec![Arc::new(FailingMarketData)]);
        let mut cache = MarketDataCache::new();
        assert!(prices.get_quote(&mut cache, "A").await.is_none());
        assert!(prices.get_history(&mut cache, "A", date(1), date(31)).await.is_empty());
    }

    #[tokio::test]
    async fn lookups_are_memoized_per_cache() {
        let provider = Arc::new(MockMarketData::new("Mock").with_quote("A", 6.0, 5.5));
        let prices = price_service(vec![provider.clone()]);
        let mut cache = MarketDataCache::new();

        prices.get_quote(&mut cache, "A").await;
        prices.get_quote(&mut cache, "a").await;
        prices.get_quote(&mut cache, "MISSING").await;
        prices.get_quote(&mut cache, "MISSING").await;
        assert_eq!(provider.calls(), 2);

        let mut fresh = MarketDataCache::new();
        prices.get_quote(&mut fresh, "A").await;
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn invalid_quote_is_discarded() {
        let bad = Arc::new(MockMarketData::new("Bad").with_quote("A", f64::NAN, 5.0));
        let good = Arc::new(MockMarketData::new("Good").with_quote("A", 6.0, 5.0));
        let prices = price_service(vec![bad, good]);
        let mut cache = MarketDataCache::new();

        let quote = prices.get_quote(&mut cache, "A").await.unwrap();
        assert_eq!(quote.last_close, 6.0);
    }

    #[tokio::test]
    async fn history_outside_window_is_filtered() {
        let provider = Arc::new(
            MockMarketData::new("Mock").with_history("A", series(&[(1, 1.0), (10, 2.0), (20, 3.0)])),
        );
        let prices = price_service(vec![provider]);
        let mut cache = MarketDataCache::new();

        let points = prices.get_history(&mut cache, "A", date(5), date(15)).await;
        assert_eq!(points, series(&[(10, 2.0)]));
    }

    #[tokio::test]
    async fn first_valid_rate_wins() {
        let mut registry = ProviderRegistry::new();
        registry.register_exchange_rate(Arc::new(FixedRate(Err("down".into()))));
        registry.register_exchange_rate(Arc::new(FixedRate(Ok(0.0))));
        registry.register_exchange_rate(Arc::new(FixedRate(Ok(1.36))));
        let prices = PriceService::new(registry);

        let r = prices.get_exchange_rate().await.unwrap();
        assert_relative_eq!(r.usd_to_cad(), 1.36, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn missing_rate_is_fatal() {
        let mut registry = ProviderRegistry::new();
        registry.register_exchange_rate(Arc::new(FixedRate(Err("timeout".into()))));
        let err = PriceService::new(registry).get_exchange_rate().await.unwrap_err();

        match err {
            CoreError::ExchangeRateUnavailable { base, quote, reason } => {
                assert_eq!(base, "USD");
                assert_eq!(quote, "CAD");
                assert!(reason.contains("timeout"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn no_rate_provider_is_fatal() {
        let err = PriceService::new(ProviderRegistry::new())
            .get_exchange_rate()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no exchange rate provider registered"));
    }
}

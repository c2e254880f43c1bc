pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use chrono::NaiveDate;
use models::{
    holding::PortfolioConfig,
    price::MarketDataCache,
    report::{DashboardReport, PortfolioReport},
    settings::Settings,
};
use providers::registry::ProviderRegistry;
use services::{
    currency_service::ExchangeRate, history_service::HistoryService,
    price_service::PriceService, valuation_service::ValuationService,
};
use tracing::{debug, info};

use errors::CoreError;

/// Main entry point for the portfolio dashboard core library.
///
/// Holds the configuration and the services; every call to [`run`] derives
/// all figures from scratch. Nothing is kept between runs.
///
/// [`run`]: PortfolioDashboard::run
#[must_use]
pub struct PortfolioDashboard {
    settings: Settings,
    price_service: PriceService,
    valuation_service: ValuationService,
    history_service: HistoryService,
}

impl std::fmt::Debug for PortfolioDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioDashboard")
            .field("portfolios", &self.settings.portfolios.len())
            .field("history_period", &self.settings.history_period)
            .field(
                "market_data_providers",
                &self.price_service.registry().market_data_names(),
            )
            .finish()
    }
}

impl PortfolioDashboard {
    /// Build a dashboard wired to the default providers.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        let registry = ProviderRegistry::new_with_defaults(&settings.api_keys);
        Self::with_registry(settings, registry)
    }

    /// Build a dashboard over a custom provider set (tests, offline data).
    pub fn with_registry(settings: Settings, registry: ProviderRegistry) -> Result<Self, CoreError> {
        settings.validate()?;
        Ok(Self {
            settings,
            price_service: PriceService::new(registry),
            valuation_service: ValuationService::new(),
            history_service: HistoryService::new(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Fetch the USD→CAD rate. Fails the run when no provider has one.
    pub async fn fetch_exchange_rate(&self) -> Result<ExchangeRate, CoreError> {
        self.price_service.get_exchange_rate().await
    }

    /// Value every configured portfolio as of today (UTC).
    pub async fn run(&self) -> Result<DashboardReport, CoreError> {
        self.run_as_of(chrono::Utc::now().date_naive()).await
    }

    /// Value every configured portfolio with the history window ending at `today`.
    pub async fn run_as_of(&self, today: NaiveDate) -> Result<DashboardReport, CoreError> {
        let portfolios: Vec<&PortfolioConfig> = self.settings.portfolios.iter().collect();
        self.run_portfolios(&portfolios, today).await
    }

    /// Value a single portfolio by name (case-insensitive).
    pub async fn run_portfolio(&self, name: &str, today: NaiveDate) -> Result<DashboardReport, CoreError> {
        let portfolio = self
            .settings
            .portfolio(name)
            .ok_or_else(|| CoreError::Config(format!("unknown portfolio: {name}")))?;
        self.run_portfolios(&[portfolio], today).await
    }

    /// Snapshot and history for one portfolio at a given rate.
    pub async fn value_portfolio(
        &self,
        portfolio: &PortfolioConfig,
        cache: &mut MarketDataCache,
        rate: ExchangeRate,
        today: NaiveDate,
    ) -> PortfolioReport {
        let snapshot = self
            .valuation_service
            .value_portfolio(portfolio, &self.price_service, cache, rate)
            .await;

        let (from, to) = self.settings.history_period.date_range(today);
        let history = self
            .history_service
            .build_history(
                portfolio,
                &self.price_service,
                cache,
                rate,
                from,
                to,
                self.settings.outlier_threshold,
            )
            .await;

        PortfolioReport { snapshot, history }
    }

    async fn run_portfolios(
        &self,
        portfolios: &[&PortfolioConfig],
        today: NaiveDate,
    ) -> Result<DashboardReport, CoreError> {
        // The rate is fetched once and held fixed for every conversion of the run.
        let rate = self.fetch_exchange_rate().await?;
        info!(usd_to_cad = rate.usd_to_cad(), "exchange rate fixed for run");

        let mut cache = MarketDataCache::new();
        let mut reports = Vec::with_capacity(portfolios.len());
        for portfolio in portfolios {
            reports.push(self.value_portfolio(portfolio, &mut cache, rate, today).await);
        }
        debug!(
            symbols = cache.quote_count(),
            history_points = cache.total_history_points(),
            "market data fetched for run"
        );

        Ok(DashboardReport {
            as_of: today,
            exchange_rate: rate.usd_to_cad(),
            portfolios: reports,
        })
    }
}

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::models::history::{HistoricalPoint, HistoricalSeries};
use crate::models::holding::{HoldingSpec, PortfolioConfig};
use crate::models::price::{normalize_series, MarketDataCache, PricePoint};
use crate::services::currency_service::{CurrencyService, ExchangeRate};
use crate::services::price_service::PriceService;

/// Builds the historical portfolio-value and book-value series for the chart.
///
/// 1. Per holding: close × quantity, converted to CAD at the run's rate.
/// 2. Outer join by date and sum; a holding missing a date adds nothing.
/// 3. Book value: quantity × cost_basis on every date the holding has a
///    close, summed the same way (native currency, like the totals).
/// 4. Drop dates whose day-over-day change of the aggregate value exceeds
///    the outlier threshold. Changes are measured against the preceding
///    unfiltered date.
pub struct HistoryService {
    currency_service: CurrencyService,
}

impl HistoryService {
    pub fn new() -> Self {
        Self {
            currency_service: CurrencyService::new(),
        }
    }

    /// Fetch each holding's closes (sequentially) and build the series.
    #[allow(clippy::too_many_arguments)]
    pub async fn build_history(
        &self,
        portfolio: &PortfolioConfig,
        price_service: &PriceService,
        cache: &mut MarketDataCache,
        rate: ExchangeRate,
        from: NaiveDate,
        to: NaiveDate,
        outlier_threshold: f64,
    ) -> HistoricalSeries {
        let mut inputs = Vec::with_capacity(portfolio.holdings.len());
        for holding in &portfolio.holdings {
            let points = price_service
                .get_history(cache, &holding.symbol, from, to)
                .await;
            if points.is_empty() {
                warn!(portfolio = %portfolio.name, symbol = %holding.symbol, "no historical data, skipping");
            }
            inputs.push((holding.clone(), points));
        }

        let series = self.aggregate(&inputs, rate, outlier_threshold);
        debug!(
            portfolio = %portfolio.name,
            points = series.len(),
            first = ?series.first_date(),
            last = ?series.last_date(),
            dropped = series.dropped.len(),
            "historical series built"
        );
        series
    }

    /// Combine per-holding closes into the filtered aggregate series.
    pub fn aggregate(
        &self,
        inputs: &[(HoldingSpec, Vec<PricePoint>)],
        rate: ExchangeRate,
        outlier_threshold: f64,
    ) -> HistoricalSeries {
        // date → (portfolio value in CAD, book value)
        let mut by_date: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
        let mut omitted = Vec::new();

        for (holding, points) in inputs {
            if points.is_empty() {
                omitted.push(holding.symbol.clone());
                continue;
            }
            let book_value = holding.book_value();
            for point in normalize_series(points.clone()) {
                let value_cad = self.currency_service.to_cad(
                    point.price * holding.quantity,
                    holding.currency,
                    rate,
                );
                let entry = by_date.entry(point.date).or_insert((0.0, 0.0));
                entry.0 += value_cad;
                entry.1 += book_value;
            }
        }

        let mut points = Vec::with_capacity(by_date.len());
        let mut dropped = Vec::new();
        let mut previous: Option<f64> = None;

        for (date, (portfolio_value, book_value)) in by_date {
            let is_outlier = previous
                .map(|prev| exceeds_threshold(prev, portfolio_value, outlier_threshold))
                .unwrap_or(false);
            previous = Some(portfolio_value);

            if is_outlier {
                dropped.push(date);
                continue;
            }
            points.push(HistoricalPoint {
                date,
                portfolio_value,
                book_value,
            });
        }

        HistoricalSeries {
            points,
            dropped,
            omitted,
        }
    }
}

impl Default for HistoryService {
    fn default() -> Self {
        Self::new()
    }
}

/// Fractional day-over-day change from `previous` to `current`.
///
/// From a zero previous value the change is infinite (or undefined when
/// both are zero, which is never an outlier).
pub fn day_over_day_change(previous: f64, current: f64) -> f64 {
    (current - previous) / previous
}

fn exceeds_threshold(previous: f64, current: f64, threshold: f64) -> bool {
    // NaN (0 → 0) compares false and is kept.
    day_over_day_change(previous, current).abs() > threshold
}

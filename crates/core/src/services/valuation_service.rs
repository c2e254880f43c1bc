use tracing::{info, warn};

use crate::models::holding::{HoldingSpec, PortfolioConfig};
use crate::models::metrics::{PortfolioSnapshot, PortfolioTotals, SymbolMetrics};
use crate::models::price::{MarketDataCache, PriceQuote};
use crate::services::currency_service::{CurrencyService, ExchangeRate};
use crate::services::price_service::PriceService;

/// Computes the per-symbol table and the portfolio totals.
///
/// Holdings without a quote are left out of both the rows and the totals;
/// they are reported in [`PortfolioSnapshot::skipped`].
pub struct ValuationService {
    currency_service: CurrencyService,
}

impl ValuationService {
    pub fn new() -> Self {
        Self {
            currency_service: CurrencyService::new(),
        }
    }

    /// Fetch a quote for every holding (sequentially) and build the snapshot.
    pub async fn value_portfolio(
        &self,
        portfolio: &PortfolioConfig,
        price_service: &PriceService,
        cache: &mut MarketDataCache,
        rate: ExchangeRate,
    ) -> PortfolioSnapshot {
        let mut priced = Vec::with_capacity(portfolio.holdings.len());
        for holding in &portfolio.holdings {
            let quote = price_service.get_quote(cache, &holding.symbol).await;
            priced.push((holding.clone(), quote));
        }

        let snapshot = self.build_snapshot(&portfolio.name, &priced, rate);
        info!(
            portfolio = %snapshot.name,
            rows = snapshot.rows.len(),
            skipped = snapshot.skipped.len(),
            total_value_cad = snapshot.totals.total_value_cad,
            "portfolio valued"
        );
        snapshot
    }

    /// Build the snapshot from already-fetched quotes.
    pub fn build_snapshot(
        &self,
        name: &str,
        priced: &[(HoldingSpec, Option<PriceQuote>)],
        rate: ExchangeRate,
    ) -> PortfolioSnapshot {
        let mut rows = Vec::with_capacity(priced.len());
        let mut skipped = Vec::new();

        for (holding, quote) in priced {
            match quote {
                Some(quote) => rows.push(self.compute_metrics(holding, quote, rate)),
                None => {
                    warn!(portfolio = name, symbol = %holding.symbol, "no quote data, skipping");
                    skipped.push(holding.symbol.clone());
                }
            }
        }

        let totals = self.compute_totals(&rows);
        for row in &mut rows {
            row.portfolio_share = ratio(row.value_cad, totals.total_value_cad);
        }

        PortfolioSnapshot {
            name: name.to_string(),
            rows,
            totals,
            skipped,
        }
    }

    /// Metrics for one holding. `portfolio_share` is left `None`; it needs
    /// the portfolio total and is filled in by [`Self::build_snapshot`].
    pub fn compute_metrics(
        &self,
        holding: &HoldingSpec,
        quote: &PriceQuote,
        rate: ExchangeRate,
    ) -> SymbolMetrics {
        let value_native = holding.quantity * quote.last_close;
        let converted = self
            .currency_service
            .convert(value_native, holding.currency, rate);

        SymbolMetrics {
            symbol: holding.symbol.clone(),
            currency: holding.currency,
            last_price: quote.last_close,
            cost_basis: holding.cost_basis,
            quantity: holding.quantity,
            book_value: holding.book_value(),
            value_native,
            value_cad: converted.cad,
            value_usd: converted.usd,
            pct_change_cost_basis: percent_change(quote.last_close, holding.cost_basis),
            pct_change_day: percent_change(quote.last_close, quote.previous_close),
            portfolio_share: None,
        }
    }

    pub fn compute_totals(&self, rows: &[SymbolMetrics]) -> PortfolioTotals {
        let total_value_cad: f64 = rows.iter().map(|r| r.value_cad).sum();
        let total_value_usd: f64 = rows.iter().map(|r| r.value_usd).sum();
        let total_book_value: f64 = rows.iter().map(|r| r.book_value).sum();
        let total_gain_loss = total_value_cad - total_book_value;

        PortfolioTotals {
            total_value_cad,
            total_value_usd,
            total_book_value,
            total_gain_loss,
            pct_gain_loss: ratio(total_gain_loss, total_book_value).map(|r| r * 100.0),
        }
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}

/// (current − reference) / reference × 100, undefined for a zero reference.
pub fn percent_change(current: f64, reference: f64) -> Option<f64> {
    ratio(current - reference, reference).map(|r| r * 100.0)
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

use serde::{Deserialize, Serialize};

use super::holding::Currency;

/// Derived valuation of a single holding for the current run.
///
/// Ratio fields are `None` when their denominator is zero; the dashboard
/// shows them as "n/a" rather than an infinity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMetrics {
    pub symbol: String,

    pub currency: Currency,

    /// Latest close, in `currency`
    pub last_price: f64,

    pub cost_basis: f64,

    pub quantity: f64,

    /// quantity × cost_basis, in `currency`
    pub book_value: f64,

    /// quantity × last_price, in `currency`
    pub value_native: f64,

    pub value_cad: f64,

    pub value_usd: f64,

    /// (last_price − cost_basis) / cost_basis × 100
    pub pct_change_cost_basis: Option<f64>,

    /// (last_price − previous_close) / previous_close × 100
    pub pct_change_day: Option<f64>,

    /// value_cad / total portfolio value in CAD, as a fraction (0.25 = 25%)
    pub portfolio_share: Option<f64>,
}

/// Portfolio-level aggregates over the rows that had a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub total_value_cad: f64,

    pub total_value_usd: f64,

    /// Sum of native book values
    pub total_book_value: f64,

    /// total_value_cad − total_book_value
    pub total_gain_loss: f64,

    /// total_gain_loss / total_book_value × 100
    pub pct_gain_loss: Option<f64>,
}

/// The per-symbol table and its totals for one portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub name: String,

    /// One row per holding with a quote, in configuration order
    pub rows: Vec<SymbolMetrics>,

    pub totals: PortfolioTotals,

    /// Symbols left out because no quote could be retrieved
    pub skipped: Vec<String>,
}

impl PortfolioSnapshot {
    pub fn row(&self, symbol: &str) -> Option<&SymbolMetrics> {
        let upper = symbol.to_uppercase();
        self.rows.iter().find(|r| r.symbol == upper)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

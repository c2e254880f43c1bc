use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::history::HistoricalSeries;
use super::metrics::PortfolioSnapshot;

/// Everything the dashboard shows for one portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub snapshot: PortfolioSnapshot,
    pub history: HistoricalSeries,
}

impl PortfolioReport {
    pub fn name(&self) -> &str {
        &self.snapshot.name
    }
}

/// Output of one dashboard run. Nothing here is persisted; the next run
/// recomputes it from scratch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub as_of: NaiveDate,

    /// CAD per 1 USD, fixed for the whole run
    pub exchange_rate: f64,

    pub portfolios: Vec<PortfolioReport>,
}

impl DashboardReport {
    pub fn portfolio(&self, name: &str) -> Option<&PortfolioReport> {
        self.portfolios
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

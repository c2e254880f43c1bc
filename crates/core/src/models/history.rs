use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One retained date of the historical chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: NaiveDate,

    /// Σ close × quantity in CAD, over holdings with a close on this date
    pub portfolio_value: f64,

    /// Σ quantity × cost_basis (native currency) over the same holdings
    pub book_value: f64,
}

/// Aggregate value and book-value series after outlier filtering.
///
/// The two series share `points`, so they are aligned by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    /// Retained dates, ascending
    pub points: Vec<HistoricalPoint>,

    /// Dates removed because the day-over-day change exceeded the threshold
    pub dropped: Vec<NaiveDate>,

    /// Symbols with no history at all
    pub omitted: Vec<String>,
}

impl HistoricalSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn portfolio_values(&self) -> Vec<(NaiveDate, f64)> {
        self.points.iter().map(|p| (p.date, p.portfolio_value)).collect()
    }

    pub fn book_values(&self) -> Vec<(NaiveDate, f64)> {
        self.points.iter().map(|p| (p.date, p.book_value)).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single daily close (date → price).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Latest close of a symbol together with the close before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub last_close: f64,
    /// Equals `last_close` when the provider returned a single sample.
    pub previous_close: f64,
}

impl PriceQuote {
    pub fn new(symbol: impl Into<String>, last_close: f64, previous_close: f64) -> Self {
        Self {
            symbol: symbol.into(),
            last_close,
            previous_close,
        }
    }

    /// Build a quote from a time-ordered sequence of closes.
    /// Returns `None` if the sequence is empty.
    pub fn from_closes(symbol: impl Into<String>, closes: &[f64]) -> Option<Self> {
        let last = *closes.last()?;
        let previous = if closes.len() > 1 {
            closes[closes.len() - 2]
        } else {
            last
        };
        Some(Self::new(symbol, last, previous))
    }
}

/// Per-run memo of market-data lookups, keyed by uppercased symbol.
///
/// A symbol held in several portfolios is fetched once per run. Negative
/// results are cached too: a symbol that had no data stays without data
/// for the rest of the run (no retries).
#[derive(Debug, Clone, Default)]
pub struct MarketDataCache {
    quotes: HashMap<String, Option<PriceQuote>>,
    /// (symbol, from, to) → closes, sorted by date
    history: HashMap<(String, NaiveDate, NaiveDate), Vec<PricePoint>>,
}

impl MarketDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(None)` means "looked up, no data"; `None` means "not looked up yet".
    pub fn get_quote(&self, symbol: &str) -> Option<Option<PriceQuote>> {
        self.quotes.get(&symbol.to_uppercase()).cloned()
    }

    pub fn set_quote(&mut self, symbol: &str, quote: Option<PriceQuote>) {
        self.quotes.insert(symbol.to_uppercase(), quote);
    }

    pub fn get_history(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> Option<&[PricePoint]> {
        self.history
            .get(&(symbol.to_uppercase(), from, to))
            .map(Vec::as_slice)
    }

    /// Store a series; points are sorted and de-duplicated by date
    /// (last write wins for a repeated date).
    pub fn set_history(&mut self, symbol: &str, from: NaiveDate, to: NaiveDate, points: Vec<PricePoint>) {
        self.history
            .insert((symbol.to_uppercase(), from, to), normalize_series(points));
    }

    /// Number of symbols with a cached quote lookup (hit or miss).
    pub fn quote_count(&self) -> usize {
        self.quotes.len()
    }

    /// Total number of cached history points.
    pub fn total_history_points(&self) -> usize {
        self.history.values().map(|v| v.len()).sum()
    }
}

/// Sort by date and keep one point per date.
pub fn normalize_series(mut points: Vec<PricePoint>) -> Vec<PricePoint> {
    points.sort_by_key(|p| p.date);
    let mut out: Vec<PricePoint> = Vec::with_capacity(points.len());
    for point in points {
        match out.last_mut() {
            Some(last) if last.date == point.date => *last = point,
            _ => out.push(point),
        }
    }
    out
}

//! Output formatting utilities.

use colored::Colorize;
use num_format::{Locale, ToFormattedString};
use portfolio_dashboard_core::models::history::HistoricalSeries;
use portfolio_dashboard_core::models::metrics::{PortfolioSnapshot, PortfolioTotals, SymbolMetrics};
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::chart::{render_line_chart, ChartLine};

/// Placeholder for a ratio whose denominator was zero.
pub const UNDEFINED: &str = "n/a";

/// One row of the portfolio overview, already formatted.
#[derive(Debug, Clone, Tabled)]
pub struct HoldingRow {
    #[tabled(rename = "Symbol")]
    pub symbol: String,
    #[tabled(rename = "Last Price")]
    pub last_price: String,
    #[tabled(rename = "Cost Basis")]
    pub cost_basis: String,
    #[tabled(rename = "Quantity")]
    pub quantity: String,
    #[tabled(rename = "Book Value")]
    pub book_value: String,
    #[tabled(rename = "Value (CAD)")]
    pub value_cad: String,
    #[tabled(rename = "Value (USD)")]
    pub value_usd: String,
    #[tabled(rename = "% Change from Cost Basis")]
    pub pct_change_cost_basis: String,
    #[tabled(rename = "% Change from Last Trading Day")]
    pub pct_change_day: String,
    #[tabled(rename = "Percentage of Portfolio")]
    pub portfolio_share: String,
}

impl From<&SymbolMetrics> for HoldingRow {
    fn from(m: &SymbolMetrics) -> Self {
        Self {
            symbol: m.symbol.clone(),
            last_price: format_money(m.last_price),
            cost_basis: format_money(m.cost_basis),
            quantity: format_quantity(m.quantity),
            book_value: format_money(m.book_value),
            value_cad: format_money(m.value_cad),
            value_usd: format_money(m.value_usd),
            pct_change_cost_basis: colorize_change(m.pct_change_cost_basis),
            pct_change_day: colorize_change(m.pct_change_day),
            portfolio_share: m
                .portfolio_share
                .map(format_share)
                .unwrap_or_else(|| UNDEFINED.to_string()),
        }
    }
}

/// Two decimals with thousands separators: `12345.678` → `12,345.68`.
/// Non-finite values render as [`UNDEFINED`].
pub fn format_money(value: f64) -> String {
    if !value.is_finite() {
        return UNDEFINED.to_string();
    }

    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));
    let grouped = int_part
        .parse::<u64>()
        .map(|n| n.to_formatted_string(&Locale::en))
        .unwrap_or_else(|_| int_part.to_string());

    // "-0.00" would read as a loss
    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

/// Signed percentage with two decimals: `20.0` → `+20.00%`.
pub fn format_signed_percent(value: f64) -> String {
    format!("{value:+.2}%")
}

/// A fraction as a percentage: `0.1234` → `12.34%`.
pub fn format_share(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Shortest representation: `561.0` → `561`, `220.5312` → `220.5312`.
pub fn format_quantity(quantity: f64) -> String {
    format!("{quantity}")
}

/// Positive changes in green, everything else in red; undefined is dimmed.
pub fn colorize_change(value: Option<f64>) -> String {
    match value {
        None => UNDEFINED.dimmed().to_string(),
        Some(v) if v > 0.0 => format_signed_percent(v).green().to_string(),
        Some(v) => format_signed_percent(v).red().to_string(),
    }
}

pub fn render_holdings_table(snapshot: &PortfolioSnapshot) -> String {
    if snapshot.rows.is_empty() {
        return "No holdings with market data.".to_string();
    }

    let rows: Vec<HoldingRow> = snapshot.rows.iter().map(HoldingRow::from).collect();
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string()
}

/// The two summary lines under the table.
pub fn render_totals(totals: &PortfolioTotals) -> String {
    let pct = totals
        .pct_gain_loss
        .map(format_signed_percent)
        .unwrap_or_else(|| UNDEFINED.to_string());
    format!(
        "Total Value: {} CAD | {} USD\nGain/Loss from Book Value: {} CAD ({pct})",
        format_money(totals.total_value_cad),
        format_money(totals.total_value_usd),
        format_money(totals.total_gain_loss),
    )
}

pub fn render_exchange_rate(usd_to_cad: f64) -> String {
    format!("1 USD = {usd_to_cad:.2} CAD")
}

pub fn render_history_chart(history: &HistoricalSeries, width: usize, height: usize) -> String {
    let dates = history.dates();
    let values: Vec<f64> = history.points.iter().map(|p| p.portfolio_value).collect();
    let book: Vec<f64> = history.points.iter().map(|p| p.book_value).collect();

    render_line_chart(
        &dates,
        &[
            ChartLine {
                label: "Book Value",
                glyph: '.',
                values: &book,
            },
            ChartLine {
                label: "Portfolio Value (CAD)",
                glyph: '*',
                values: &values,
            },
        ],
        width,
        height,
    )
}

/// Prints data as pretty JSON.
pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Prints a section heading.
pub fn print_heading(text: &str) {
    println!("\n{}", text.bold());
}

/// Prints a warning message.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

/// Prints a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

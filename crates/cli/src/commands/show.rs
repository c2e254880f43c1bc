//! Show command: values the portfolios and renders the dashboard.

use anyhow::{Context, Result};
use chrono::Utc;
use portfolio_dashboard_core::models::report::{DashboardReport, PortfolioReport};
use portfolio_dashboard_core::models::settings::Settings;
use portfolio_dashboard_core::PortfolioDashboard;
use tracing::debug;

use crate::cli::{OutputFormat, ShowArgs};
use crate::output::{
    print_heading, print_json, print_warning, render_exchange_rate, render_history_chart,
    render_holdings_table, render_totals,
};

/// Execute the show command.
pub async fn execute(args: ShowArgs, settings: Settings, format: OutputFormat) -> Result<()> {
    let dashboard = PortfolioDashboard::new(settings).context("invalid configuration")?;
    debug!(?dashboard, "dashboard ready");

    let today = Utc::now().date_naive();
    let report = match args.portfolio.as_deref() {
        Some(name) => dashboard.run_portfolio(name, today).await?,
        None => dashboard.run_as_of(today).await?,
    };

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => {
            print!("{}", render_dashboard(&report, &args));
            print_notices(&report);
            Ok(())
        }
    }
}

/// The complete text dashboard, in display order.
pub fn render_dashboard(report: &DashboardReport, args: &ShowArgs) -> String {
    let mut out = render_exchange_rate(report.exchange_rate);
    out.push('\n');
    for portfolio in &report.portfolios {
        out.push('\n');
        out.push_str(&render_portfolio(portfolio, args));
    }
    out
}

fn render_portfolio(report: &PortfolioReport, args: &ShowArgs) -> String {
    let snapshot = &report.snapshot;
    let mut out = format!("== {} ==\n", snapshot.name);
    out.push_str(&render_holdings_table(snapshot));
    out.push('\n');
    out.push_str(&render_totals(&snapshot.totals));
    out.push('\n');

    if !snapshot.skipped.is_empty() {
        out.push_str(&format!(
            "Skipped (no market data): {}\n",
            snapshot.skipped.join(", ")
        ));
    }

    out.push_str(&format!("\n{} Value History\n", snapshot.name));
    out.push_str(&render_history_chart(
        &report.history,
        args.chart_width,
        args.chart_height,
    ));
    out.push('\n');

    if !report.history.omitted.is_empty() {
        out.push_str(&format!(
            "No history for: {}\n",
            report.history.omitted.join(", ")
        ));
    }
    if !report.history.dropped.is_empty() {
        out.push_str(&format!(
            "Dropped {} outlier date(s)\n",
            report.history.dropped.len()
        ));
    }
    out
}

/// Heading and warnings go straight to the terminal; kept apart from the
/// rendered text so `render_dashboard` stays free of side effects.
pub fn print_notices(report: &DashboardReport) {
    for portfolio in &report.portfolios {
        if portfolio.snapshot.is_empty() {
            print_warning(&format!(
                "{}: no holding could be priced",
                portfolio.name()
            ));
        }
    }
    if report.portfolios.is_empty() {
        print_heading("No portfolios configured");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use portfolio_dashboard_core::models::history::{HistoricalPoint, HistoricalSeries};
    use portfolio_dashboard_core::models::holding::Currency;
    use portfolio_dashboard_core::models::metrics::{
        PortfolioSnapshot, PortfolioTotals, SymbolMetrics,
    };

    fn report() -> DashboardReport {
        let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
        DashboardReport {
            as_of: d(10),
            exchange_rate: 1.35,
            portfolios: vec![PortfolioReport {
                snapshot: PortfolioSnapshot {
                    name: "Main".into(),
                    rows: vec![SymbolMetrics {
                        symbol: "A".into(),
                        currency: Currency::Usd,
                        last_price: 6.0,
                        cost_basis: 5.0,
                        quantity: 10.0,
                        book_value: 50.0,
                        value_native: 60.0,
                        value_cad: 81.0,
                        value_usd: 60.0,
                        pct_change_cost_basis: Some(20.0),
                        pct_change_day: Some(9.090909),
                        portfolio_share: Some(1.0),
                    }],
                    totals: PortfolioTotals {
                        total_value_cad: 81.0,
                        total_value_usd: 60.0,
                        total_book_value: 50.0,
                        total_gain_loss: 31.0,
                        pct_gain_loss: Some(62.0),
                    },
                    skipped: vec!["B".into()],
                },
                history: HistoricalSeries {
                    points: vec![
                        HistoricalPoint { date: d(3), portfolio_value: 75.0, book_value: 50.0 },
                        HistoricalPoint { date: d(4), portfolio_value: 81.0, book_value: 50.0 },
                    ],
                    dropped: vec![d(5)],
                    omitted: vec!["B".into()],
                },
            }],
        }
    }

    #[test]
    fn dashboard_text_in_display_order() {
        let text = render_dashboard(&report(), &ShowArgs::default());

        let rate = text.find("1 USD = 1.35 CAD").unwrap();
        let heading = text.find("== Main ==").unwrap();
        let totals = text.find("Total Value: 81.00 CAD | 60.00 USD").unwrap();
        let chart = text.find("Main Value History").unwrap();
        assert!(rate < heading && heading < totals && totals < chart);

        assert!(text.contains("Gain/Loss from Book Value: 31.00 CAD (+62.00%)"));
        assert!(text.contains("Skipped (no market data): B"));
        assert!(text.contains("No history for: B"));
        assert!(text.contains("Dropped 1 outlier date(s)"));
        assert!(text.contains("2025-03-03"));
    }

    #[test]
    fn empty_history_renders_placeholder() {
        let mut report = report();
        report.portfolios[0].history = HistoricalSeries::default();
        let text = render_dashboard(&report, &ShowArgs::default());
        assert!(text.contains("No historical data."));
        assert!(!text.contains("Dropped"));
    }
}

//! CLI argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use portfolio_dashboard_core::models::settings::LookbackPeriod;

/// Portfolio Dashboard - USD/CAD holdings valuation in the terminal
#[derive(Parser)]
#[command(name = "portfolio-dashboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the TOML configuration (defaults to ./portfolio.toml, then built-in holdings)
    #[arg(short, long, env = "PORTFOLIO_DASHBOARD_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Alpha Vantage API key, enables the fallback quote provider
    #[arg(long, env = "ALPHAVANTAGE_API_KEY", hide_env_values = true, global = true)]
    pub alphavantage_key: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Value the configured portfolios and render the dashboard (default)
    Show(ShowArgs),

    /// Write a starter configuration file with the built-in holdings
    Init(InitArgs),
}

pub const DEFAULT_CHART_WIDTH: usize = 72;
pub const DEFAULT_CHART_HEIGHT: usize = 16;

#[derive(Args)]
pub struct ShowArgs {
    /// Only show this portfolio
    #[arg(short, long)]
    pub portfolio: Option<String>,

    /// History lookback window (1mo, 3mo, 6mo, 1y, 2y, 5y)
    #[arg(long, value_parser = parse_period)]
    pub period: Option<LookbackPeriod>,

    /// Chart width in columns
    #[arg(long, default_value_t = DEFAULT_CHART_WIDTH)]
    pub chart_width: usize,

    /// Chart height in rows
    #[arg(long, default_value_t = DEFAULT_CHART_HEIGHT)]
    pub chart_height: usize,
}

impl Default for ShowArgs {
    fn default() -> Self {
        Self {
            portfolio: None,
            period: None,
            chart_width: DEFAULT_CHART_WIDTH,
            chart_height: DEFAULT_CHART_HEIGHT,
        }
    }
}

#[derive(Args)]
pub struct InitArgs {
    /// Destination file
    #[arg(default_value = "portfolio.toml")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Tables, totals and terminal charts
    #[default]
    Table,
    /// The full report as JSON
    Json,
}

fn parse_period(s: &str) -> Result<LookbackPeriod, String> {
    s.parse().map_err(|e: portfolio_dashboard_core::errors::CoreError| e.to_string())
}

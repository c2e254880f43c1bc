//! Portfolio Dashboard CLI - values USD/CAD stock holdings in the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Value every configured portfolio (the default command)
//! portfolio-dashboard
//!
//! # One portfolio with a one-year history chart
//! portfolio-dashboard show --portfolio FHSA --period 1y
//!
//! # The full report as JSON
//! portfolio-dashboard --format json
//!
//! # Write a starter configuration
//! portfolio-dashboard init portfolio.toml
//! ```

use anyhow::Result;
use clap::Parser;

mod chart;
mod cli;
mod commands;
mod config;
mod logging;
mod output;

use cli::{Cli, Commands, ShowArgs};
use config::{load_settings, Overrides};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    logging::init_logging(cli.verbose);

    let format = cli.format;
    match cli.command.unwrap_or(Commands::Show(ShowArgs::default())) {
        Commands::Show(args) => {
            let overrides = Overrides {
                alphavantage_key: cli.alphavantage_key,
                period: args.period,
            };
            let settings = load_settings(cli.config.as_deref(), &overrides)?;
            commands::show::execute(args, settings, format).await?
        }
        Commands::Init(args) => commands::init::execute(args)?,
    }

    Ok(())
}

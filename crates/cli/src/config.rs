//! Configuration resolution: explicit path, then `./portfolio.toml`, then
//! the built-in holdings.

use std::path::Path;

use anyhow::Context;
use portfolio_dashboard_core::models::settings::{LookbackPeriod, Settings};
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "portfolio.toml";

/// Command-line overrides applied on top of the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub alphavantage_key: Option<String>,
    pub period: Option<LookbackPeriod>,
}

pub fn load_settings(path: Option<&Path>, overrides: &Overrides) -> anyhow::Result<Settings> {
    let mut settings = match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Settings::from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            info!("Loading configuration from {DEFAULT_CONFIG_FILE}");
            Settings::from_file(DEFAULT_CONFIG_FILE)
                .with_context(|| format!("failed to load {DEFAULT_CONFIG_FILE}"))?
        }
        None => {
            info!("Using built-in holdings");
            Settings::default()
        }
    };

    apply_overrides(&mut settings, overrides);
    Ok(settings)
}

/// A key from the command line or environment only fills a missing one.
pub fn apply_overrides(settings: &mut Settings, overrides: &Overrides) {
    if let Some(key) = overrides.alphavantage_key.as_deref() {
        if settings.api_key("alphavantage").is_none() && !key.trim().is_empty() {
            settings
                .api_keys
                .insert("alphavantage".to_string(), key.trim().to_string());
        }
    }
    if let Some(period) = overrides.period {
        settings.history_period = period;
    }
}

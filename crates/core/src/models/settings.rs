use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::errors::CoreError;

use super::holding::{HoldingSpec, PortfolioConfig};

/// Day-over-day moves larger than this fraction are treated as bad data.
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 0.5;

/// How far back the historical chart reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LookbackPeriod {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[default]
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl LookbackPeriod {
    pub fn months(&self) -> u32 {
        match self {
            LookbackPeriod::OneMonth => 1,
            LookbackPeriod::ThreeMonths => 3,
            LookbackPeriod::SixMonths => 6,
            LookbackPeriod::OneYear => 12,
            LookbackPeriod::TwoYears => 24,
            LookbackPeriod::FiveYears => 60,
        }
    }

    /// Inclusive `(from, to)` window ending at `today`.
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let from = today
            .checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN);
        (from, today)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LookbackPeriod::OneMonth => "1mo",
            LookbackPeriod::ThreeMonths => "3mo",
            LookbackPeriod::SixMonths => "6mo",
            LookbackPeriod::OneYear => "1y",
            LookbackPeriod::TwoYears => "2y",
            LookbackPeriod::FiveYears => "5y",
        }
    }
}

impl std::fmt::Display for LookbackPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LookbackPeriod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1mo" => Ok(LookbackPeriod::OneMonth),
            "3mo" => Ok(LookbackPeriod::ThreeMonths),
            "6mo" => Ok(LookbackPeriod::SixMonths),
            "1y" => Ok(LookbackPeriod::OneYear),
            "2y" => Ok(LookbackPeriod::TwoYears),
            "5y" => Ok(LookbackPeriod::FiveYears),
            other => Err(CoreError::Config(format!(
                "unknown history period '{other}' (expected 1mo, 3mo, 6mo, 1y, 2y or 5y)"
            ))),
        }
    }
}

fn default_outlier_threshold() -> f64 {
    DEFAULT_OUTLIER_THRESHOLD
}

/// Dashboard configuration, read from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Lookback window of the historical chart
    #[serde(default)]
    pub history_period: LookbackPeriod,

    /// Maximum accepted day-over-day change of the aggregate value (0.5 = 50%)
    #[serde(default = "default_outlier_threshold")]
    pub outlier_threshold: f64,

    /// Optional API keys, keyed by provider (e.g. "alphavantage").
    #[serde(default)]
    pub api_keys: HashMap<String, String>,

    #[serde(default)]
    pub portfolios: Vec<PortfolioConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_period: LookbackPeriod::default(),
            outlier_threshold: DEFAULT_OUTLIER_THRESHOLD,
            api_keys: HashMap::new(),
            portfolios: vec![default_main_portfolio(), default_fhsa_portfolio()],
        }
    }
}

impl Settings {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, CoreError> {
        let mut settings: Settings = toml::from_str(s)?;
        settings.normalize();
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, CoreError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.outlier_threshold.is_finite() || self.outlier_threshold <= 0.0 {
            return Err(CoreError::Config(format!(
                "outlier_threshold must be positive, got {}",
                self.outlier_threshold
            )));
        }
        let mut names = std::collections::HashSet::new();
        for portfolio in &self.portfolios {
            portfolio.validate()?;
            if !names.insert(portfolio.name.to_lowercase()) {
                return Err(CoreError::Config(format!(
                    "duplicate portfolio name: {}",
                    portfolio.name
                )));
            }
        }
        Ok(())
    }

    pub fn portfolio(&self, name: &str) -> Option<&PortfolioConfig> {
        self.portfolios
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn api_key(&self, provider: &str) -> Option<&str> {
        self.api_keys
            .get(provider)
            .map(String::as_str)
            .filter(|k| !k.trim().is_empty())
    }

    // Symbols from a file are written by hand; providers expect them uppercased.
    fn normalize(&mut self) {
        for portfolio in &mut self.portfolios {
            portfolio.name = portfolio.name.trim().to_string();
            for holding in &mut portfolio.holdings {
                holding.symbol = holding.symbol.trim().to_uppercase();
            }
        }
    }
}

fn default_main_portfolio() -> PortfolioConfig {
    PortfolioConfig::new(
        "Main",
        vec![
            HoldingSpec::usd("PLTR", 561.0, 20.6602),
            HoldingSpec::usd("CONL", 135.0, 36.95),
            HoldingSpec::usd("GME", 30.0, 28.39),
            HoldingSpec::usd("CLSK", 70.0, 16.56),
            HoldingSpec::usd("BTBT", 300.0, 4.07),
            HoldingSpec::usd("CIFR", 350.0, 4.04),
            HoldingSpec::usd("NU260116C00025000", 10.0, 0.29),
            HoldingSpec::cad("ETHX-B.TO", 8.0, 19.97),
            HoldingSpec::cad("BITF.TO", 521.0, 3.39),
            HoldingSpec::cad("BTCC-B.TO", 220.5312, 7.96),
            HoldingSpec::cad("HUT.TO", 40.0, 13.52),
            HoldingSpec::cad("SHOP.TO", 4.0, 96.58),
            HoldingSpec::cad("TSLA.NE", 258.0, 22.01),
        ],
    )
}

fn default_fhsa_portfolio() -> PortfolioConfig {
    PortfolioConfig::new(
        "FHSA",
        vec![
            HoldingSpec::cad("ETHX-B.TO", 21.0, 14.14),
            HoldingSpec::cad("BITF.TO", 2079.0, 2.47),
            HoldingSpec::cad("FBTC.TO", 11.0, 21.87),
            HoldingSpec::cad("SHOP.TO", 29.0, 96.84),
        ],
    )
}

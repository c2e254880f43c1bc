use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Currency a holding is quoted and bought in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD", alias = "usd")]
    Usd,
    #[serde(rename = "CAD", alias = "cad")]
    Cad,
}

impl Currency {
    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Cad => "CAD",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "CAD" => Ok(Currency::Cad),
            other => Err(CoreError::ValidationError(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

/// A position in a single tradable symbol.
///
/// Holdings are static inputs: they come from the configuration file and
/// are never mutated during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingSpec {
    /// Ticker as understood by the market-data provider (e.g. "PLTR", "SHOP.TO")
    pub symbol: String,

    /// Units held; may be fractional
    pub quantity: f64,

    /// Per-unit acquisition price, in `currency`
    pub cost_basis: f64,

    /// Currency the symbol trades in
    pub currency: Currency,
}

impl HoldingSpec {
    pub fn new(symbol: impl Into<String>, quantity: f64, cost_basis: f64, currency: Currency) -> Self {
        Self {
            symbol: symbol.into().trim().to_uppercase(),
            quantity,
            cost_basis,
            currency,
        }
    }

    pub fn usd(symbol: impl Into<String>, quantity: f64, cost_basis: f64) -> Self {
        Self::new(symbol, quantity, cost_basis, Currency::Usd)
    }

    pub fn cad(symbol: impl Into<String>, quantity: f64, cost_basis: f64) -> Self {
        Self::new(symbol, quantity, cost_basis, Currency::Cad)
    }

    /// Quantity × cost basis, in the holding's own currency.
    pub fn book_value(&self) -> f64 {
        self.quantity * self.cost_basis
    }

    /// Reject holdings the valuation cannot price meaningfully.
    ///
    /// A zero cost basis is allowed; percent-change-from-cost is then
    /// reported as undefined.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.symbol.trim().is_empty() {
            return Err(CoreError::ValidationError("symbol must not be empty".into()));
        }
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "{}: quantity must be finite and non-negative, got {}",
                self.symbol, self.quantity
            )));
        }
        if !self.cost_basis.is_finite() || self.cost_basis < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "{}: cost basis must be finite and non-negative, got {}",
                self.symbol, self.cost_basis
            )));
        }
        Ok(())
    }
}

/// A named set of holdings valued together (e.g. "Main", "FHSA").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    pub name: String,
    pub holdings: Vec<HoldingSpec>,
}

impl PortfolioConfig {
    pub fn new(name: impl Into<String>, holdings: Vec<HoldingSpec>) -> Self {
        Self {
            name: name.into(),
            holdings,
        }
    }

    /// Validate every holding and reject duplicate symbols.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "portfolio name must not be empty".into(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for holding in &self.holdings {
            holding.validate()?;
            if !seen.insert(holding.symbol.to_uppercase()) {
                return Err(CoreError::ValidationError(format!(
                    "{}: duplicate symbol {}",
                    self.name, holding.symbol
                )));
            }
        }
        Ok(())
    }
}

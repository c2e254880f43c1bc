use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::holding::Currency;

/// USD→CAD rate (CAD per 1 USD), fetched once per run.
///
/// Construction guarantees the rate is finite and strictly positive, so
/// conversions never divide by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ExchangeRate(f64);

impl ExchangeRate {
    pub fn new(usd_to_cad: f64) -> Result<Self, CoreError> {
        if !usd_to_cad.is_finite() || usd_to_cad <= 0.0 {
            return Err(CoreError::InvalidExchangeRate(usd_to_cad));
        }
        Ok(Self(usd_to_cad))
    }

    pub fn usd_to_cad(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for ExchangeRate {
    type Error = CoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExchangeRate> for f64 {
    fn from(rate: ExchangeRate) -> Self {
        rate.0
    }
}

/// An amount expressed in both dashboard currencies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvertedAmount {
    pub cad: f64,
    pub usd: f64,
}

/// Converts native amounts between USD and CAD at a fixed rate.
///
/// The same rate is applied to every amount of a run, historical series
/// included (no time-varying FX).
pub struct CurrencyService;

impl CurrencyService {
    pub fn new() -> Self {
        Self
    }

    /// Express `amount` (in `currency`) in both CAD and USD.
    pub fn convert(&self, amount: f64, currency: Currency, rate: ExchangeRate) -> ConvertedAmount {
        ConvertedAmount {
            cad: self.to_cad(amount, currency, rate),
            usd: self.to_usd(amount, currency, rate),
        }
    }

    pub fn to_cad(&self, amount: f64, currency: Currency, rate: ExchangeRate) -> f64 {
        match currency {
            Currency::Usd => amount * rate.usd_to_cad(),
            Currency::Cad => amount,
        }
    }

    pub fn to_usd(&self, amount: f64, currency: Currency, rate: ExchangeRate) -> f64 {
        match currency {
            Currency::Usd => amount,
            Currency::Cad => amount / rate.usd_to_cad(),
        }
    }
}

impl Default for CurrencyService {
    fn default() -> Self {
        Self::new()
    }
}

//! Engine configuration and the configuration error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::strategy::RegistryError;

/// Invalid configuration. Always raised before any bar is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("initial_balance must be > 0, got {0}")]
    InvalidBalance(f64),
    #[error("slippage_pct must be >= 0, got {0}")]
    InvalidSlippage(f64),
    #[error("fee_pct must be >= 0, got {0}")]
    InvalidFee(f64),
    #[error("{name} must be in (0, 1], got {value}")]
    InvalidDecay { name: &'static str, value: f64 },
    #[error("invalid risk configuration: {}", .0.join("; "))]
    InvalidRisk(Vec<String>),
    #[error(
        "bars for {symbol}/{timeframe} are not strictly ascending at index {index} ({current} after {previous})"
    )]
    UnsortedBars {
        symbol: String,
        timeframe: String,
        index: usize,
        previous: chrono::DateTime<chrono::Utc>,
        current: chrono::DateTime<chrono::Utc>,
    },
    #[error("duplicate strategy instance {0}")]
    DuplicateStrategy(String),
    #[error(transparent)]
    Strategy(#[from] RegistryError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_balance: f64,
    /// Fraction of price added against the trader on every fill.
    pub slippage_pct: f64,
    /// Fraction of notional charged on entry and on exit.
    pub fee_pct: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_balance: 10_000.0,
            slippage_pct: 0.0,
            fee_pct: 0.0,
        }
    }
}

impl EngineConfig {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            ..Self::default()
        }
    }

    pub fn with_costs(mut self, slippage_pct: f64, fee_pct: f64) -> Self {
        self.slippage_pct = slippage_pct;
        self.fee_pct = fee_pct;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(ConfigError::InvalidBalance(self.initial_balance));
        }
        if !(self.slippage_pct.is_finite() && self.slippage_pct >= 0.0) {
            return Err(ConfigError::InvalidSlippage(self.slippage_pct));
        }
        if !(self.fee_pct.is_finite() && self.fee_pct >= 0.0) {
            return Err(ConfigError::InvalidFee(self.fee_pct));
        }
        Ok(())
    }
}

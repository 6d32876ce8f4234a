//! Signal: a strategy's trade recommendation for one bar.
//!
//! Signals are immutable once produced. The timestamp is always the timestamp
//! of the bar the signal was computed on, never wall-clock time, so replays
//! are reproducible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bar::DataError;

/// What the strategy recommends doing on this bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

impl SignalAction {
    /// The action that would reverse this one. Hold has no opposite.
    pub fn opposite(self) -> Option<SignalAction> {
        match self {
            SignalAction::Buy => Some(SignalAction::Sell),
            SignalAction::Sell => Some(SignalAction::Buy),
            SignalAction::Hold => None,
        }
    }

    pub fn is_entry(self) -> bool {
        !matches!(self, SignalAction::Hold)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub action: SignalAction,
    /// Conviction in [0, 1].
    pub confidence: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub symbol: String,
    pub timeframe: String,
    pub timestamp: DateTime<Utc>,
    pub strategy: String,
}

impl Signal {
    /// Attach stop-loss / take-profit levels.
    pub fn with_levels(mut self, stop_loss: Option<f64>, take_profit: Option<f64>) -> Self {
        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self
    }

    pub fn is_hold(&self) -> bool {
        self.action == SignalAction::Hold
    }

    /// Reject signals whose fields the engine cannot act on.
    pub fn validate(&self) -> Result<(), DataError> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(self.invalid(format!("confidence {} outside [0, 1]", self.confidence)));
        }
        for (label, level) in [("stop_loss", self.stop_loss), ("take_profit", self.take_profit)] {
            if let Some(price) = level {
                if !price.is_finite() || price <= 0.0 {
                    return Err(self.invalid(format!("{label} {price} is not a positive price")));
                }
            }
        }
        Ok(())
    }

    /// Reject stop/take levels on the wrong side of `entry` for this action.
    ///
    /// Buy: `stop_loss <= entry <= take_profit`. Sell is mirrored. A stop at
    /// the entry price is left to sizing, which gives it zero quantity.
    pub fn validate_levels(&self, entry: f64) -> Result<(), DataError> {
        let (sl_ok, tp_ok) = match self.action {
            SignalAction::Buy => (
                self.stop_loss.map_or(true, |sl| sl <= entry),
                self.take_profit.map_or(true, |tp| tp >= entry),
            ),
            SignalAction::Sell => (
                self.stop_loss.map_or(true, |sl| sl >= entry),
                self.take_profit.map_or(true, |tp| tp <= entry),
            ),
            SignalAction::Hold => (true, true),
        };
        if !sl_ok {
            return Err(self.invalid(format!(
                "stop_loss {:?} on the wrong side of entry {entry} for {:?}",
                self.stop_loss, self.action
            )));
        }
        if !tp_ok {
            return Err(self.invalid(format!(
                "take_profit {:?} on the wrong side of entry {entry} for {:?}",
                self.take_profit, self.action
            )));
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> DataError {
        DataError::InvalidSignal {
            strategy: self.strategy.clone(),
            reason,
        }
    }
}

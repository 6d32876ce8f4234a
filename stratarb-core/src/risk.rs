//! Risk manager: position sizing, ATR stop/take levels, drawdown gating and
//! per-strategy leverage.
//!
//! Stateless apart from its `RiskConfig`. Every sizing function returns a
//! quantity in `[0, max_position]`; a zero quantity means "do not trade".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::indicators::mean_true_range;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Fraction of balance put at risk per trade when a stop is known.
    pub risk_percent: f64,
    /// Upper bound on any position quantity.
    pub max_position: f64,
    pub atr_period: usize,
    pub sl_mult: f64,
    pub tp_mult: f64,
    /// Daily loss limit used when the caller gives none.
    pub max_daily_drawdown: f64,
    /// Strategy name -> leverage. Missing strategies trade at 1.0.
    pub leverage: BTreeMap<String, f64>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_percent: 0.01,
            max_position: 1.0,
            atr_period: 14,
            sl_mult: 1.5,
            tp_mult: 3.0,
            max_daily_drawdown: 0.05,
            leverage: BTreeMap::new(),
        }
    }
}

impl RiskConfig {
    /// Returns a list of problems; empty means valid.
    pub fn problems(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !(self.risk_percent.is_finite() && self.risk_percent >= 0.0) {
            out.push(format!("risk_percent must be >= 0, got {}", self.risk_percent));
        }
        if !(self.max_position.is_finite() && self.max_position > 0.0) {
            out.push(format!("max_position must be > 0, got {}", self.max_position));
        }
        if self.atr_period == 0 {
            out.push("atr_period must be >= 1".to_string());
        }
        if !(self.sl_mult.is_finite() && self.sl_mult > 0.0) {
            out.push(format!("sl_mult must be > 0, got {}", self.sl_mult));
        }
        if !(self.tp_mult.is_finite() && self.tp_mult > 0.0) {
            out.push(format!("tp_mult must be > 0, got {}", self.tp_mult));
        }
        if !(self.max_daily_drawdown.is_finite() && self.max_daily_drawdown >= 0.0) {
            out.push(format!(
                "max_daily_drawdown must be >= 0, got {}",
                self.max_daily_drawdown
            ));
        }
        for (name, lev) in &self.leverage {
            if !(lev.is_finite() && *lev > 0.0) {
                out.push(format!("leverage for '{name}' must be > 0, got {lev}"));
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default)]
pub struct RiskManager {
    config: RiskConfig,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Quantity for an entry at `price`.
    ///
    /// Without a stop the whole balance is deployed. With a stop, the
    /// position is sized so that hitting it loses `balance * risk_percent`.
    /// A stop at the entry price yields 0.
    pub fn size_position(&self, balance: f64, price: f64, stop_price: Option<f64>) -> f64 {
        if !(price > 0.0 && balance > 0.0) {
            return 0.0;
        }
        let qty = match stop_price {
            None => balance / price,
            Some(stop) => {
                let risk_per_unit = (price - stop).abs();
                if !(risk_per_unit > 0.0) {
                    return 0.0;
                }
                balance * self.config.risk_percent / risk_per_unit
            }
        };
        self.cap(qty)
    }

    /// ATR-based `(stop_loss, take_profit)` around the last close.
    ///
    /// Returns `None` when the slices differ in length or hold fewer than
    /// `atr_period + 1` bars.
    pub fn atr_levels(&self, highs: &[f64], lows: &[f64], closes: &[f64]) -> Option<(f64, f64)> {
        let atr = mean_true_range(highs, lows, closes, self.config.atr_period)?;
        let last = *closes.last()?;
        Some((
            last - atr * self.config.sl_mult,
            last + atr * self.config.tp_mult,
        ))
    }

    /// Confidence-scaled, volatility-adjusted quantity.
    pub fn compute_position_size(&self, confidence: f64, volatility: f64, balance: f64) -> f64 {
        if !(balance > 0.0) {
            return 0.0;
        }
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
        let divisor = if volatility > 0.0 { volatility } else { 1.0 };
        self.cap(balance * self.config.risk_percent * confidence / divisor)
    }

    /// True while `daily_loss` stays strictly below the limit.
    pub fn enforce_max_drawdown(&self, daily_loss: f64, max_loss: Option<f64>) -> bool {
        daily_loss < max_loss.unwrap_or(self.config.max_daily_drawdown)
    }

    pub fn adjust_leverage(&self, strategy: &str) -> f64 {
        self.config.leverage.get(strategy).copied().unwrap_or(1.0)
    }

    fn cap(&self, qty: f64) -> f64 {
        if qty.is_finite() {
            qty.clamp(0.0, self.config.max_position)
        } else {
            0.0
        }
    }
}

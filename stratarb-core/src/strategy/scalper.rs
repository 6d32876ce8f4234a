//! Scalper: short EMA cross, gated by a low-volatility filter, with tight ATR levels.

use crate::domain::{Bar, Signal, SignalAction};
use crate::indicators::{mean_true_range, returns_volatility, EmaState};

use super::{BarContext, Binding, Strategy, StrategyError};

#[derive(Debug, Clone)]
pub struct ScalperParams {
    pub fast: usize,
    pub slow: usize,
    pub vol_window: usize,
    /// Maximum return volatility at which the scalper still trades.
    pub vol_threshold: f64,
    pub atr_period: usize,
    /// Stop and target distance as a multiple of ATR.
    pub level_mult: f64,
}

impl Default for ScalperParams {
    fn default() -> Self {
        Self {
            fast: 3,
            slow: 8,
            vol_window: 20,
            vol_threshold: 0.005,
            atr_period: 14,
            level_mult: 0.3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scalper {
    binding: Binding,
    pub params: ScalperParams,
    fast: EmaState,
    slow: EmaState,
}

impl Scalper {
    pub fn new(binding: Binding, params: ScalperParams) -> Self {
        assert!(params.fast >= 1, "fast must be >= 1");
        assert!(params.slow > params.fast, "slow must be > fast");
        assert!(params.vol_window >= 2, "vol_window must be >= 2");
        assert!(params.atr_period >= 1, "atr_period must be >= 1");
        Self {
            binding,
            fast: EmaState::new(params.fast),
            slow: EmaState::new(params.slow),
            params,
        }
    }

    /// Symmetric ATR stop/target around `price`, oriented by `action`.
    fn levels(&self, ctx: &BarContext<'_>, action: SignalAction) -> (Option<f64>, Option<f64>) {
        let window = ctx.tail(self.params.atr_period + 1);
        let highs: Vec<f64> = window.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = window.iter().map(|b| b.low).collect();
        let closes: Vec<f64> = window.iter().map(|b| b.close).collect();
        let Some(atr) = mean_true_range(&highs, &lows, &closes, self.params.atr_period) else {
            return (None, None);
        };
        let price = ctx.current().close;
        let offset = atr * self.params.level_mult;
        match action {
            SignalAction::Buy => (Some(price - offset), Some(price + offset)),
            SignalAction::Sell => (Some(price + offset), Some(price - offset)),
            SignalAction::Hold => (None, None),
        }
    }
}

impl Strategy for Scalper {
    fn binding(&self) -> &Binding {
        &self.binding
    }

    fn warmup_bars(&self) -> usize {
        (self.params.slow + 1).max(self.params.vol_window + 1)
    }

    fn on_data(&mut self, bar: &Bar) {
        self.fast.update(bar.close);
        self.slow.update(bar.close);
    }

    fn generate_signal(&mut self, ctx: &BarContext<'_>) -> Result<Signal, StrategyError> {
        if ctx.len() < self.params.slow + 1 {
            return Ok(ctx.hold(self.name()));
        }
        let (Some(fast), Some(slow)) = (self.fast.value(), self.slow.value()) else {
            return Ok(ctx.hold(self.name()));
        };

        let closes: Vec<f64> = ctx
            .tail(self.params.vol_window + 1)
            .iter()
            .map(|b| b.close)
            .collect();
        match returns_volatility(&closes, self.params.vol_window) {
            Some(vol) if vol <= self.params.vol_threshold => {}
            _ => return Ok(ctx.hold(self.name())),
        }

        let action = if fast > slow {
            SignalAction::Buy
        } else if fast < slow {
            SignalAction::Sell
        } else {
            return Ok(ctx.hold(self.name()));
        };
        let (sl, tp) = self.levels(ctx, action);
        Ok(ctx.signal(self.name(), action, 0.7).with_levels(sl, tp))
    }
}

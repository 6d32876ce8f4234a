//! Mean reversion: buy dips below the moving average, sell rallies above it.

use crate::domain::{Signal, SignalAction};
use crate::indicators::sma_of_series;

use super::{BarContext, Binding, Strategy, StrategyError};

#[derive(Debug, Clone)]
pub struct MeanReversion {
    binding: Binding,
    pub window: usize,
    /// Fractional band around the SMA (0.01 = 1%).
    pub threshold: f64,
}

impl MeanReversion {
    pub fn new(binding: Binding, window: usize, threshold: f64) -> Self {
        assert!(window >= 1, "window must be >= 1");
        assert!(threshold >= 0.0, "threshold must be >= 0");
        Self {
            binding,
            window,
            threshold,
        }
    }
}

impl Strategy for MeanReversion {
    fn binding(&self) -> &Binding {
        &self.binding
    }

    fn warmup_bars(&self) -> usize {
        self.window
    }

    fn generate_signal(&mut self, ctx: &BarContext<'_>) -> Result<Signal, StrategyError> {
        if ctx.len() < self.window {
            return Ok(ctx.hold(self.name()));
        }
        let closes = ctx.closes();
        let sma = sma_of_series(&closes, self.window)
            .last()
            .copied()
            .unwrap_or(f64::NAN);
        let sma = super::finite(sma, "sma")?;
        let last = ctx.current().close;

        let action = if last < sma * (1.0 - self.threshold) {
            SignalAction::Buy
        } else if last > sma * (1.0 + self.threshold) {
            SignalAction::Sell
        } else {
            SignalAction::Hold
        };
        Ok(ctx.signal(self.name(), action, 1.0))
    }
}

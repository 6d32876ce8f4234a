//! EMA crossover: long while the fast EMA is above the slow EMA, short while below.

use crate::domain::{Bar, Signal, SignalAction};
use crate::indicators::EmaState;

use super::{BarContext, Binding, Strategy, StrategyError};

/// Trend-state follower on two incrementally tracked EMAs.
///
/// The signal reflects the current regime (fast vs slow), not only the
/// crossing bar, so a flat engine re-enters on the next tick after an exit.
#[derive(Debug, Clone)]
pub struct EmaCrossover {
    binding: Binding,
    pub fast_period: usize,
    pub slow_period: usize,
    fast: EmaState,
    slow: EmaState,
}

impl EmaCrossover {
    pub fn new(binding: Binding, fast_period: usize, slow_period: usize) -> Self {
        assert!(fast_period >= 1, "fast_period must be >= 1");
        assert!(slow_period > fast_period, "slow_period must be > fast_period");
        Self {
            binding,
            fast_period,
            slow_period,
            fast: EmaState::new(fast_period),
            slow: EmaState::new(slow_period),
        }
    }
}

impl Strategy for EmaCrossover {
    fn binding(&self) -> &Binding {
        &self.binding
    }

    fn warmup_bars(&self) -> usize {
        self.slow_period
    }

    fn on_data(&mut self, bar: &Bar) {
        self.fast.update(bar.close);
        self.slow.update(bar.close);
    }

    fn generate_signal(&mut self, ctx: &BarContext<'_>) -> Result<Signal, StrategyError> {
        let (fast, slow) = match (self.fast.value(), self.slow.value()) {
            (Some(f), Some(s)) => (f, s),
            _ => return Ok(ctx.hold(self.name())),
        };
        let fast = super::finite(fast, "ema_fast")?;
        let slow = super::finite(slow, "ema_slow")?;

        let action = if fast > slow {
            SignalAction::Buy
        } else if fast < slow {
            SignalAction::Sell
        } else {
            SignalAction::Hold
        };
        Ok(ctx.signal(self.name(), action, 1.0))
    }
}

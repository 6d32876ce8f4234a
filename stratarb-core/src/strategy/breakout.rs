//! Channel breakout: buy when the close sets a new `window`-bar high, sell on a new low.

use crate::domain::{Signal, SignalAction};

use super::{BarContext, Binding, Strategy, StrategyError};

#[derive(Debug, Clone)]
pub struct Breakout {
    binding: Binding,
    pub window: usize,
}

impl Breakout {
    pub fn new(binding: Binding, window: usize) -> Self {
        assert!(window >= 2, "window must be >= 2");
        Self { binding, window }
    }
}

impl Strategy for Breakout {
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
        let closes = ctx.tail(self.window).iter().map(|b| b.close);
        let (lo, hi) = closes.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
            (lo.min(c), hi.max(c))
        });
        let last = ctx.current().close;

        // A flat channel has last == max == min; the high side wins.
        let action = if last >= hi {
            SignalAction::Buy
        } else if last <= lo {
            SignalAction::Sell
        } else {
            SignalAction::Hold
        };
        Ok(ctx.signal(self.name(), action, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::run_actions;

    #[test]
    fn detects_channel_extremes() {
        let mut s = Breakout::new(Binding::new("breakout", "SOLUSDT", "1h"), 3);
        let actions = run_actions(&mut s, &[10.0, 11.0, 12.0, 11.5, 9.0, 10.0]);
        assert_eq!(actions[1], SignalAction::Hold); // warmup
        assert_eq!(actions[2], SignalAction::Buy); // 12 = max(10, 11, 12)
        assert_eq!(actions[3], SignalAction::Hold);
        assert_eq!(actions[4], SignalAction::Sell); // 9 = min(12, 11.5, 9)
        assert_eq!(actions[5], SignalAction::Hold);
    }
}

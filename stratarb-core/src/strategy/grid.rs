//! ATR grid: trade each move of one grid step away from the last traded level.
//!
//! The grid step is `ATR(atr_period) * grid_mult`. The first bar with a
//! defined ATR sets the reference level. A close one step above it sells,
//! one step below buys, and either moves the reference to that close.

use crate::domain::{Signal, SignalAction};
use crate::indicators::mean_true_range;

use super::{BarContext, Binding, Strategy, StrategyError};

#[derive(Debug, Clone)]
pub struct Grid {
    binding: Binding,
    pub atr_period: usize,
    pub grid_mult: f64,
    last_level: Option<f64>,
}

impl Grid {
    pub fn new(binding: Binding, atr_period: usize, grid_mult: f64) -> Self {
        assert!(atr_period >= 1, "atr_period must be >= 1");
        assert!(grid_mult > 0.0, "grid_mult must be > 0");
        Self {
            binding,
            atr_period,
            grid_mult,
            last_level: None,
        }
    }
}

impl Strategy for Grid {
    fn binding(&self) -> &Binding {
        &self.binding
    }

    fn warmup_bars(&self) -> usize {
        self.atr_period + 1
    }

    fn generate_signal(&mut self, ctx: &BarContext<'_>) -> Result<Signal, StrategyError> {
        let window = ctx.tail(self.atr_period + 1);
        let highs: Vec<f64> = window.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = window.iter().map(|b| b.low).collect();
        let closes: Vec<f64> = window.iter().map(|b| b.close).collect();
        let atr = match mean_true_range(&highs, &lows, &closes, self.atr_period) {
            Some(atr) => atr,
            None => return Ok(ctx.hold(self.name())),
        };

        let price = ctx.current().close;
        let step = atr * self.grid_mult;
        let level = match self.last_level {
            Some(level) => level,
            None => {
                self.last_level = Some(price);
                return Ok(ctx.hold(self.name()));
            }
        };

        if price >= level + step {
            self.last_level = Some(price);
            Ok(ctx.signal(self.name(), SignalAction::Sell, 0.5))
        } else if price <= level - step {
            self.last_level = Some(price);
            Ok(ctx.signal(self.name(), SignalAction::Buy, 0.5))
        } else {
            Ok(ctx.hold(self.name()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::run_actions;

    #[test]
    fn trades_grid_steps() {
        // make_bars gives each bar a range of |close - prev| + 2.
        let mut s = Grid::new(Binding::new("grid", "ETHUSDT", "15m"), 2, 1.0);
        let actions = run_actions(&mut s, &[100.0, 100.0, 100.0, 104.0, 104.0, 99.0]);
        assert_eq!(actions[1], SignalAction::Hold); // ATR undefined
        assert_eq!(actions[2], SignalAction::Hold); // sets level 100, ATR = 2
        assert_eq!(actions[3], SignalAction::Sell); // ATR = 4, 104 >= 100 + 4
        assert_eq!(actions[4], SignalAction::Hold); // ATR = 4, level 104
        assert_eq!(actions[5], SignalAction::Buy); // ATR = 4.5, 99 <= 104 - 4.5
    }
}

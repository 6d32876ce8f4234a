//! Liquidity sweep: fade a bar whose wick takes out the recent range.
//!
//! If the current high exceeds every high of the previous `lookback` bars the
//! buy-side liquidity was swept and the strategy sells; a sweep of the lows
//! buys. The high side is checked first.

use crate::domain::{Signal, SignalAction};

use super::{BarContext, Binding, Strategy, StrategyError};

#[derive(Debug, Clone)]
pub struct LiquiditySweep {
    binding: Binding,
    pub lookback: usize,
    pub confidence: f64,
}

impl LiquiditySweep {
    pub fn new(binding: Binding, lookback: usize) -> Self {
        assert!(lookback >= 1, "lookback must be >= 1");
        Self {
            binding,
            lookback,
            confidence: 0.4,
        }
    }
}

impl Strategy for LiquiditySweep {
    fn binding(&self) -> &Binding {
        &self.binding
    }

    fn warmup_bars(&self) -> usize {
        self.lookback + 1
    }

    fn generate_signal(&mut self, ctx: &BarContext<'_>) -> Result<Signal, StrategyError> {
        if ctx.len() < self.lookback + 1 {
            return Ok(ctx.hold(self.name()));
        }
        let window = ctx.tail(self.lookback + 1);
        let prior = &window[..self.lookback];
        let prev_high = prior.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let prev_low = prior.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let bar = ctx.current();

        if bar.high > prev_high {
            Ok(ctx.signal(self.name(), SignalAction::Sell, self.confidence))
        } else if bar.low < prev_low {
            Ok(ctx.signal(self.name(), SignalAction::Buy, self.confidence))
        } else {
            Ok(ctx.hold(self.name()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use crate::strategy::test_support::run_bars;
    use chrono::{Duration, TimeZone, Utc};

    fn bars(hl: &[(f64, f64)]) -> Vec<Bar> {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        hl.iter()
            .enumerate()
            .map(|(i, &(h, l))| {
                let c = (h + l) / 2.0;
                Bar::new(base + Duration::minutes(15 * i as i64), c, h, l, c, 10.0)
            })
            .collect()
    }

    #[test]
    fn fades_sweeps() {
        let mut s = LiquiditySweep::new(Binding::new("liquidity_sweep", "BTCUSDT", "15m"), 2);
        let actions = run_bars(
            &mut s,
            &bars(&[(105.0, 95.0), (104.0, 96.0), (106.0, 97.0), (104.0, 94.0), (103.0, 95.0)]),
        );
        assert_eq!(actions[1], SignalAction::Hold);
        assert_eq!(actions[2], SignalAction::Sell); // 106 > max(105, 104)
        assert_eq!(actions[3], SignalAction::Buy); // 94 < min(96, 97)
        assert_eq!(actions[4], SignalAction::Hold);
    }
}

//! Swing: trend filter (EMA vs SMA) confirmed by MACD and bounded by RSI.

use crate::domain::{Signal, SignalAction};
use crate::indicators::{ema_of_series, macd, sma_of_series, Indicator, Rsi};

use super::{BarContext, Binding, Strategy, StrategyError};

/// Buys when the fast EMA is above the slow SMA, MACD is above its signal
/// line and RSI is below `rsi_upper`. Sells on the mirror image with RSI
/// above `rsi_lower`.
#[derive(Debug, Clone)]
pub struct Swing {
    binding: Binding,
    pub ema_fast: usize,
    pub sma_slow: usize,
    pub rsi_upper: f64,
    pub rsi_lower: f64,
    rsi: Rsi,
}

impl Swing {
    pub fn new(binding: Binding, ema_fast: usize, sma_slow: usize) -> Self {
        assert!(ema_fast >= 1, "ema_fast must be >= 1");
        assert!(sma_slow >= 1, "sma_slow must be >= 1");
        Self {
            binding,
            ema_fast,
            sma_slow,
            rsi_upper: 70.0,
            rsi_lower: 30.0,
            rsi: Rsi::new(14),
        }
    }
}

impl Strategy for Swing {
    fn binding(&self) -> &Binding {
        &self.binding
    }

    fn warmup_bars(&self) -> usize {
        self.ema_fast.max(self.sma_slow) + 2
    }

    fn generate_signal(&mut self, ctx: &BarContext<'_>) -> Result<Signal, StrategyError> {
        if ctx.len() < self.warmup_bars() {
            return Ok(ctx.hold(self.name()));
        }
        let closes = ctx.closes();

        let ema = ema_of_series(&closes, self.ema_fast)
            .last()
            .copied()
            .unwrap_or(f64::NAN);
        let ema = super::finite(ema, "ema_fast")?;
        let sma = sma_of_series(&closes, self.sma_slow)
            .last()
            .copied()
            .unwrap_or(f64::NAN);
        let sma = super::finite(sma, "sma_slow")?;

        let (Some(m), Some(rsi)) = (macd(&closes, 12, 26, 9), self.rsi.latest(ctx.bars)) else {
            return Ok(ctx.hold(self.name()));
        };

        if ema > sma && m.line > m.signal && rsi < self.rsi_upper {
            Ok(ctx.signal(self.name(), SignalAction::Buy, 0.6))
        } else if ema < sma && m.line < m.signal && rsi > self.rsi_lower {
            Ok(ctx.signal(self.name(), SignalAction::Sell, 0.6))
        } else {
            Ok(ctx.hold(self.name()))
        }
    }
}

//! Strategy interface: turns a bar-history context into a trade recommendation.
//!
//! A strategy is bound to one (symbol, timeframe) series. The engine calls
//! `on_data` with every valid bar, then `generate_signal` with the history up
//! to and including that bar. Strategies never see the bars that follow, and
//! never see engine or position state.

pub mod breakout;
pub mod dca;
pub mod ema_crossover;
pub mod grid;
pub mod hold;
pub mod liquidity_sweep;
pub mod mean_reversion;
pub mod registry;
pub mod scalper;
pub mod swing;

pub use breakout::Breakout;
pub use dca::Dca;
pub use ema_crossover::EmaCrossover;
pub use grid::Grid;
pub use hold::AlwaysHold;
pub use liquidity_sweep::LiquiditySweep;
pub use mean_reversion::MeanReversion;
pub use registry::{RegistryError, StrategyRegistry, StrategySpec};
pub use scalper::Scalper;
pub use swing::Swing;

use thiserror::Error;

use crate::domain::{Bar, Signal, SignalAction};

/// Failure inside a strategy's signal computation. The engine logs it and
/// treats the bar as a hold.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("indicator '{indicator}' produced a non-finite value")]
    NonFinite { indicator: String },
    #[error("{0}")]
    Computation(String),
}

/// Identity of a strategy instance: its name and the series it trades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub symbol: String,
    pub timeframe: String,
}

impl Binding {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        timeframe: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            timeframe: timeframe.into(),
        }
    }
}

/// Bar history visible to a strategy on one tick.
///
/// `bars` holds every valid bar of the series up to and including the
/// current one, oldest first.
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    pub symbol: &'a str,
    pub timeframe: &'a str,
    pub bars: &'a [Bar],
    current: &'a Bar,
}

impl<'a> BarContext<'a> {
    /// Returns `None` for an empty history.
    pub fn new(symbol: &'a str, timeframe: &'a str, bars: &'a [Bar]) -> Option<Self> {
        let current = bars.last()?;
        Some(Self {
            symbol,
            timeframe,
            bars,
            current,
        })
    }

    pub fn current(&self) -> &'a Bar {
        self.current
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    /// The last `n` bars (or fewer if the history is shorter).
    pub fn tail(&self, n: usize) -> &'a [Bar] {
        &self.bars[self.bars.len().saturating_sub(n)..]
    }

    /// Build a signal stamped with the current bar's timestamp.
    pub fn signal(&self, strategy: &str, action: SignalAction, confidence: f64) -> Signal {
        Signal {
            action,
            confidence,
            stop_loss: None,
            take_profit: None,
            symbol: self.symbol.to_string(),
            timeframe: self.timeframe.to_string(),
            timestamp: self.current.timestamp,
            strategy: strategy.to_string(),
        }
    }

    pub fn hold(&self, strategy: &str) -> Signal {
        self.signal(strategy, SignalAction::Hold, 0.0)
    }
}

/// Trait for trading strategies.
///
/// Implementations may keep internal state across ticks (`&mut self`), but
/// that state must be derived only from the bars they have been shown.
pub trait Strategy: Send {
    fn binding(&self) -> &Binding;

    /// Instance name, used as the arbitration arm and in trade records.
    fn name(&self) -> &str {
        &self.binding().name
    }

    fn symbol(&self) -> &str {
        &self.binding().symbol
    }

    fn timeframe(&self) -> &str {
        &self.binding().timeframe
    }

    /// Number of bars needed before the strategy can emit anything but hold.
    fn warmup_bars(&self) -> usize {
        0
    }

    /// Observe a new valid bar before `generate_signal` is called for it.
    fn on_data(&mut self, _bar: &Bar) {}

    fn generate_signal(&mut self, ctx: &BarContext<'_>) -> Result<Signal, StrategyError>;
}

/// Map a non-finite indicator value to a `StrategyError`.
pub(crate) fn finite(value: f64, indicator: &str) -> Result<f64, StrategyError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(StrategyError::NonFinite {
            indicator: indicator.to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::indicators::make_bars;

    /// Feed closes one at a time and collect the action produced on each bar.
    pub fn run_actions(strategy: &mut dyn Strategy, closes: &[f64]) -> Vec<SignalAction> {
        run_bars(strategy, &make_bars(closes))
    }

    pub fn run_bars(strategy: &mut dyn Strategy, bars: &[Bar]) -> Vec<SignalAction> {
        let symbol = strategy.symbol().to_string();
        let timeframe = strategy.timeframe().to_string();
        (0..bars.len())
            .map(|i| {
                strategy.on_data(&bars[i]);
                let ctx = BarContext::new(&symbol, &timeframe, &bars[..=i]).unwrap();
                strategy.generate_signal(&ctx).unwrap().action
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn context_rejects_empty_history() {
        assert!(BarContext::new("BTCUSDT", "1h", &[]).is_none());
    }

    #[test]
    fn context_signal_uses_bar_timestamp() {
        let bars = make_bars(&[100.0, 101.0, 102.0]);
        let ctx = BarContext::new("BTCUSDT", "1h", &bars).unwrap();
        let s = ctx.signal("breakout", SignalAction::Buy, 0.8);
        assert_eq!(s.timestamp, bars[2].timestamp);
        assert_eq!(s.symbol, "BTCUSDT");
        assert_eq!(s.strategy, "breakout");
        assert!(ctx.hold("breakout").is_hold());
    }

    #[test]
    fn context_tail_clamps() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let ctx = BarContext::new("X", "1d", &bars).unwrap();
        assert_eq!(ctx.tail(2).len(), 2);
        assert_eq!(ctx.tail(10).len(), 3);
        assert_eq!(ctx.current().close, 3.0);
    }

    #[test]
    fn finite_maps_nan_to_error() {
        assert_eq!(finite(1.5, "ema_9"), Ok(1.5));
        assert!(matches!(
            finite(f64::NAN, "ema_9"),
            Err(StrategyError::NonFinite { .. })
        ));
    }
}

//! Indicators: pure functions from bar history to a numeric series.
//!
//! Every series has the same length as its input. Warmup positions hold
//! `f64::NAN`. No value at bar t depends on bars after t, so strategies can
//! recompute over the growing context without look-ahead.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod volatility;

pub use atr::mean_true_range;
pub use ema::{ema_of_series, EmaState};
pub use macd::{macd, Macd};
pub use rsi::Rsi;
pub use sma::sma_of_series;
pub use volatility::returns_volatility;

use crate::domain::Bar;

/// Trait for bar-series indicators.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;

    /// Value at the last bar, if it is past warmup and finite.
    fn latest(&self, bars: &[Bar]) -> Option<f64> {
        self.compute(bars).last().copied().filter(|v| v.is_finite())
    }
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

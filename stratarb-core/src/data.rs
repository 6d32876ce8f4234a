//! Bar series helpers: ordering checks and seeded synthetic data.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::Bar;
use crate::engine::ConfigError;

/// Require strictly ascending timestamps (no duplicates).
pub fn validate_series(symbol: &str, timeframe: &str, bars: &[Bar]) -> Result<(), ConfigError> {
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(ConfigError::UnsortedBars {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
                index: i + 1,
                previous: pair[0].timestamp,
                current: pair[1].timestamp,
            });
        }
    }
    Ok(())
}

/// Parameters for a synthetic random-walk series.
#[derive(Debug, Clone)]
pub struct SyntheticSpec {
    pub start: DateTime<Utc>,
    pub step: Duration,
    pub start_price: f64,
    /// Per-bar drift of the log price.
    pub drift: f64,
    /// Per-bar standard deviation of the log-price change (approximate).
    pub volatility: f64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            start: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            step: Duration::hours(1),
            start_price: 100.0,
            drift: 0.0,
            volatility: 0.01,
        }
    }
}

/// Deterministic random-walk bars: same seed, same series.
pub fn synthetic_bars(seed: u64, n: usize) -> Vec<Bar> {
    synthetic_bars_with(seed, n, &SyntheticSpec::default())
}

pub fn synthetic_bars_with(seed: u64, n: usize, spec: &SyntheticSpec) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bars = Vec::with_capacity(n);
    let mut prev_close = spec.start_price;
    // Uniform on [-a, a] has std a / sqrt(3).
    let half_width = spec.volatility * 3f64.sqrt();

    for i in 0..n {
        let shock: f64 = rng.gen_range(-1.0..=1.0) * half_width;
        let open = prev_close;
        let close = open * (spec.drift + shock).exp();
        let wick_up: f64 = rng.gen_range(0.0..=0.5) * half_width;
        let wick_down: f64 = rng.gen_range(0.0..=0.5) * half_width;
        let high = open.max(close) * (1.0 + wick_up);
        let low = open.min(close) * (1.0 - wick_down);
        let volume = rng.gen_range(100.0..10_000.0);
        bars.push(Bar::new(
            spec.start + spec.step * i as i32,
            open,
            high,
            low,
            close,
            volume,
        ));
        prev_close = close;
    }
    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_bars_are_deterministic() {
        assert_eq!(synthetic_bars(7, 50), synthetic_bars(7, 50));
        assert_ne!(synthetic_bars(7, 50), synthetic_bars(8, 50));
    }

    #[test]
    fn synthetic_bars_are_sane_and_ordered() {
        let bars = synthetic_bars(42, 500);
        assert_eq!(bars.len(), 500);
        assert!(bars.iter().all(|b| b.is_sane()));
        assert!(validate_series("SYN", "1h", &bars).is_ok());
    }

    #[test]
    fn duplicate_timestamps_are_rejected() {
        let mut bars = synthetic_bars(1, 3);
        bars[2].timestamp = bars[1].timestamp;
        let err = validate_series("SYN", "1h", &bars).unwrap_err();
        assert!(matches!(err, ConfigError::UnsortedBars { index: 2, .. }));
    }

    #[test]
    fn empty_and_single_series_are_valid() {
        assert!(validate_series("SYN", "1h", &[]).is_ok());
        assert!(validate_series("SYN", "1h", &synthetic_bars(1, 1)).is_ok());
    }
}

//! MACD: difference of a fast and slow EMA, with an EMA signal line.

use super::ema::ema_of_series;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
}

impl Macd {
    pub fn histogram(&self) -> f64 {
        self.line - self.signal
    }
}

/// Latest MACD line and signal line over `closes`.
///
/// Returns `None` until the signal line itself is past warmup
/// (`slow + signal - 1` closes).
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if fast == 0 || slow <= fast || signal == 0 || closes.len() < slow + signal - 1 {
        return None;
    }

    let fast_ema = ema_of_series(closes, fast);
    let slow_ema = ema_of_series(closes, slow);
    // The MACD line is defined from the slow EMA's first valid index onward.
    let line: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .skip(slow - 1)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_of_series(&line, signal);

    let last_line = *line.last()?;
    let last_signal = *signal_line.last()?;
    if last_line.is_finite() && last_signal.is_finite() {
        Some(Macd {
            line: last_line,
            signal: last_signal,
        })
    } else {
        None
    }
}

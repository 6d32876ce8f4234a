//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! `mean_true_range` is the plain mean of the last `period` true ranges,
//! used by the risk manager for stop/take levels.

/// Mean of the last `period` true ranges over parallel high/low/close slices.
///
/// Each true range needs the previous close, so `period + 1` bars are
/// required. Returns `None` on insufficient history, mismatched slice
/// lengths, or non-finite inputs.
pub fn mean_true_range(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Option<f64> {
    let n = closes.len();
    if period == 0 || highs.len() != n || lows.len() != n || n < period + 1 {
        return None;
    }

    let mut sum = 0.0;
    for i in (n - period)..n {
        let (h, l, pc) = (highs[i], lows[i], closes[i - 1]);
        let tr = (h - l).max((h - pc).abs()).max((l - pc).abs());
        if !tr.is_finite() {
            return None;
        }
        sum += tr;
    }
    Some(sum / period as f64)
}

//! Rolling volatility: sample standard deviation of simple returns.

/// Std of the last `window` close-to-close returns. Needs `window + 1` closes.
pub fn returns_volatility(closes: &[f64], window: usize) -> Option<f64> {
    if window < 2 || closes.len() < window + 1 {
        return None;
    }
    let tail = &closes[closes.len() - window - 1..];
    let returns: Vec<f64> = tail
        .windows(2)
        .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { f64::NAN })
        .collect();
    if returns.iter().any(|r| !r.is_finite()) {
        return None;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (returns.len() - 1) as f64;
    Some(var.sqrt())
}

//! Performance metrics: pure functions that compute run statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar
//! out. Percentages (win rate, hit ratio) are on a 0 to 100 scale; drawdown is in
//! account currency.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stratarb_core::{RunResult, Trade};

/// Aggregate metrics for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub net_profit: f64,
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub expectancy: f64,
    pub trade_count: usize,
}

impl Summary {
    pub fn compute(result: &RunResult) -> Self {
        Self {
            net_profit: net_profit(&result.equity_curve, result.initial_balance),
            win_rate: win_rate(&result.trades),
            sharpe_ratio: sharpe_ratio(&result.trades, result.initial_balance),
            max_drawdown: max_drawdown(&result.equity_curve),
            expectancy: expectancy(&result.trades),
            trade_count: result.trades.len(),
        }
    }
}

/// Per-strategy breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyMetrics {
    pub trades: usize,
    pub hit_ratio: f64,
    pub net_return: f64,
}

// ─── Individual metric functions ────────────────────────────────────

/// Final equity minus the initial balance.
pub fn net_profit(equity_curve: &[f64], initial_balance: f64) -> f64 {
    equity_curve.last().map_or(0.0, |last| last - initial_balance)
}

/// Percentage of trades with positive PnL. 0 with no trades.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| t.pnl > 0.0).count();
    wins as f64 / trades.len() as f64 * 100.0
}

/// Per-trade Sharpe: mean / population stdev of `pnl / initial_balance`,
/// scaled by sqrt(trade count). 0 with no trades or zero dispersion.
pub fn sharpe_ratio(trades: &[Trade], initial_balance: f64) -> f64 {
    if trades.is_empty() || initial_balance <= 0.0 {
        return 0.0;
    }
    let n = trades.len() as f64;
    let returns: Vec<f64> = trades.iter().map(|t| t.pnl / initial_balance).collect();
    let mean = returns.iter().sum::<f64>() / n;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    if std == 0.0 || !std.is_finite() {
        return 0.0;
    }
    mean / std * n.sqrt()
}

/// Largest peak-to-trough drop of the equity curve, in currency.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &value in equity_curve {
        peak = peak.max(value);
        max_dd = max_dd.max(peak - value);
    }
    max_dd
}

/// `p * avg_win - (1 - p) * avg_loss`, with losses (pnl <= 0) as a positive average.
pub fn expectancy(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let (wins, losses): (Vec<f64>, Vec<f64>) =
        trades.iter().map(|t| t.pnl).partition(|&p| p > 0.0);
    let avg_win = mean(&wins);
    let avg_loss = -mean(&losses);
    let p = wins.len() as f64 / trades.len() as f64;
    p * avg_win - (1.0 - p) * avg_loss
}

/// Trade count, hit ratio and net return for every strategy in the run,
/// including strategies that never traded.
pub fn per_strategy_metrics(result: &RunResult) -> BTreeMap<String, StrategyMetrics> {
    let mut out: BTreeMap<String, StrategyMetrics> = result
        .strategy_names
        .iter()
        .map(|name| {
            (
                name.clone(),
                StrategyMetrics {
                    trades: 0,
                    hit_ratio: 0.0,
                    net_return: 0.0,
                },
            )
        })
        .collect();

    let mut wins: BTreeMap<&str, usize> = BTreeMap::new();
    for t in &result.trades {
        let m = out.entry(t.strategy.clone()).or_insert(StrategyMetrics {
            trades: 0,
            hit_ratio: 0.0,
            net_return: 0.0,
        });
        m.trades += 1;
        m.net_return += t.pnl;
        if t.pnl > 0.0 {
            *wins.entry(t.strategy.as_str()).or_default() += 1;
        }
    }
    for (name, m) in out.iter_mut() {
        if m.trades > 0 {
            let w = wins.get(name.as_str()).copied().unwrap_or(0);
            m.hit_ratio = w as f64 / m.trades as f64 * 100.0;
        }
    }
    out
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

//! Mutable engine state and the run result.

use serde::{Deserialize, Serialize};

use crate::domain::Trade;

use super::accounting::Ledger;
use super::book::PositionBook;

/// State that evolves tick by tick during a run.
#[derive(Debug)]
pub struct EngineState {
    pub ledger: Ledger,
    pub book: PositionBook,
    pub trades: Vec<Trade>,
    /// Bars processed per strategy, valid or not.
    pub bars_processed: usize,
    pub void_bars: usize,
    pub invalid_signals: usize,
    pub strategy_errors: usize,
    /// Entry signals that sized to zero quantity.
    pub zero_size_entries: usize,
}

impl EngineState {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            ledger: Ledger::new(initial_balance),
            book: PositionBook::new(),
            trades: Vec::new(),
            bars_processed: 0,
            void_bars: 0,
            invalid_signals: 0,
            strategy_errors: 0,
            zero_size_entries: 0,
        }
    }

    pub fn into_result(self, strategy_names: Vec<String>) -> RunResult {
        let initial_balance = self.ledger.initial_balance();
        let final_balance = self.ledger.balance();
        let fees_paid = self.ledger.fees_paid();
        RunResult {
            trades: self.trades,
            equity_curve: self.ledger.into_curve(),
            initial_balance,
            final_balance,
            fees_paid,
            strategy_names,
            bars_processed: self.bars_processed,
            void_bars: self.void_bars,
            invalid_signals: self.invalid_signals,
            strategy_errors: self.strategy_errors,
            zero_size_entries: self.zero_size_entries,
        }
    }
}

/// Result of a complete backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Closed trades in the order they were closed.
    pub trades: Vec<Trade>,
    /// Initial balance followed by the balance after each trade.
    pub equity_curve: Vec<f64>,
    pub initial_balance: f64,
    pub final_balance: f64,
    pub fees_paid: f64,
    /// Every strategy that took part, in run order, deduplicated.
    pub strategy_names: Vec<String>,
    pub bars_processed: usize,
    pub void_bars: usize,
    pub invalid_signals: usize,
    pub strategy_errors: usize,
    pub zero_size_entries: usize,
}

impl RunResult {
    pub fn total_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl).sum()
    }

    pub fn trades_for<'a>(&'a self, strategy: &'a str) -> impl Iterator<Item = &'a Trade> + 'a {
        self.trades.iter().filter(move |t| t.strategy == strategy)
    }

    /// Checks `equity[-1] - equity[0] == sum(pnl)` within `tolerance`.
    pub fn equity_identity_holds(&self, tolerance: f64) -> bool {
        match (self.equity_curve.first(), self.equity_curve.last()) {
            (Some(first), Some(last)) => ((last - first) - self.total_pnl()).abs() <= tolerance,
            _ => false,
        }
    }
}

//! Backtesting engine: single-pass bar replay with one position per
//! (strategy, symbol, timeframe).
//!
//! Per bar, for every strategy bound to the series:
//!
//! 1. Skip void or inconsistent bars (warn, no state change)
//! 2. `on_data`, then `generate_signal` over the valid history so far
//! 3. Flat: open on buy/sell, sized by the `RiskManager`
//! 4. In a position: stop-loss, then take-profit, then opposite signal
//!
//! Anything still open after the last bar is closed at the last valid close.

pub mod accounting;
pub mod book;
pub mod config;
pub mod loop_runner;
pub mod state;

pub use accounting::Ledger;
pub use book::PositionBook;
pub use config::{ConfigError, EngineConfig};
pub use loop_runner::BacktestEngine;
pub use state::{EngineState, RunResult};

//! StratArb Core: domain types, indicators, strategies, risk and the backtest engine.
//!
//! This crate contains:
//! - Domain types (bars, signals, positions, trades)
//! - Indicators as pure functions over bar history
//! - The `Strategy` trait, the strategy registry and the built-in strategies
//! - `RiskManager` sizing and ATR stop/take levels
//! - `BacktestEngine`, a deterministic single-pass bar replay
//!
//! Scoring, arbitration, persistence and reporting live in `stratarb-runner`.

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod risk;
pub mod strategy;

pub use domain::{Bar, SeriesKey, Signal, SignalAction, Trade};
pub use engine::{BacktestEngine, ConfigError, EngineConfig, RunResult};
pub use risk::{RiskConfig, RiskManager};
pub use strategy::{BarContext, Strategy, StrategyError, StrategyRegistry, StrategySpec};

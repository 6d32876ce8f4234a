//! Backtest runner: wires configuration, registry, engine and metrics.
//!
//! - `run_backtest()`: builds strategies from the built-in registry and runs.
//! - `run_backtest_with()`: same, against a caller-supplied registry.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use stratarb_core::strategy::RegistryError;
use stratarb_core::{
    BacktestEngine, Bar, ConfigError, RiskManager, RunResult, SeriesKey, StrategyRegistry,
};

use crate::config::{RunConfig, RunId};
use crate::metrics::{per_strategy_metrics, StrategyMetrics, Summary};
use crate::score_store::PersistenceError;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("strategy error: {0}")]
    Registry(#[from] RegistryError),
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Complete result of one configured backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub summary: Summary,
    pub per_strategy: BTreeMap<String, StrategyMetrics>,
    pub result: RunResult,
}

pub fn run_backtest(
    config: &RunConfig,
    data: &BTreeMap<SeriesKey, Vec<Bar>>,
) -> Result<BacktestReport, RunError> {
    run_backtest_with(config, data, StrategyRegistry::global())
}

pub fn run_backtest_with(
    config: &RunConfig,
    data: &BTreeMap<SeriesKey, Vec<Bar>>,
    registry: &StrategyRegistry,
) -> Result<BacktestReport, RunError> {
    config.validate_with(registry)?;
    let run_id = config.run_id()?;

    let engine = BacktestEngine::new(config.engine.clone(), RiskManager::new(config.risk.clone()))?;
    let mut strategies = registry.create_all(&config.strategies)?;
    let result = engine.run(data, &mut strategies)?;

    let summary = Summary::compute(&result);
    let per_strategy = per_strategy_metrics(&result);
    info!(
        run_id = %run_id,
        trades = summary.trade_count,
        net_profit = summary.net_profit,
        "run finished"
    );

    Ok(BacktestReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        summary,
        per_strategy,
        result,
    })
}

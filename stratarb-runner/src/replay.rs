//! Replay coordinator: backtest, score, decay, select, repeat.
//!
//! Each cycle builds fresh strategy instances from the configured specs,
//! runs them over one window of history, feeds every closed trade's pnl into
//! the `ArbitrationContext` and asks the bandit for the next strategy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use stratarb_core::{BacktestEngine, Bar, RiskManager, RunResult, SeriesKey, StrategyRegistry, StrategySpec};

use crate::config::RunConfig;
use crate::context::ArbitrationContext;
use crate::runner::RunError;

/// Outcome of one replay cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: usize,
    pub result: RunResult,
    /// ScoreManager snapshot after the cycle's trades were recorded.
    pub scores: BTreeMap<String, f64>,
    /// Bandit pick for the next cycle.
    pub selected: Option<String>,
}

pub struct ReplayCoordinator<'r> {
    engine: BacktestEngine,
    registry: &'r StrategyRegistry,
    specs: Vec<StrategySpec>,
    context: ArbitrationContext,
    cycles: usize,
}

impl ReplayCoordinator<'static> {
    /// Coordinator over the built-in registry. Attaches the configured score
    /// store, if any.
    pub fn from_config(config: &RunConfig) -> Result<Self, RunError> {
        Self::with_registry(config, StrategyRegistry::global())
    }
}

impl<'r> ReplayCoordinator<'r> {
    pub fn with_registry(config: &RunConfig, registry: &'r StrategyRegistry) -> Result<Self, RunError> {
        config.validate_with(registry)?;
        let engine = BacktestEngine::new(config.engine.clone(), RiskManager::new(config.risk.clone()))?;
        let context = match &config.score_store {
            Some(path) => ArbitrationContext::load(config.score_decay, config.decay, path)?,
            None => ArbitrationContext::new(config.score_decay, config.decay)?,
        };
        Ok(Self {
            engine,
            registry,
            specs: config.strategies.clone(),
            context,
            cycles: 0,
        })
    }

    /// Replace the arbitration state, e.g. with one carried over from a
    /// previous session.
    pub fn with_context(mut self, context: ArbitrationContext) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> &ArbitrationContext {
        &self.context
    }

    pub fn into_context(self) -> ArbitrationContext {
        self.context
    }

    pub fn cycles(&self) -> usize {
        self.cycles
    }

    /// Run one cycle over `data`.
    pub fn run_cycle(&mut self, data: &BTreeMap<SeriesKey, Vec<Bar>>) -> Result<CycleReport, RunError> {
        let mut strategies = self.registry.create_all(&self.specs)?;
        let result = self.engine.run(data, &mut strategies)?;

        self.context.record_trades(&result.trades);
        self.context.end_cycle();

        let candidates: Vec<&str> = result.strategy_names.iter().map(String::as_str).collect();
        let selected = self.context.select(&candidates).map(str::to_string);
        self.cycles += 1;

        info!(
            cycle = self.cycles,
            trades = result.trades.len(),
            selected = selected.as_deref().unwrap_or("none"),
            "replay cycle complete"
        );

        Ok(CycleReport {
            cycle: self.cycles,
            scores: self.context.scores().get_all(),
            selected,
            result,
        })
    }

    /// Run one cycle per window, then checkpoint the score store.
    pub fn run_all(&mut self, windows: &[BTreeMap<SeriesKey, Vec<Bar>>]) -> Result<Vec<CycleReport>, RunError> {
        let mut reports = Vec::with_capacity(windows.len());
        for window in windows {
            reports.push(self.run_cycle(window)?);
        }
        self.context.checkpoint()?;
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratarb_core::data::synthetic_bars;

    fn window(seed: u64) -> BTreeMap<SeriesKey, Vec<Bar>> {
        let mut data = BTreeMap::new();
        data.insert(("BTCUSDT".to_string(), "1h".to_string()), synthetic_bars(seed, 250));
        data
    }

    fn config() -> RunConfig {
        let mut config = RunConfig::default();
        for kind in ["breakout", "mean_reversion", "always_hold"] {
            config.strategies.push(StrategySpec::new(kind, "BTCUSDT", "1h"));
        }
        config
    }

    #[test]
    fn cycle_feeds_every_trade_to_the_bandit() {
        let mut replay = ReplayCoordinator::from_config(&config()).unwrap();
        let report = replay.run_cycle(&window(1)).unwrap();
        assert_eq!(report.cycle, 1);

        let total_pulls: u64 = replay.context().bandit().arms().values().map(|a| a.count).sum();
        let traded: BTreeMap<&str, usize> =
            report.result.trades.iter().fold(BTreeMap::new(), |mut acc, t| {
                *acc.entry(t.strategy.as_str()).or_default() += 1;
                acc
            });
        // After one decay, every traded arm keeps at least one pull.
        assert!(total_pulls as usize >= traded.len());
        assert!(report.selected.is_some());
    }

    #[test]
    fn untraded_strategies_are_explored_first() {
        let mut replay = ReplayCoordinator::from_config(&config()).unwrap();
        let report = replay.run_cycle(&window(2)).unwrap();
        // always_hold never trades, so some candidate is always untried.
        let first_untried = report
            .result
            .strategy_names
            .iter()
            .find(|n| replay.context().bandit().stats(n).count == 0);
        assert_eq!(report.selected.as_ref(), first_untried);
    }

    #[test]
    fn replay_is_deterministic() {
        let windows = [window(3), window(4)];
        let mut a = ReplayCoordinator::from_config(&config()).unwrap();
        let mut b = ReplayCoordinator::from_config(&config()).unwrap();
        assert_eq!(a.run_all(&windows).unwrap(), b.run_all(&windows).unwrap());
        assert_eq!(a.cycles(), 2);
    }

    #[test]
    fn run_all_checkpoints_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        let mut config = config();
        config.score_store = Some(path.clone());

        let mut replay = ReplayCoordinator::from_config(&config).unwrap();
        let reports = replay.run_all(&[window(5)]).unwrap();
        assert!(path.exists());

        let reloaded = ArbitrationContext::load(0.9, 0.99, &path).unwrap();
        let store = reloaded.store().unwrap();
        for trade in &reports[0].result.trades {
            assert!(store.get(&trade.strategy).is_some());
        }
    }
}

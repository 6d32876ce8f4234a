//! StratArb Runner: arbitration, scoring, persistence, run configuration and reporting.
//!
//! This crate builds on `stratarb-core` to provide:
//! - `ScoreManager` decayed scores and the UCB1 `ArbitrationEngine`
//! - `ScoreStore` JSON persistence of per-strategy performance profiles
//! - `ArbitrationContext`, explicit arbitration state with load/checkpoint
//! - The replay coordinator (backtest, score, decay, select)
//! - TOML `RunConfig` with validation and a content-hash run id
//! - Performance metrics and CSV/JSON export

pub mod arbitration;
pub mod config;
pub mod context;
pub mod export;
pub mod metrics;
pub mod replay;
pub mod runner;
pub mod score_store;
pub mod scoring;

pub use arbitration::{Arbiter, ArbitrationEngine, ArmStats, ScoreArbiter};
pub use config::{RunConfig, RunId};
pub use context::{snapshot_path, ArbitrationContext, ArbitrationSnapshot};
pub use export::{export_equity_csv, export_json, export_trades_csv, import_json};
pub use metrics::{per_strategy_metrics, StrategyMetrics, Summary};
pub use replay::{CycleReport, ReplayCoordinator};
pub use runner::{run_backtest, run_backtest_with, BacktestReport, RunError, SCHEMA_VERSION};
pub use score_store::{PersistenceError, ScoreProfile, ScoreStore};
pub use scoring::ScoreManager;


#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn arbitration_state_is_send_sync() {
        assert_send::<ArbitrationContext>();
        assert_sync::<ArbitrationContext>();
        assert_send::<ArbitrationEngine>();
        assert_sync::<ArbitrationEngine>();
        assert_send::<ScoreManager>();
        assert_sync::<ScoreManager>();
    }

    #[test]
    fn persisted_types_are_send_sync() {
        assert_send::<ScoreStore>();
        assert_sync::<ScoreStore>();
        assert_send::<ScoreProfile>();
        assert_sync::<ScoreProfile>();
        assert_send::<BacktestReport>();
        assert_sync::<BacktestReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<PersistenceError>();
        assert_sync::<PersistenceError>();
    }
}

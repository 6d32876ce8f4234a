//! End-to-end arbitration: config file to replay to persisted scores.

use std::collections::BTreeMap;

use stratarb_core::data::synthetic_bars;
use stratarb_core::{Bar, SeriesKey};
use stratarb_runner::{
    export_trades_csv, run_backtest, ArbitrationContext, ReplayCoordinator, RunConfig, ScoreStore,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn window(seed: u64) -> BTreeMap<SeriesKey, Vec<Bar>> {
    BTreeMap::from([
        (("BTCUSDT".to_string(), "1h".to_string()), synthetic_bars(seed, 300)),
        (("ETHUSDT".to_string(), "1h".to_string()), synthetic_bars(seed + 100, 300)),
    ])
}

const CONFIG: &str = r#"
decay = 0.9
score_decay = 0.8

[[strategies]]
kind = "ema_crossover"
symbol = "BTCUSDT"
timeframe = "1h"

[[strategies]]
kind = "breakout"
symbol = "ETHUSDT"
timeframe = "1h"
params = { window = 10 }

[[strategies]]
kind = "grid"
symbol = "BTCUSDT"
timeframe = "1h"
"#;

#[test]
fn replay_persists_scores_across_sessions() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.json");

    let mut config = RunConfig::from_toml_str(CONFIG).unwrap();
    config.score_store = Some(path.clone());

    let mut first = ReplayCoordinator::from_config(&config).unwrap();
    let reports = first.run_all(&[window(11), window(12)]).unwrap();
    assert_eq!(reports.len(), 2);
    let saved = ScoreStore::try_load(&path).unwrap();

    let mut traded: BTreeMap<&str, usize> = BTreeMap::new();
    for trade in reports.iter().flat_map(|r| &r.result.trades) {
        *traded.entry(trade.strategy.as_str()).or_default() += 1;
    }
    assert_eq!(saved.len(), traded.len());
    for (name, count) in &traded {
        let profile = saved.get(name).unwrap();
        assert_eq!(profile.recent_outcomes.len(), (*count).min(100));
    }
    for profile in saved.profiles().values() {
        assert!((0.0..=1.0).contains(&profile.hit_rate));
        assert!(profile.last_updated.is_some());
    }

    // A new session picks up where the first left off.
    let second = ReplayCoordinator::from_config(&config).unwrap();
    assert_eq!(second.context().store(), Some(&saved));
    assert_eq!(second.context().snapshot(), first.context().snapshot());
    assert_eq!(second.context().scores(), first.context().scores());
    assert_eq!(second.context().bandit(), first.context().bandit());
}

#[test]
fn replay_cycle_scores_match_trades() {
    let config = RunConfig::from_toml_str(CONFIG).unwrap();
    let mut replay = ReplayCoordinator::from_config(&config).unwrap();
    let report = replay.run_cycle(&window(21)).unwrap();

    let mut expected = ArbitrationContext::new(config.score_decay, config.decay).unwrap();
    expected.record_trades(&report.result.trades);
    assert_eq!(report.scores, expected.scores().get_all());
    assert!(report
        .selected
        .as_ref()
        .map_or(true, |s| report.result.strategy_names.contains(s)));
}

#[test]
fn backtest_report_exports_every_trade() {
    let config = RunConfig::from_toml_str(CONFIG).unwrap();
    let report = run_backtest(&config, &window(31)).unwrap();
    let csv = export_trades_csv(&report.result.trades).unwrap();
    assert_eq!(csv.lines().count(), report.result.trades.len() + 1);
    assert!(report.result.equity_identity_holds(1e-6));
}

//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Equity identity: final minus initial equity equals the sum of trade PnL
//! 2. One position per key: trades of a (strategy, symbol, timeframe) never overlap
//! 3. Sizing bounds: quantities stay in [0, max_position]
//! 4. Exit priority: a bar that touches both levels exits at the stop

use std::collections::{BTreeMap, HashMap};

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use stratarb_core::data::synthetic_bars;
use stratarb_core::domain::{Bar, ExitReason, Position, PositionKey, PositionSide, SignalAction};
use stratarb_core::engine::loop_runner::check_exit;
use stratarb_core::{
    BacktestEngine, EngineConfig, RiskConfig, RiskManager, RunResult, StrategyRegistry,
    StrategySpec,
};

fn run(seed: u64, n: usize, slippage: f64, fee: f64, max_position: f64) -> RunResult {
    let data = BTreeMap::from([(("BTCUSDT".to_string(), "1h".to_string()), synthetic_bars(seed, n))]);
    let registry = StrategyRegistry::global();
    let specs: Vec<StrategySpec> = registry
        .kinds()
        .map(|kind| StrategySpec::new(kind, "BTCUSDT", "1h"))
        .collect();
    let mut strategies = registry.create_all(&specs).unwrap();
    let risk = RiskManager::new(RiskConfig {
        max_position,
        ..RiskConfig::default()
    });
    BacktestEngine::new(EngineConfig::default().with_costs(slippage, fee), risk)
        .unwrap()
        .run(&data, &mut strategies)
        .unwrap()
}

// ── 1. Equity identity ───────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn equity_identity_holds(
        seed in 0u64..10_000,
        n in 30usize..250,
        slippage in 0.0..0.005_f64,
        fee in 0.0..0.002_f64,
    ) {
        let result = run(seed, n, slippage, fee, 5.0);
        let first = result.equity_curve[0];
        let last = *result.equity_curve.last().unwrap();
        let sum: f64 = result.trades.iter().map(|t| t.pnl).sum();
        prop_assert!(((last - first) - sum).abs() < 1e-6);
        prop_assert_eq!(result.equity_curve.len(), result.trades.len() + 1);
        prop_assert_eq!(last, result.final_balance);
    }

    // ── 2. One position per key ──────────────────────────────────────

    #[test]
    fn trades_per_key_never_overlap(seed in 0u64..10_000, n in 30usize..250) {
        let result = run(seed, n, 0.0, 0.0, 1.0);
        let mut last_exit: HashMap<PositionKey, usize> = HashMap::new();
        for t in &result.trades {
            let key = PositionKey::new(&t.strategy, &t.symbol, &t.timeframe);
            prop_assert!(t.exit_bar >= t.entry_bar);
            prop_assert!(t.exit_bar < n);
            if let Some(prev_exit) = last_exit.get(&key) {
                // No re-entry on the exit bar.
                prop_assert!(t.entry_bar > *prev_exit);
            }
            last_exit.insert(key, t.exit_bar);
        }
    }

    // ── 3. Sizing bounds ─────────────────────────────────────────────

    #[test]
    fn size_position_is_bounded(
        balance in -1000.0..1_000_000.0_f64,
        price in -10.0..10_000.0_f64,
        stop in proptest::option::of(0.0..10_000.0_f64),
        max_position in 0.01..100.0_f64,
    ) {
        let rm = RiskManager::new(RiskConfig { max_position, ..RiskConfig::default() });
        let qty = rm.size_position(balance, price, stop);
        prop_assert!(qty >= 0.0);
        prop_assert!(qty <= max_position);
        if balance <= 0.0 || price <= 0.0 {
            prop_assert_eq!(qty, 0.0);
        }
    }

    // ── 4. Exit priority ─────────────────────────────────────────────

    #[test]
    fn stop_loss_wins_when_both_levels_touch(
        entry in 50.0..150.0_f64,
        sl_gap in 0.5..10.0_f64,
        tp_gap in 0.5..10.0_f64,
        long in any::<bool>(),
    ) {
        let (side, sl, tp, action) = if long {
            (PositionSide::Long, entry - sl_gap, entry + tp_gap, SignalAction::Sell)
        } else {
            (PositionSide::Short, entry + sl_gap, entry - tp_gap, SignalAction::Buy)
        };
        let position = Position {
            side,
            entry_price: entry,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            entry_bar: 0,
            quantity: 1.0,
            stop_loss: Some(sl),
            take_profit: Some(tp),
        };
        let bar = Bar::new(
            Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap(),
            entry,
            entry + sl_gap.max(tp_gap) + 1.0,
            entry - sl_gap.max(tp_gap) - 1.0,
            entry,
            1.0,
        );
        prop_assert_eq!(check_exit(&position, &bar, action), Some((ExitReason::StopLoss, sl)));
    }
}

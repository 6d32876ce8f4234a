//! Property tests for arbitration invariants.
//!
//! Uses proptest to verify:
//! 1. Cold start: N untried candidates are each selected once, in order
//! 2. Decay floor: decay never drives a pull count below 1
//! 3. Selection is always one of the candidates
//! 4. Score recurrence: a fresh score equals its first reward

use proptest::prelude::*;
use stratarb_runner::{Arbiter, ArbitrationEngine, ScoreManager};

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("strategy_{i}")).collect()
}

// ── 1. Cold start ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn untried_candidates_selected_in_order(
        n in 1usize..12,
        rewards in prop::collection::vec(-10.0..10.0_f64, 12),
    ) {
        let owned = names(n);
        let candidates: Vec<&str> = owned.iter().map(String::as_str).collect();
        let mut engine = ArbitrationEngine::default();
        for (i, expected) in candidates.iter().enumerate() {
            let picked = engine.select_strategy(&candidates).unwrap();
            prop_assert_eq!(picked, *expected);
            engine.update_rewards(picked, rewards[i]);
        }
    }

    // ── 2. Decay floor ──────────────────────────────────────────────

    #[test]
    fn decay_keeps_counts_at_least_one(
        decay in 0.01..=1.0_f64,
        pulls in 1usize..50,
        rounds in 1usize..20,
    ) {
        let mut engine = ArbitrationEngine::new(decay).unwrap();
        for _ in 0..pulls {
            engine.update_rewards("a", 1.0);
        }
        for _ in 0..rounds {
            engine.decay_scores();
            let stats = engine.stats("a");
            prop_assert!(stats.count >= 1);
            prop_assert!(stats.average().is_finite());
        }
    }

    // ── 3. Selection membership ─────────────────────────────────────

    #[test]
    fn selection_is_a_candidate(
        history in prop::collection::vec((0usize..5, -5.0..5.0_f64), 0..60),
        decays in 0usize..4,
    ) {
        let owned = names(5);
        let candidates: Vec<&str> = owned.iter().map(String::as_str).collect();
        let mut engine = ArbitrationEngine::default();
        for (arm, reward) in history {
            engine.update_rewards(candidates[arm], reward);
        }
        for _ in 0..decays {
            engine.decay_scores();
        }
        let picked = engine.select_strategy(&candidates).unwrap();
        prop_assert!(candidates.contains(&picked));
    }

    // ── 4. Score recurrence ─────────────────────────────────────────

    #[test]
    fn first_score_equals_reward(decay in 0.01..=1.0_f64, reward in -1e6..1e6_f64) {
        let mut scores = ScoreManager::new(decay).unwrap();
        prop_assert_eq!(scores.update_score("a", reward), reward);
        prop_assert_eq!(scores.get_score("a"), reward);
    }
}

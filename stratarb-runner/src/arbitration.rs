//! Strategy arbitration: choose which strategy to trust next.
//!
//! `ArbitrationEngine` is a UCB1 bandit over strategy names. The `Arbiter`
//! trait is the seam for other selection back-ends; `ScoreArbiter` picks the
//! best `ScoreManager` score greedily.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stratarb_core::ConfigError;
use tracing::debug;

use crate::scoring::{check_decay, ScoreManager};

/// Selection back-end. Callers serialize select/update pairs.
pub trait Arbiter {
    /// Pick one of `candidates`, or `None` if there are none.
    fn select_strategy<'a>(&self, candidates: &[&'a str]) -> Option<&'a str>;

    /// Feed the realized reward of one decision back.
    fn update_rewards(&mut self, name: &str, reward: f64);

    /// Age old statistics. Called once per replay cycle.
    fn decay_scores(&mut self) {}
}

/// Pull count and cumulative reward of one arm.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ArmStats {
    pub count: u64,
    pub value: f64,
}

impl ArmStats {
    /// Mean reward per pull. Only meaningful for `count > 0`.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.value / self.count as f64
        }
    }
}

/// UCB1 multi-armed bandit over strategy names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrationEngine {
    decay: f64,
    arms: BTreeMap<String, ArmStats>,
}

impl ArbitrationEngine {
    pub fn new(decay: f64) -> Result<Self, ConfigError> {
        check_decay("decay", decay)?;
        Ok(Self {
            decay,
            arms: BTreeMap::new(),
        })
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    pub fn stats(&self, name: &str) -> ArmStats {
        self.arms.get(name).copied().unwrap_or_default()
    }

    pub fn arms(&self) -> &BTreeMap<String, ArmStats> {
        &self.arms
    }

    /// Replace every arm's statistics, keeping the configured decay.
    pub fn restore(&mut self, arms: BTreeMap<String, ArmStats>) {
        self.arms = arms;
    }

    /// UCB1 score of one arm given the pull total of the candidate set.
    fn ucb(&self, stats: ArmStats, total: u64) -> f64 {
        let bonus = (2.0 * (total as f64).ln() / stats.count as f64).sqrt();
        stats.average() + bonus
    }
}

impl Default for ArbitrationEngine {
    fn default() -> Self {
        Self {
            decay: 0.99,
            arms: BTreeMap::new(),
        }
    }
}

impl Arbiter for ArbitrationEngine {
    /// Untried candidates win first, in candidate order. Otherwise the
    /// highest `avg + sqrt(2 ln(total) / count)` wins, ties to the earliest.
    fn select_strategy<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        if let Some(untried) = candidates.iter().find(|c| self.stats(c).count == 0) {
            return Some(*untried);
        }

        let total: u64 = candidates.iter().map(|c| self.stats(c).count).sum();
        let mut best: Option<(&'a str, f64)> = None;
        for &name in candidates {
            let score = self.ucb(self.stats(name), total);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((name, score));
            }
        }
        if let Some((name, score)) = best {
            debug!(strategy = name, score, total, "ucb selection");
        }
        best.map(|(name, _)| name)
    }

    fn update_rewards(&mut self, name: &str, reward: f64) {
        let arm = self.arms.entry(name.to_string()).or_default();
        arm.count += 1;
        arm.value += reward;
    }

    /// `value *= decay`, `count = max(1, floor(count * decay))`.
    fn decay_scores(&mut self) {
        for arm in self.arms.values_mut() {
            arm.value *= self.decay;
            arm.count = ((arm.count as f64 * self.decay).floor() as u64).max(1);
        }
    }
}

/// Greedy arbiter: the candidate with the highest decayed score wins,
/// ties to the earliest.
#[derive(Debug, Clone, Default)]
pub struct ScoreArbiter {
    scores: ScoreManager,
}

impl ScoreArbiter {
    pub fn new(scores: ScoreManager) -> Self {
        Self { scores }
    }

    pub fn scores(&self) -> &ScoreManager {
        &self.scores
    }
}

impl Arbiter for ScoreArbiter {
    fn select_strategy<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        let mut best: Option<(&'a str, f64)> = None;
        for &name in candidates {
            let score = self.scores.get_score(name);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((name, score));
            }
        }
        best.map(|(name, _)| name)
    }

    fn update_rewards(&mut self, name: &str, reward: f64) {
        self.scores.update_score(name, reward);
    }
}

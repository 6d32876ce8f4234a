//! Exponentially decayed performance score per strategy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stratarb_core::ConfigError;

/// `score = score * decay + reward`, per strategy name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreManager {
    decay: f64,
    scores: BTreeMap<String, f64>,
}

impl ScoreManager {
    pub fn new(decay: f64) -> Result<Self, ConfigError> {
        check_decay("score_decay", decay)?;
        Ok(Self {
            decay,
            scores: BTreeMap::new(),
        })
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    pub fn update_score(&mut self, name: &str, reward: f64) -> f64 {
        let score = self.scores.entry(name.to_string()).or_insert(0.0);
        *score = *score * self.decay + reward;
        *score
    }

    /// Current score, 0.0 for unknown strategies.
    pub fn get_score(&self, name: &str) -> f64 {
        self.scores.get(name).copied().unwrap_or(0.0)
    }

    pub fn get_all(&self) -> BTreeMap<String, f64> {
        self.scores.clone()
    }

    /// Replace every score, keeping the configured decay.
    pub fn restore(&mut self, scores: BTreeMap<String, f64>) {
        self.scores = scores;
    }
}

impl Default for ScoreManager {
    fn default() -> Self {
        Self {
            decay: 0.9,
            scores: BTreeMap::new(),
        }
    }
}

pub(crate) fn check_decay(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidDecay { name, value })
    }
}

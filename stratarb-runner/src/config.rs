//! Serializable run configuration, loaded from TOML.
//!
//! ```toml
//! decay = 0.99
//! score_decay = 0.9
//! score_store = "strategy_scores.json"
//!
//! [engine]
//! initial_balance = 10000.0
//! fee_pct = 0.001
//!
//! [risk]
//! risk_percent = 0.01
//! [risk.leverage]
//! scalper = 2.0
//!
//! [[strategies]]
//! kind = "grid"
//! symbol = "BTCUSDT"
//! timeframe = "1h"
//! params = { atr_period = 14, grid_mult = 1.0 }
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stratarb_core::{ConfigError, EngineConfig, RiskConfig, StrategyRegistry, StrategySpec};

use crate::runner::RunError;
use crate::scoring::check_decay;

/// Content hash of a configuration.
pub type RunId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub engine: EngineConfig,
    pub risk: RiskConfig,
    /// Bandit statistics decay, applied once per replay cycle.
    pub decay: f64,
    /// ScoreManager decay, applied on every update.
    pub score_decay: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_store: Option<PathBuf>,
    pub strategies: Vec<StrategySpec>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            risk: RiskConfig::default(),
            decay: 0.99,
            score_decay: 0.9,
            score_store: None,
            strategies: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Parse and validate.
    pub fn from_toml_str(text: &str) -> Result<Self, RunError> {
        let config: RunConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, RunError> {
        let text = fs::read_to_string(path).map_err(|source| RunError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Validate against the built-in strategy registry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_with(StrategyRegistry::global())
    }

    /// Every check that can fail before a run: engine costs, risk settings,
    /// both decays, strategy kinds and parameters, and duplicate instances.
    pub fn validate_with(&self, registry: &StrategyRegistry) -> Result<(), ConfigError> {
        self.engine.validate()?;
        let problems = self.risk.problems();
        if !problems.is_empty() {
            return Err(ConfigError::InvalidRisk(problems));
        }
        check_decay("decay", self.decay)?;
        check_decay("score_decay", self.score_decay)?;

        let mut seen = BTreeSet::new();
        for spec in &self.strategies {
            registry.create(spec)?;
            let key = (spec.instance_name(), spec.symbol.as_str(), spec.timeframe.as_str());
            if !seen.insert(key) {
                return Err(ConfigError::DuplicateStrategy(format!(
                    "{} on {}/{}",
                    key.0, key.1, key.2
                )));
            }
        }
        Ok(())
    }

    /// Blake3 hash of the canonical JSON form. Two configs with the same
    /// settings share a run id.
    pub fn run_id(&self) -> Result<RunId, RunError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

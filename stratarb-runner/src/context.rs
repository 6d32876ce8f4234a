//! Arbitration state owned by a coordinator and threaded through by `&mut`.
//!
//! Bundles the decayed `ScoreManager`, the UCB1 bandit and an optional
//! on-disk `ScoreStore`. Nothing here touches the filesystem except
//! `load` and `checkpoint`.
//!
//! A checkpoint writes two files: the score store itself and, next to it,
//! a snapshot of scores and bandit arms (`scores.json` pairs with
//! `scores.state.json`). Loading restores both, so a new session resumes
//! the bandit instead of cold-starting it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stratarb_core::{ConfigError, Signal, Trade};
use tracing::{debug, info, warn};

use crate::arbitration::{Arbiter, ArbitrationEngine, ArmStats};
use crate::score_store::{is_not_found, read_json, write_json, PersistenceError, ScoreStore};
use crate::scoring::ScoreManager;

/// Persisted scores and bandit statistics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArbitrationSnapshot {
    pub scores: BTreeMap<String, f64>,
    pub arms: BTreeMap<String, ArmStats>,
}

/// Snapshot file that accompanies the score store at `store_path`.
pub fn snapshot_path(store_path: &Path) -> PathBuf {
    store_path.with_extension("state.json")
}

#[derive(Debug, Clone)]
pub struct ArbitrationContext {
    scores: ScoreManager,
    bandit: ArbitrationEngine,
    store: Option<ScoreStore>,
}

impl ArbitrationContext {
    /// In-memory context with no persistence.
    pub fn new(score_decay: f64, bandit_decay: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            scores: ScoreManager::new(score_decay)?,
            bandit: ArbitrationEngine::new(bandit_decay)?,
            store: None,
        })
    }

    /// Context backed by the score store at `path`. A missing or corrupt
    /// store starts empty.
    ///
    /// Scores and bandit arms come from the snapshot beside the store. When
    /// the snapshot is missing or unreadable they are rebuilt from the
    /// store's recent outcomes: one pull per outcome, replayed in order
    /// through the score decay.
    pub fn load(
        score_decay: f64,
        bandit_decay: f64,
        path: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let mut ctx = Self::new(score_decay, bandit_decay)?;
        let store = ScoreStore::load(path);
        let state_path = snapshot_path(store.path());

        match read_json::<ArbitrationSnapshot>(&state_path) {
            Ok(snapshot) => {
                debug!(path = %state_path.display(), arms = snapshot.arms.len(), "arbitration snapshot restored");
                ctx.restore(snapshot);
            }
            Err(e) => {
                if is_not_found(&e) {
                    debug!(path = %state_path.display(), "no arbitration snapshot, seeding from store");
                } else {
                    warn!(path = %state_path.display(), error = %e, "unreadable arbitration snapshot, seeding from store");
                }
                ctx.seed_from(&store);
            }
        }
        ctx.store = Some(store);
        Ok(ctx)
    }

    fn seed_from(&mut self, store: &ScoreStore) {
        let mut arms = BTreeMap::new();
        for (name, profile) in store.profiles() {
            for &outcome in &profile.recent_outcomes {
                self.scores.update_score(name, outcome);
            }
            if !profile.recent_outcomes.is_empty() {
                arms.insert(
                    name.clone(),
                    ArmStats {
                        count: profile.recent_outcomes.len() as u64,
                        value: profile.recent_outcomes.iter().sum(),
                    },
                );
            }
        }
        if !arms.is_empty() {
            info!(arms = arms.len(), "bandit seeded from score store");
        }
        self.bandit.restore(arms);
    }

    pub fn snapshot(&self) -> ArbitrationSnapshot {
        ArbitrationSnapshot {
            scores: self.scores.get_all(),
            arms: self.bandit.arms().clone(),
        }
    }

    /// Replace scores and arms, keeping the configured decays.
    pub fn restore(&mut self, snapshot: ArbitrationSnapshot) {
        self.scores.restore(snapshot.scores);
        self.bandit.restore(snapshot.arms);
    }

    pub fn with_store(mut self, store: ScoreStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn scores(&self) -> &ScoreManager {
        &self.scores
    }

    pub fn bandit(&self) -> &ArbitrationEngine {
        &self.bandit
    }

    pub fn store(&self) -> Option<&ScoreStore> {
        self.store.as_ref()
    }

    /// Feed one closed trade's pnl to the scores, the bandit and the store.
    pub fn record_trade(&mut self, trade: &Trade) {
        let score = self.scores.update_score(&trade.strategy, trade.pnl);
        self.bandit.update_rewards(&trade.strategy, trade.pnl);
        if let Some(store) = self.store.as_mut() {
            store.record(&trade.strategy, trade.pnl, trade.exit_time);
        }
        debug!(strategy = %trade.strategy, pnl = trade.pnl, score, "reward recorded");
    }

    pub fn record_trades(&mut self, trades: &[Trade]) {
        for trade in trades {
            self.record_trade(trade);
        }
    }

    /// Age bandit statistics. Called once per replay cycle.
    pub fn end_cycle(&mut self) {
        self.bandit.decay_scores();
    }

    pub fn select<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        self.bandit.select_strategy(candidates)
    }

    /// Split `capital` across non-hold signals in proportion to score.
    ///
    /// Hold signals get 0. When the scores of the non-hold signals sum to 0
    /// every allocation is 0. A strategy listed twice keeps its last signal.
    pub fn allocate(&self, signals: &[Signal], capital: f64) -> BTreeMap<String, f64> {
        let mut latest: BTreeMap<&str, &Signal> = BTreeMap::new();
        for signal in signals {
            latest.insert(signal.strategy.as_str(), signal);
        }

        let total: f64 = latest
            .values()
            .filter(|s| !s.is_hold())
            .map(|s| self.scores.get_score(&s.strategy))
            .sum();

        latest
            .into_iter()
            .map(|(name, signal)| {
                let share = if signal.is_hold() || total == 0.0 {
                    0.0
                } else {
                    capital * self.scores.get_score(name) / total
                };
                (name.to_string(), share)
            })
            .collect()
    }

    /// Persist the score store and the arbitration snapshot, if a store is
    /// attached.
    pub fn checkpoint(&self) -> Result<(), PersistenceError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        store.save()?;
        write_json(&snapshot_path(store.path()), &self.snapshot())
    }
}

impl Default for ArbitrationContext {
    fn default() -> Self {
        Self {
            scores: ScoreManager::default(),
            bandit: ArbitrationEngine::default(),
            store: None,
        }
    }
}

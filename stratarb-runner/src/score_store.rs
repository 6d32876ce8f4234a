//! Score store: per-strategy performance profiles persisted as JSON.
//!
//! The file maps strategy name to profile. A missing or unreadable file loads
//! as an empty store; saving surfaces every failure to the caller.

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Outcomes kept per strategy.
pub const RECENT_OUTCOMES_CAP: usize = 100;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("score store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("score store serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreProfile {
    pub strategy_name: String,
    /// Fraction of recent outcomes that were strictly positive.
    pub hit_rate: f64,
    pub avg_return: f64,
    pub recent_outcomes: VecDeque<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl ScoreProfile {
    pub fn new(strategy_name: impl Into<String>) -> Self {
        Self {
            strategy_name: strategy_name.into(),
            hit_rate: 0.0,
            avg_return: 0.0,
            recent_outcomes: VecDeque::with_capacity(RECENT_OUTCOMES_CAP),
            last_updated: None,
        }
    }

    /// Push one outcome, evicting the oldest past the cap, and refresh stats.
    pub fn record(&mut self, outcome: f64, at: DateTime<Utc>) {
        self.recent_outcomes.push_back(outcome);
        while self.recent_outcomes.len() > RECENT_OUTCOMES_CAP {
            self.recent_outcomes.pop_front();
        }
        let n = self.recent_outcomes.len() as f64;
        let wins = self.recent_outcomes.iter().filter(|&&r| r > 0.0).count() as f64;
        self.hit_rate = wins / n;
        self.avg_return = self.recent_outcomes.iter().sum::<f64>() / n;
        self.last_updated = Some(at);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreStore {
    path: PathBuf,
    profiles: BTreeMap<String, ScoreProfile>,
}

impl ScoreStore {
    /// Empty store bound to `path`; nothing is read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            profiles: BTreeMap::new(),
        }
    }

    /// Load from `path`, starting empty when the file is missing or corrupt.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let profiles = match Self::read_profiles(&path) {
            Ok(profiles) => profiles,
            Err(e) if is_not_found(&e) => {
                debug!(path = %path.display(), "no score store yet, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable score store, starting empty");
                BTreeMap::new()
            }
        };
        Self { path, profiles }
    }

    /// Load strictly, returning any read or parse failure.
    pub fn try_load(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let profiles = Self::read_profiles(&path)?;
        Ok(Self { path, profiles })
    }

    fn read_profiles(path: &Path) -> Result<BTreeMap<String, ScoreProfile>, PersistenceError> {
        read_json(path)
    }

    /// Write the whole mapping, creating parent directories as needed.
    pub fn save(&self) -> Result<(), PersistenceError> {
        write_json(&self.path, &self.profiles)?;
        debug!(path = %self.path.display(), strategies = self.profiles.len(), "score store saved");
        Ok(())
    }

    pub fn record(&mut self, name: &str, outcome: f64, at: DateTime<Utc>) -> &ScoreProfile {
        let profile = self
            .profiles
            .entry(name.to_string())
            .or_insert_with(|| ScoreProfile::new(name));
        profile.record(outcome, at);
        profile
    }

    pub fn get(&self, name: &str) -> Option<&ScoreProfile> {
        self.profiles.get(name)
    }

    pub fn profiles(&self) -> &BTreeMap<String, ScoreProfile> {
        &self.profiles
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

// ─── JSON file helpers ──────────────────────────────────────────────

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PersistenceError> {
    let json = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&json)?)
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let io_err = |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(io_err)
}

/// True when `err` only says the file does not exist yet.
pub(crate) fn is_not_found(err: &PersistenceError) -> bool {
    matches!(err, PersistenceError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
}

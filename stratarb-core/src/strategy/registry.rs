//! Strategy registry: converts a `StrategySpec` into a boxed `Strategy`.
//!
//! Kinds map to constructor functions in a table built once. Parameters are a
//! flat name -> f64 map; each constructor reads the ones it knows, falls back
//! to defaults for the rest, and rejects values its strategy cannot run with.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::scalper::ScalperParams;
use super::{
    AlwaysHold, Binding, Breakout, Dca, EmaCrossover, Grid, LiquiditySweep, MeanReversion,
    Scalper, Strategy, Swing,
};

// ─── Error type ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("unknown strategy kind: {0}")]
    UnknownKind(String),
    #[error("strategy kind already registered: {0}")]
    DuplicateKind(String),
    #[error("invalid parameter '{param}' for {kind}: {reason}")]
    InvalidParam {
        kind: String,
        param: String,
        reason: String,
    },
}

// ─── Spec ────────────────────────────────────────────────────────────

/// Declarative description of one strategy instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub kind: String,
    /// Instance name. Defaults to the kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub symbol: String,
    pub timeframe: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl StrategySpec {
    pub fn new(kind: impl Into<String>, symbol: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: None,
            symbol: symbol.into(),
            timeframe: timeframe.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn instance_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.kind)
    }

    fn binding(&self) -> Binding {
        Binding::new(self.instance_name(), &self.symbol, &self.timeframe)
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Extract a named f64 parameter, falling back to `default`.
fn param(spec: &StrategySpec, name: &str, default: f64) -> Result<f64, RegistryError> {
    match spec.params.get(name).copied() {
        None => Ok(default),
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(invalid(spec, name, format!("{v} is not finite"))),
    }
}

/// Extract a named integer parameter of at least `min`, falling back to `default`.
fn param_usize(
    spec: &StrategySpec,
    name: &str,
    default: usize,
    min: usize,
) -> Result<usize, RegistryError> {
    let Some(v) = spec.params.get(name).copied() else {
        return Ok(default);
    };
    if !v.is_finite() || v.fract() != 0.0 || v < min as f64 {
        return Err(invalid(spec, name, format!("{v} is not an integer >= {min}")));
    }
    Ok(v as usize)
}

fn invalid(spec: &StrategySpec, name: &str, reason: String) -> RegistryError {
    RegistryError::InvalidParam {
        kind: spec.kind.clone(),
        param: name.to_string(),
        reason,
    }
}

fn ensure(
    spec: &StrategySpec,
    condition: bool,
    name: &str,
    reason: &str,
) -> Result<(), RegistryError> {
    if condition {
        Ok(())
    } else {
        Err(invalid(spec, name, reason.to_string()))
    }
}

// ─── Constructors ────────────────────────────────────────────────────

pub type Constructor = fn(&StrategySpec) -> Result<Box<dyn Strategy>, RegistryError>;

fn ema_crossover(spec: &StrategySpec) -> Result<Box<dyn Strategy>, RegistryError> {
    let fast = param_usize(spec, "fast", 9, 1)?;
    let slow = param_usize(spec, "slow", 21, 2)?;
    ensure(spec, slow > fast, "slow", "must be greater than fast")?;
    Ok(Box::new(EmaCrossover::new(spec.binding(), fast, slow)))
}

fn mean_reversion(spec: &StrategySpec) -> Result<Box<dyn Strategy>, RegistryError> {
    let window = param_usize(spec, "window", 10, 1)?;
    let threshold = param(spec, "threshold", 0.01)?;
    ensure(spec, threshold >= 0.0, "threshold", "must be >= 0")?;
    Ok(Box::new(MeanReversion::new(spec.binding(), window, threshold)))
}

fn breakout(spec: &StrategySpec) -> Result<Box<dyn Strategy>, RegistryError> {
    let window = param_usize(spec, "window", 20, 2)?;
    Ok(Box::new(Breakout::new(spec.binding(), window)))
}

fn grid(spec: &StrategySpec) -> Result<Box<dyn Strategy>, RegistryError> {
    let atr_period = param_usize(spec, "atr_period", 14, 1)?;
    let grid_mult = param(spec, "grid_mult", 1.0)?;
    ensure(spec, grid_mult > 0.0, "grid_mult", "must be > 0")?;
    Ok(Box::new(Grid::new(spec.binding(), atr_period, grid_mult)))
}

fn dca(spec: &StrategySpec) -> Result<Box<dyn Strategy>, RegistryError> {
    let interval_days = param_usize(spec, "interval_days", 7, 1)?;
    Ok(Box::new(Dca::new(spec.binding(), interval_days as i64)))
}

fn scalper(spec: &StrategySpec) -> Result<Box<dyn Strategy>, RegistryError> {
    let d = ScalperParams::default();
    let params = ScalperParams {
        fast: param_usize(spec, "fast", d.fast, 1)?,
        slow: param_usize(spec, "slow", d.slow, 2)?,
        vol_window: param_usize(spec, "vol_window", d.vol_window, 2)?,
        vol_threshold: param(spec, "vol_threshold", d.vol_threshold)?,
        atr_period: param_usize(spec, "atr_period", d.atr_period, 1)?,
        level_mult: param(spec, "level_mult", d.level_mult)?,
    };
    ensure(spec, params.slow > params.fast, "slow", "must be greater than fast")?;
    ensure(spec, params.level_mult > 0.0, "level_mult", "must be > 0")?;
    Ok(Box::new(Scalper::new(spec.binding(), params)))
}

fn swing(spec: &StrategySpec) -> Result<Box<dyn Strategy>, RegistryError> {
    let ema_fast = param_usize(spec, "ema_fast", 20, 1)?;
    let sma_slow = param_usize(spec, "sma_slow", 50, 1)?;
    Ok(Box::new(Swing::new(spec.binding(), ema_fast, sma_slow)))
}

fn liquidity_sweep(spec: &StrategySpec) -> Result<Box<dyn Strategy>, RegistryError> {
    let lookback = param_usize(spec, "lookback", 4, 1)?;
    Ok(Box::new(LiquiditySweep::new(spec.binding(), lookback)))
}

fn always_hold(spec: &StrategySpec) -> Result<Box<dyn Strategy>, RegistryError> {
    Ok(Box::new(AlwaysHold::new(spec.binding())))
}

// ─── Registry ────────────────────────────────────────────────────────

/// Table of strategy kinds. Iteration order is alphabetical by kind.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl StrategyRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Registry holding every built-in strategy kind.
    pub fn builtin() -> Self {
        let table: [(&str, Constructor); 9] = [
            ("always_hold", always_hold),
            ("breakout", breakout),
            ("dca", dca),
            ("ema_crossover", ema_crossover),
            ("grid", grid),
            ("liquidity_sweep", liquidity_sweep),
            ("mean_reversion", mean_reversion),
            ("scalper", scalper),
            ("swing", swing),
        ];
        Self {
            constructors: table
                .into_iter()
                .map(|(kind, ctor)| (kind.to_string(), ctor))
                .collect(),
        }
    }

    /// Shared built-in registry, built on first use.
    pub fn global() -> &'static StrategyRegistry {
        static REGISTRY: OnceLock<StrategyRegistry> = OnceLock::new();
        REGISTRY.get_or_init(StrategyRegistry::builtin)
    }

    pub fn register(&mut self, kind: &str, ctor: Constructor) -> Result<(), RegistryError> {
        if self.constructors.contains_key(kind) {
            return Err(RegistryError::DuplicateKind(kind.to_string()));
        }
        self.constructors.insert(kind.to_string(), ctor);
        Ok(())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn create(&self, spec: &StrategySpec) -> Result<Box<dyn Strategy>, RegistryError> {
        let ctor = self
            .constructors
            .get(&spec.kind)
            .ok_or_else(|| RegistryError::UnknownKind(spec.kind.clone()))?;
        ctor(spec)
    }

    /// Build every spec in order, failing on the first error.
    pub fn create_all(&self, specs: &[StrategySpec]) -> Result<Vec<Box<dyn Strategy>>, RegistryError> {
        specs.iter().map(|spec| self.create(spec)).collect()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: &str) -> StrategySpec {
        StrategySpec::new(kind, "BTCUSDT", "1h")
    }

    // ── Helpers ──────────────────────────────────────────────────

    #[test]
    fn param_returns_value_if_present() {
        let s = spec("x").with_param("threshold", 0.02);
        assert_eq!(param(&s, "threshold", 0.01), Ok(0.02));
    }

    #[test]
    fn param_returns_default_if_missing() {
        assert_eq!(param(&spec("x"), "threshold", 0.01), Ok(0.01));
    }

    #[test]
    fn param_usize_rejects_fractional_and_small() {
        let s = spec("x").with_param("window", 2.5);
        assert!(param_usize(&s, "window", 10, 1).is_err());
        let s = spec("x").with_param("window", 0.0);
        assert!(param_usize(&s, "window", 10, 1).is_err());
        let s = spec("x").with_param("window", 30.0);
        assert_eq!(param_usize(&s, "window", 10, 1), Ok(30));
    }

    // ── Registry ─────────────────────────────────────────────────

    #[test]
    fn builtin_kinds_are_enumerable() {
        let reg = StrategyRegistry::builtin();
        let kinds: Vec<&str> = reg.kinds().collect();
        assert_eq!(kinds.len(), 9);
        assert!(kinds.contains(&"ema_crossover"));
        assert!(kinds.contains(&"always_hold"));
        assert!(kinds.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn every_builtin_constructs_with_defaults() {
        let reg = StrategyRegistry::global();
        for kind in reg.kinds() {
            let s = reg.create(&spec(kind)).unwrap();
            assert_eq!(s.name(), kind);
            assert_eq!(s.symbol(), "BTCUSDT");
            assert_eq!(s.timeframe(), "1h");
        }
    }

    #[test]
    fn instance_name_overrides_kind() {
        let s = StrategyRegistry::builtin()
            .create(&spec("breakout").with_name("breakout_fast").with_param("window", 5.0))
            .unwrap();
        assert_eq!(s.name(), "breakout_fast");
        assert_eq!(s.warmup_bars(), 5);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = StrategyRegistry::builtin().create(&spec("arbitrage")).err().unwrap();
        assert_eq!(err, RegistryError::UnknownKind("arbitrage".into()));
    }

    #[test]
    fn invalid_params_are_rejected_without_panicking() {
        let reg = StrategyRegistry::builtin();
        let bad = spec("ema_crossover").with_param("fast", 30.0).with_param("slow", 10.0);
        assert!(matches!(reg.create(&bad), Err(RegistryError::InvalidParam { .. })));
        let bad = spec("grid").with_param("grid_mult", -1.0);
        assert!(matches!(reg.create(&bad), Err(RegistryError::InvalidParam { .. })));
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut reg = StrategyRegistry::empty();
        reg.register("hold", always_hold).unwrap();
        assert_eq!(
            reg.register("hold", always_hold),
            Err(RegistryError::DuplicateKind("hold".into()))
        );
        assert!(reg.contains("hold"));
    }

    #[test]
    fn spec_deserializes_from_toml_shape() {
        let json = r#"{"kind":"dca","symbol":"ETHUSDT","timeframe":"1d","params":{"interval_days":3}}"#;
        let s: StrategySpec = serde_json::from_str(json).unwrap();
        assert_eq!(s.instance_name(), "dca");
        assert_eq!(s.params["interval_days"], 3.0);
    }
}

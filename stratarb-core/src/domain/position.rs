//! Position: engine-internal state of one (strategy, symbol, timeframe) slot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::signal::SignalAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSide {
    Flat,
    Long,
    Short,
}

impl PositionSide {
    /// Side opened by an entry action. Hold opens nothing.
    pub fn from_action(action: SignalAction) -> PositionSide {
        match action {
            SignalAction::Buy => PositionSide::Long,
            SignalAction::Sell => PositionSide::Short,
            SignalAction::Hold => PositionSide::Flat,
        }
    }

    /// The signal action that reverses (exits) a position on this side.
    pub fn exit_action(self) -> Option<SignalAction> {
        match self {
            PositionSide::Long => Some(SignalAction::Sell),
            PositionSide::Short => Some(SignalAction::Buy),
            PositionSide::Flat => None,
        }
    }
}

/// Identifies the single slot a strategy may occupy on a series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionKey {
    pub strategy: String,
    pub symbol: String,
    pub timeframe: String,
}

impl PositionKey {
    pub fn new(
        strategy: impl Into<String>,
        symbol: impl Into<String>,
        timeframe: impl Into<String>,
    ) -> Self {
        Self {
            strategy: strategy.into(),
            symbol: symbol.into(),
            timeframe: timeframe.into(),
        }
    }
}

impl std::fmt::Display for PositionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}/{}", self.strategy, self.symbol, self.timeframe)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("position already open for {0}")]
    AlreadyOpen(PositionKey),
    #[error("no open position for {0}")]
    NotOpen(PositionKey),
    #[error("cannot open a position with side {side:?} and quantity {quantity}")]
    InvalidEntry { side: PositionSide, quantity: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: PositionSide,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    /// Index of the entry bar in its series.
    pub entry_bar: usize,
    pub quantity: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.side == PositionSide::Flat
    }

    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == PositionSide::Short
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        match self.side {
            PositionSide::Long => (current_price - self.entry_price) * self.quantity,
            PositionSide::Short => (self.entry_price - current_price) * self.quantity,
            PositionSide::Flat => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn position(side: PositionSide) -> Position {
        Position {
            side,
            entry_price: 100.0,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            entry_bar: 0,
            quantity: 2.0,
            stop_loss: None,
            take_profit: None,
        }
    }

    #[test]
    fn unrealized_pnl_by_side() {
        assert_eq!(position(PositionSide::Long).unrealized_pnl(105.0), 10.0);
        assert_eq!(position(PositionSide::Short).unrealized_pnl(105.0), -10.0);
        assert_eq!(position(PositionSide::Flat).unrealized_pnl(105.0), 0.0);
    }

    #[test]
    fn side_action_mapping() {
        assert_eq!(PositionSide::from_action(SignalAction::Buy), PositionSide::Long);
        assert_eq!(PositionSide::from_action(SignalAction::Sell), PositionSide::Short);
        assert_eq!(PositionSide::Long.exit_action(), Some(SignalAction::Sell));
        assert_eq!(PositionSide::Flat.exit_action(), None);
    }

    #[test]
    fn key_display() {
        let key = PositionKey::new("grid", "ETHUSDT", "15m");
        assert_eq!(key.to_string(), "grid@ETHUSDT/15m");
    }
}

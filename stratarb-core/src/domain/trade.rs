//! Trade: a closed position, immutable once recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::position::PositionSide;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Signal,
    EndOfData,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Signal => "signal",
            ExitReason::EndOfData => "end_of_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Identification ──
    pub strategy: String,
    pub symbol: String,
    pub timeframe: String,
    pub side: PositionSide,

    // ── Entry ──
    pub entry_bar: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    // ── Levels ──
    pub sl: Option<f64>,
    pub tp: Option<f64>,

    // ── Size / PnL ──
    pub qty: f64,
    pub fees: f64,
    /// Net of fees.
    pub pnl: f64,
}

impl Trade {
    /// Return on the trade as a fraction of entry notional.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.qty == 0.0 {
            return 0.0;
        }
        self.pnl / (self.entry_price * self.qty)
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_bar.saturating_sub(self.entry_bar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_trade() -> Trade {
        Trade {
            strategy: "scalper".into(),
            symbol: "BTCUSDT".into(),
            timeframe: "1m".into(),
            side: PositionSide::Long,
            entry_bar: 4,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
            entry_price: 100.0,
            exit_bar: 8,
            exit_time: Utc.with_ymd_and_hms(2024, 1, 5, 0, 4, 0).unwrap(),
            exit_price: 110.0,
            exit_reason: ExitReason::TakeProfit,
            sl: Some(95.0),
            tp: Some(110.0),
            qty: 5.0,
            fees: 2.0,
            pnl: 48.0,
        }
    }

    #[test]
    fn return_pct_calculation() {
        let trade = sample_trade();
        assert!((trade.return_pct() - 48.0 / 500.0).abs() < 1e-12);
    }

    #[test]
    fn winner_and_duration() {
        let trade = sample_trade();
        assert!(trade.is_winner());
        assert_eq!(trade.bars_held(), 4);
    }

    #[test]
    fn exit_reason_serializes_snake_case() {
        let json = serde_json::to_string(&ExitReason::EndOfData).unwrap();
        assert_eq!(json, "\"end_of_data\"");
        assert_eq!(ExitReason::StopLoss.as_str(), "stop_loss");
    }
}

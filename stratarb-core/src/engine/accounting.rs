//! Fill prices, fees, realized PnL and the running balance.

use crate::domain::PositionSide;

/// Entry fill: slippage moves the price against the trader.
pub fn entry_price(close: f64, side: PositionSide, slippage_pct: f64) -> f64 {
    match side {
        PositionSide::Long => close + close * slippage_pct,
        PositionSide::Short => close - close * slippage_pct,
        PositionSide::Flat => close,
    }
}

/// Exit fill: slippage is applied opposite to the entry direction.
pub fn exit_price(level: f64, side: PositionSide, slippage_pct: f64) -> f64 {
    match side {
        PositionSide::Long => level - level * slippage_pct,
        PositionSide::Short => level + level * slippage_pct,
        PositionSide::Flat => level,
    }
}

/// Fees charged on both legs of a round trip.
pub fn round_trip_fees(entry: f64, exit: f64, qty: f64, fee_pct: f64) -> f64 {
    fee_pct * entry * qty + fee_pct * exit * qty
}

/// Price PnL before fees.
pub fn gross_pnl(side: PositionSide, entry: f64, exit: f64, qty: f64) -> f64 {
    match side {
        PositionSide::Long => (exit - entry) * qty,
        PositionSide::Short => (entry - exit) * qty,
        PositionSide::Flat => 0.0,
    }
}

/// Running balance and the equity curve.
///
/// The curve starts at the initial balance and grows by one point per
/// realized trade, so `curve.last() - curve.first()` equals the sum of
/// realized PnL.
#[derive(Debug, Clone)]
pub struct Ledger {
    initial_balance: f64,
    balance: f64,
    fees_paid: f64,
    equity_curve: Vec<f64>,
}

impl Ledger {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            balance: initial_balance,
            fees_paid: 0.0,
            equity_curve: vec![initial_balance],
        }
    }

    /// Book a closed trade's net PnL.
    pub fn realize(&mut self, net_pnl: f64, fees: f64) {
        self.balance += net_pnl;
        self.fees_paid += fees;
        self.equity_curve.push(self.balance);
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn fees_paid(&self) -> f64 {
        self.fees_paid
    }

    pub fn equity_curve(&self) -> &[f64] {
        &self.equity_curve
    }

    pub fn into_curve(self) -> Vec<f64> {
        self.equity_curve
    }
}

//! Domain types for StratArb

pub mod bar;
pub mod position;
pub mod signal;
pub mod trade;

pub use bar::{Bar, DataError};
pub use position::{Position, PositionError, PositionKey, PositionSide};
pub use signal::{Signal, SignalAction};
pub use trade::{ExitReason, Trade};

/// (symbol, timeframe) pair identifying one bar series.
pub type SeriesKey = (String, String);

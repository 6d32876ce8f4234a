//! Bar: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for one (symbol, timeframe) series.
///
/// Bars carry no symbol of their own: the series key they are stored under
/// identifies them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Malformed or incomplete market data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("bar {index} at {timestamp} has non-finite OHLC fields")]
    VoidBar {
        index: usize,
        timestamp: DateTime<Utc>,
    },
    #[error("bar {index} at {timestamp} has inconsistent OHLC (high={high}, low={low}, close={close})")]
    InsaneBar {
        index: usize,
        timestamp: DateTime<Utc>,
        high: f64,
        low: f64,
        close: f64,
    },
    #[error("invalid signal from '{strategy}': {reason}")]
    InvalidSignal { strategy: String, reason: String },
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity: high >= low, close inside the range, positive close.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.close
            && self.low <= self.close
            && self.close > 0.0
    }

    /// Check that the bar is usable by the engine at `index` in its series.
    pub fn check(&self, index: usize) -> Result<(), DataError> {
        if self.is_void() {
            return Err(DataError::VoidBar {
                index,
                timestamp: self.timestamp,
            });
        }
        if !self.is_sane() {
            return Err(DataError::InsaneBar {
                index,
                timestamp: self.timestamp,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }
        Ok(())
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

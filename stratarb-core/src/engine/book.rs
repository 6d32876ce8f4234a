//! Position book: at most one open position per (strategy, symbol, timeframe).

use std::collections::BTreeMap;

use crate::domain::{Position, PositionError, PositionKey, PositionSide};

#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    open: BTreeMap<PositionKey, Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a position on an empty slot.
    pub fn open(&mut self, key: PositionKey, position: Position) -> Result<(), PositionError> {
        if position.side == PositionSide::Flat || !(position.quantity > 0.0) {
            return Err(PositionError::InvalidEntry {
                side: position.side,
                quantity: position.quantity,
            });
        }
        if self.open.contains_key(&key) {
            return Err(PositionError::AlreadyOpen(key));
        }
        self.open.insert(key, position);
        Ok(())
    }

    /// Remove and return the open position for `key`.
    pub fn close(&mut self, key: &PositionKey) -> Result<Position, PositionError> {
        self.open
            .remove(key)
            .ok_or_else(|| PositionError::NotOpen(key.clone()))
    }

    pub fn get(&self, key: &PositionKey) -> Option<&Position> {
        self.open.get(key)
    }

    pub fn is_open(&self, key: &PositionKey) -> bool {
        self.open.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PositionKey, &Position)> {
        self.open.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn long(qty: f64) -> Position {
        Position {
            side: PositionSide::Long,
            entry_price: 100.0,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            entry_bar: 0,
            quantity: qty,
            stop_loss: None,
            take_profit: None,
        }
    }

    #[test]
    fn second_open_on_same_key_is_refused() {
        let mut book = PositionBook::new();
        let key = PositionKey::new("ema_crossover", "BTCUSDT", "1h");
        book.open(key.clone(), long(1.0)).unwrap();
        assert_eq!(
            book.open(key.clone(), long(2.0)),
            Err(PositionError::AlreadyOpen(key.clone()))
        );
        assert_eq!(book.get(&key).unwrap().quantity, 1.0);
    }

    #[test]
    fn other_keys_are_independent() {
        let mut book = PositionBook::new();
        book.open(PositionKey::new("a", "BTCUSDT", "1h"), long(1.0)).unwrap();
        book.open(PositionKey::new("a", "BTCUSDT", "4h"), long(1.0)).unwrap();
        book.open(PositionKey::new("b", "BTCUSDT", "1h"), long(1.0)).unwrap();
        assert_eq!(book.len(), 3);
    }

    #[test]
    fn close_frees_the_slot() {
        let mut book = PositionBook::new();
        let key = PositionKey::new("grid", "ETHUSDT", "15m");
        book.open(key.clone(), long(1.0)).unwrap();
        assert!(book.close(&key).is_ok());
        assert!(!book.is_open(&key));
        assert_eq!(book.close(&key), Err(PositionError::NotOpen(key.clone())));
        assert!(book.open(key, long(1.0)).is_ok());
    }

    #[test]
    fn rejects_flat_or_empty_entries() {
        let mut book = PositionBook::new();
        let key = PositionKey::new("x", "BTCUSDT", "1h");
        assert!(matches!(
            book.open(key.clone(), long(0.0)),
            Err(PositionError::InvalidEntry { .. })
        ));
        let mut flat = long(1.0);
        flat.side = PositionSide::Flat;
        assert!(book.open(key, flat).is_err());
        assert!(book.is_empty());
    }
}

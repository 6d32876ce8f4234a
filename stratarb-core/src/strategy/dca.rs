//! Dollar-cost averaging: buy on a fixed calendar interval.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{Signal, SignalAction};

use super::{BarContext, Binding, Strategy, StrategyError};

/// Time-interval accumulator.
///
/// The first bar always buys. Afterwards a buy fires once at least
/// `interval` has passed (in bar time) since the previous buy.
#[derive(Debug, Clone)]
pub struct Dca {
    binding: Binding,
    pub interval: Duration,
    last_buy: Option<DateTime<Utc>>,
}

impl Dca {
    pub fn new(binding: Binding, interval_days: i64) -> Self {
        assert!(interval_days >= 1, "interval_days must be >= 1");
        Self {
            binding,
            interval: Duration::days(interval_days),
            last_buy: None,
        }
    }
}

impl Strategy for Dca {
    fn binding(&self) -> &Binding {
        &self.binding
    }

    fn generate_signal(&mut self, ctx: &BarContext<'_>) -> Result<Signal, StrategyError> {
        let now = ctx.current().timestamp;
        let due = self.last_buy.map_or(true, |last| now - last >= self.interval);
        if due {
            self.last_buy = Some(now);
            Ok(ctx.signal(self.name(), SignalAction::Buy, 0.3))
        } else {
            Ok(ctx.hold(self.name()))
        }
    }
}

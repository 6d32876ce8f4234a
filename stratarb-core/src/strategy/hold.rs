//! A strategy that never trades. Useful as a baseline arm and in tests.

use crate::domain::Signal;

use super::{BarContext, Binding, Strategy, StrategyError};

#[derive(Debug, Clone)]
pub struct AlwaysHold {
    binding: Binding,
}

impl AlwaysHold {
    pub fn new(binding: Binding) -> Self {
        Self { binding }
    }
}

impl Strategy for AlwaysHold {
    fn binding(&self) -> &Binding {
        &self.binding
    }

    fn generate_signal(&mut self, ctx: &BarContext<'_>) -> Result<Signal, StrategyError> {
        Ok(ctx.hold(self.name()))
    }
}

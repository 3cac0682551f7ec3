//! Static portfolio strategy.

use super::{Strategy, StrategyError};
use crate::domain::{DateWindow, Portfolio, StrategyParams};

/// Always returns the same portfolio, ignoring the window and parameters.
#[derive(Debug, Clone)]
pub struct FixedWeights {
    portfolio: Portfolio,
}

impl FixedWeights {
    pub fn new(portfolio: Portfolio) -> Self {
        Self { portfolio }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }
}

impl Strategy for FixedWeights {
    fn name(&self) -> &str {
        "fixed-weights"
    }

    fn select(
        &self,
        _window: DateWindow,
        _params: &StrategyParams,
    ) -> Result<Portfolio, StrategyError> {
        Ok(self.portfolio.clone())
    }
}

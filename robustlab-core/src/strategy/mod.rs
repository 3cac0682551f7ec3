//! Strategy trait: the black box that turns a window into a portfolio.
//!
//! A strategy is invoked with a date window and an immutable parameter record.
//! "Nothing selected" is an empty portfolio, not an error. Errors are reserved
//! for genuine failures (bad parameters, broken data source) and are handled by
//! the calling tester.

pub mod fixed;
pub mod momentum;

use thiserror::Error;

use crate::data::DataError;
use crate::domain::{DateWindow, Portfolio, PortfolioError, StrategyParams};

pub use fixed::FixedWeights;
pub use momentum::MomentumTopN;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("portfolio error: {0}")]
    Portfolio(#[from] PortfolioError),

    #[error("strategy failed: {0}")]
    Failed(String),
}

/// Portfolio selection process under validation.
pub trait Strategy: Send + Sync {
    /// Human-readable name of this strategy.
    fn name(&self) -> &str;

    /// Select a portfolio using only information inside `window`.
    fn select(&self, window: DateWindow, params: &StrategyParams)
        -> Result<Portfolio, StrategyError>;
}

/// Adapter turning a closure into a named [`Strategy`].
pub struct FnStrategy<F> {
    name: String,
    select: F,
}

impl<F> FnStrategy<F>
where
    F: Fn(DateWindow, &StrategyParams) -> Result<Portfolio, StrategyError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, select: F) -> Self {
        Self {
            name: name.into(),
            select,
        }
    }
}

impl<F> Strategy for FnStrategy<F>
where
    F: Fn(DateWindow, &StrategyParams) -> Result<Portfolio, StrategyError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn select(
        &self,
        window: DateWindow,
        params: &StrategyParams,
    ) -> Result<Portfolio, StrategyError> {
        (self.select)(window, params)
    }
}

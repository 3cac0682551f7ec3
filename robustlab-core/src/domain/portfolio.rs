//! Portfolio: the output of a strategy invocation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PortfolioError {
    #[error("weight for '{symbol}' must be finite and non-negative, got {weight}")]
    InvalidWeight { symbol: String, weight: f64 },

    #[error("empty instrument identifier")]
    EmptySymbol,
}

/// Selected instruments and their target weights.
///
/// Keys are unique and iterate in sorted order. Weights are non-negative but
/// need not sum to one; the backtest runner renormalises over the instruments
/// that have usable data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    weights: BTreeMap<String, f64>,
}

impl Portfolio {
    /// The empty portfolio (nothing selected).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a portfolio from `(symbol, weight)` pairs.
    ///
    /// A symbol listed twice keeps its last weight.
    pub fn from_weights<I, S>(weights: I) -> Result<Self, PortfolioError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (symbol, weight) in weights {
            let symbol = symbol.into();
            if symbol.trim().is_empty() {
                return Err(PortfolioError::EmptySymbol);
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(PortfolioError::InvalidWeight { symbol, weight });
            }
            map.insert(symbol, weight);
        }
        Ok(Self { weights: map })
    }

    /// Equal-weight portfolio over `symbols`.
    pub fn equal_weight<I, S>(symbols: I) -> Result<Self, PortfolioError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_weights(symbols.into_iter().map(|s| (s, 1.0)))
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &BTreeMap<String, f64> {
        &self.weights
    }

    pub fn weight(&self, symbol: &str) -> Option<f64> {
        self.weights.get(symbol).copied()
    }

    /// Instrument identifiers in sorted order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.values().sum()
    }
}

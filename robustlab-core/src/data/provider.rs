//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over data sources (CSV directories,
//! in-memory fixtures, caches) so the backtest runner can be wired to real data
//! and mocked for tests.

use chrono::NaiveDate;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::{PricePoint, PriceSeries};

/// Structured error types for data operations.
///
/// Every variant means "no usable series for this instrument"; the backtest
/// runner drops the instrument instead of failing the run.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no data for '{symbol}' between {start} and {end}")]
    NoDataInRange {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("I/O error reading '{symbol}': {source}")]
    Io {
        symbol: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data for '{symbol}': {reason}")]
    Malformed { symbol: String, reason: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Source of daily close prices.
///
/// Implementations must be safe for concurrent reads: the testers fan samples
/// out across threads.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily closes for `symbol` over `[start, end]`, chronologically ordered.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<PriceSeries, DataError>;
}

impl<P: PriceProvider + ?Sized> PriceProvider for &P {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        (**self).fetch(symbol, start, end)
    }
}

impl<P: PriceProvider + ?Sized> PriceProvider for std::sync::Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        (**self).fetch(symbol, start, end)
    }
}

/// In-memory provider over fully loaded series. Used for fixtures and by
/// callers that already hold their data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    series: HashMap<String, Vec<PricePoint>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the full history for a symbol.
    pub fn insert(&mut self, series: PriceSeries) {
        let sorted = PriceSeries::new(series.symbol, series.points);
        self.series.insert(sorted.symbol, sorted.points);
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.insert(series);
        self
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.series.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

impl PriceProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let points = self
            .series
            .get(symbol)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        let window: Vec<PricePoint> = points
            .iter()
            .filter(|p| p.date >= start && p.date <= end)
            .copied()
            .collect();
        if window.is_empty() {
            return Err(DataError::NoDataInRange {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(PriceSeries {
            symbol: symbol.to_string(),
            points: window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn provider() -> InMemoryProvider {
        InMemoryProvider::new().with_series(PriceSeries::new(
            "SPY",
            (2..=10)
                .map(|day| PricePoint {
                    date: d(day),
                    close: 100.0 + day as f64,
                })
                .collect(),
        ))
    }

    #[test]
    fn fetch_filters_to_window() {
        let s = provider().fetch("SPY", d(4), d(6)).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.first_date(), Some(d(4)));
        assert_eq!(s.last_date(), Some(d(6)));
    }

    #[test]
    fn unknown_symbol_is_not_found() {
        let err = provider().fetch("QQQ", d(2), d(10)).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn empty_window_is_no_data() {
        let err = provider().fetch("SPY", d(20), d(25)).unwrap_err();
        assert!(matches!(err, DataError::NoDataInRange { .. }));
    }

    #[test]
    fn reference_is_a_provider() {
        let p = provider();
        let by_ref: &dyn PriceProvider = &p;
        assert_eq!((&by_ref).name(), "in-memory");
    }
}

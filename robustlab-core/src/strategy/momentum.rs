//! Trailing-momentum top-N selection.
//!
//! Ranks a fixed universe by total return over the selection window and holds
//! the strongest names, weighted in proportion to their momentum.
//!
//! Parameters:
//! - `num_stocks` (int, default 10): maximum holdings, must be >= 1
//! - `min_momentum` (float, default 0.0): a name qualifies only above this return

use tracing::debug;

use super::{Strategy, StrategyError};
use crate::data::PriceProvider;
use crate::domain::{DateWindow, Portfolio, StrategyParams};

pub const DEFAULT_NUM_STOCKS: i64 = 10;
pub const DEFAULT_MIN_MOMENTUM: f64 = 0.0;

pub struct MomentumTopN<P> {
    provider: P,
    universe: Vec<String>,
}

impl<P: PriceProvider> MomentumTopN<P> {
    pub fn new(provider: P, universe: Vec<String>) -> Self {
        Self { provider, universe }
    }

    pub fn universe(&self) -> &[String] {
        &self.universe
    }
}

impl<P: PriceProvider> Strategy for MomentumTopN<P> {
    fn name(&self) -> &str {
        "momentum-top-n"
    }

    fn select(
        &self,
        window: DateWindow,
        params: &StrategyParams,
    ) -> Result<Portfolio, StrategyError> {
        let num_stocks = params.int_or("num_stocks", DEFAULT_NUM_STOCKS);
        if num_stocks < 1 {
            return Err(StrategyError::InvalidParameter {
                name: "num_stocks".into(),
                reason: format!("must be >= 1, got {num_stocks}"),
            });
        }
        let min_momentum = params.f64_or("min_momentum", DEFAULT_MIN_MOMENTUM);

        let mut ranked: Vec<(&str, f64)> = Vec::new();
        for symbol in &self.universe {
            match self.provider.fetch(symbol, window.start, window.end) {
                Ok(series) => {
                    if let Some(r) = series.total_return() {
                        if r > min_momentum {
                            ranked.push((symbol.as_str(), r));
                        }
                    }
                }
                Err(e) => debug!(symbol = symbol.as_str(), error = %e, "skipping symbol"),
            }
        }

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked.truncate(num_stocks as usize);

        // Weight by excess over the qualification bar so every holding is positive.
        let weights = ranked
            .into_iter()
            .map(|(symbol, r)| (symbol, (r - min_momentum).max(f64::EPSILON)));
        Ok(Portfolio::from_weights(weights)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryProvider;
    use crate::domain::{PricePoint, PriceSeries};
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(symbol: &str, first: f64, last: f64) -> PriceSeries {
        PriceSeries::new(
            symbol,
            vec![
                PricePoint { date: d(2), close: first },
                PricePoint { date: d(20), close: last },
            ],
        )
    }

    fn strategy() -> MomentumTopN<InMemoryProvider> {
        let provider = InMemoryProvider::new()
            .with_series(series("UP_BIG", 100.0, 130.0))
            .with_series(series("UP_SMALL", 100.0, 105.0))
            .with_series(series("FLAT", 100.0, 100.0))
            .with_series(series("DOWN", 100.0, 90.0));
        let universe = ["UP_BIG", "UP_SMALL", "FLAT", "DOWN", "MISSING"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        MomentumTopN::new(provider, universe)
    }

    #[test]
    fn picks_positive_momentum_names() {
        let p = strategy()
            .select(DateWindow::new(d(1), d(31)), &StrategyParams::new())
            .unwrap();
        assert_eq!(p.symbols().collect::<Vec<_>>(), vec!["UP_BIG", "UP_SMALL"]);
        assert!(p.weight("UP_BIG").unwrap() > p.weight("UP_SMALL").unwrap());
    }

    #[test]
    fn num_stocks_limits_holdings() {
        let params = StrategyParams::new().with("num_stocks", 1_i64);
        let p = strategy()
            .select(DateWindow::new(d(1), d(31)), &params)
            .unwrap();
        assert_eq!(p.symbols().collect::<Vec<_>>(), vec!["UP_BIG"]);
    }

    #[test]
    fn high_bar_yields_empty_portfolio() {
        let params = StrategyParams::new().with("min_momentum", 0.5);
        let p = strategy()
            .select(DateWindow::new(d(1), d(31)), &params)
            .unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn zero_holdings_is_invalid() {
        let params = StrategyParams::new().with("num_stocks", 0_i64);
        let err = strategy()
            .select(DateWindow::new(d(1), d(31)), &params)
            .unwrap_err();
        assert!(matches!(err, StrategyError::InvalidParameter { .. }));
    }
}

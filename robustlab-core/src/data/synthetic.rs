//! Synthetic price providers for tests and benchmarks.
//!
//! These are test doubles. Nothing in the validation pipeline falls back to
//! them; callers opt in by constructing one explicitly.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, PriceProvider};
use crate::domain::{PricePoint, PriceSeries};

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn weekdays(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let days = (end - start).num_days().max(-1) + 1;
    (0..days)
        .map(move |i| start + Duration::days(i))
        .filter(|d| is_weekday(*d))
}

/// Every instrument compounds at the same fixed daily return on weekdays,
/// starting at 100.0 on the first weekday of the requested window.
#[derive(Debug, Clone, Copy)]
pub struct ConstantReturnProvider {
    daily_return: f64,
}

impl ConstantReturnProvider {
    pub fn new(daily_return: f64) -> Self {
        Self { daily_return }
    }
}

impl PriceProvider for ConstantReturnProvider {
    fn name(&self) -> &str {
        "synthetic-constant"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let mut close = 100.0;
        let mut points = Vec::new();
        for date in weekdays(start, end) {
            points.push(PricePoint { date, close });
            close *= 1.0 + self.daily_return;
        }
        if points.is_empty() {
            return Err(DataError::NoDataInRange {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(PriceSeries {
            symbol: symbol.to_string(),
            points,
        })
    }
}

/// Seeded random walk per symbol on weekdays.
///
/// The path is generated from a fixed epoch so overlapping windows see the
/// same closes. Each symbol's path depends only on `(seed, symbol)`.
#[derive(Debug, Clone)]
pub struct RandomWalkProvider {
    seed: u64,
    drift: f64,
    volatility: f64,
    epoch: NaiveDate,
}

impl RandomWalkProvider {
    /// `drift` and `volatility` are per-day; shocks are uniform with that standard deviation.
    pub fn new(seed: u64, drift: f64, volatility: f64) -> Self {
        Self {
            seed,
            drift,
            volatility,
            epoch: NaiveDate::from_ymd_opt(2000, 1, 3).unwrap_or(NaiveDate::MIN),
        }
    }

    fn rng_for(&self, symbol: &str) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }
}

impl PriceProvider for RandomWalkProvider {
    fn name(&self) -> &str {
        "synthetic-random-walk"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let mut rng = self.rng_for(symbol);
        // Uniform(-a, a) has standard deviation a / sqrt(3).
        let half_width = self.volatility * 3.0_f64.sqrt();
        let origin = self.epoch.min(start);

        let mut close = 100.0_f64;
        let mut points = Vec::new();
        for date in weekdays(origin, end) {
            if date >= start {
                points.push(PricePoint { date, close });
            }
            let shock = if half_width > 0.0 {
                rng.gen_range(-half_width..half_width)
            } else {
                0.0
            };
            close = (close * (1.0 + self.drift + shock)).max(0.01);
        }

        if points.is_empty() {
            return Err(DataError::NoDataInRange {
                symbol: symbol.to_string(),
                start,
                end,
            });
        }
        Ok(PriceSeries {
            symbol: symbol.to_string(),
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn constant_provider_skips_weekends() {
        // 2024-01-01 is a Monday.
        let s = ConstantReturnProvider::new(0.001)
            .fetch("A", d(2024, 1, 1), d(2024, 1, 14))
            .unwrap();
        assert_eq!(s.len(), 10);
        assert!(s.points.iter().all(|p| is_weekday(p.date)));
    }

    #[test]
    fn constant_provider_compounds() {
        let s = ConstantReturnProvider::new(0.01)
            .fetch("A", d(2024, 1, 1), d(2024, 1, 3))
            .unwrap();
        assert_eq!(s.points[0].close, 100.0);
        assert!((s.points[2].close - 102.01).abs() < 1e-9);
    }

    #[test]
    fn random_walk_is_deterministic_and_window_consistent() {
        let p = RandomWalkProvider::new(7, 0.0003, 0.01);
        let full = p.fetch("SPY", d(2024, 1, 1), d(2024, 3, 31)).unwrap();
        let part = p.fetch("SPY", d(2024, 2, 1), d(2024, 2, 29)).unwrap();
        let again = p.fetch("SPY", d(2024, 2, 1), d(2024, 2, 29)).unwrap();
        assert_eq!(part, again);
        for pt in &part.points {
            let same = full.points.iter().find(|f| f.date == pt.date).unwrap();
            assert_eq!(same.close, pt.close);
        }
    }

    #[test]
    fn random_walk_differs_by_symbol() {
        let p = RandomWalkProvider::new(7, 0.0, 0.02);
        let a = p.fetch("A", d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        let b = p.fetch("B", d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        assert_ne!(a.points, b.points);
    }

    #[test]
    fn weekend_only_window_is_no_data() {
        // 2024-01-06/07 is a weekend.
        let err = ConstantReturnProvider::new(0.0)
            .fetch("A", d(2024, 1, 6), d(2024, 1, 7))
            .unwrap_err();
        assert!(matches!(err, DataError::NoDataInRange { .. }));
    }
}

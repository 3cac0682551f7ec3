//! Benchmark comparison: portfolio returns against a reference instrument.
//!
//! Both return series are matched on date before any statistic is computed.
//! Beta and correlation fall back to 0.0 when the benchmark (or portfolio) has
//! no variance.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::{covariance, std_dev, total_return};

/// Portfolio performance relative to a benchmark over the same dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub symbol: String,
    /// Return observations present in both series.
    pub periods: usize,
    pub portfolio_return: f64,
    pub benchmark_return: f64,
    /// `portfolio_return - benchmark_return`.
    pub alpha: f64,
    pub beta: f64,
    pub correlation: f64,
    /// Alpha in percentage points.
    pub outperformance: f64,
}

impl BenchmarkComparison {
    /// Compare two date-keyed daily return series. `None` with fewer than two
    /// common dates.
    pub fn compute(
        symbol: impl Into<String>,
        portfolio: &BTreeMap<NaiveDate, f64>,
        benchmark: &BTreeMap<NaiveDate, f64>,
    ) -> Option<Self> {
        let (p, b): (Vec<f64>, Vec<f64>) = portfolio
            .iter()
            .filter_map(|(date, &r)| benchmark.get(date).map(|&br| (r, br)))
            .unzip();
        if p.len() < 2 {
            return None;
        }

        let portfolio_return = total_return(&p);
        let benchmark_return = total_return(&b);
        let alpha = portfolio_return - benchmark_return;

        let cov = covariance(&p, &b);
        let (sp, sb) = (std_dev(&p), std_dev(&b));
        let beta = if sb > 0.0 { cov / (sb * sb) } else { 0.0 };
        let correlation = if sp > 0.0 && sb > 0.0 {
            (cov / (sp * sb)).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        Some(Self {
            symbol: symbol.into(),
            periods: p.len(),
            portfolio_return,
            benchmark_return,
            alpha,
            beta,
            correlation,
            outperformance: alpha * 100.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(returns: &[f64]) -> BTreeMap<NaiveDate, f64> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        returns
            .iter()
            .enumerate()
            .map(|(i, &r)| (base + chrono::Duration::days(i as i64), r))
            .collect()
    }

    #[test]
    fn leveraged_portfolio_has_beta_two() {
        let bench = [0.01, -0.02, 0.015, 0.005, -0.01];
        let port: Vec<f64> = bench.iter().map(|r| 2.0 * r).collect();
        let c = BenchmarkComparison::compute("SPY", &dated(&port), &dated(&bench)).unwrap();
        assert_eq!(c.symbol, "SPY");
        assert_eq!(c.periods, 5);
        assert!((c.beta - 2.0).abs() < 1e-12);
        assert!((c.correlation - 1.0).abs() < 1e-12);
        assert!((c.alpha - (total_return(&port) - total_return(&bench))).abs() < 1e-12);
        assert!((c.outperformance - c.alpha * 100.0).abs() < 1e-12);
    }

    #[test]
    fn flat_benchmark_gives_zero_beta() {
        let c = BenchmarkComparison::compute(
            "CASH",
            &dated(&[0.01, -0.01, 0.02]),
            &dated(&[0.0, 0.0, 0.0]),
        )
        .unwrap();
        assert_eq!(c.beta, 0.0);
        assert_eq!(c.correlation, 0.0);
        assert_eq!(c.benchmark_return, 0.0);
        assert!(c.alpha > 0.0);
    }

    #[test]
    fn only_common_dates_are_compared() {
        let port = dated(&[0.01, 0.02, 0.03, 0.04]);
        let mut bench = dated(&[0.01, 0.02, 0.03, 0.04]);
        bench.pop_first();
        let c = BenchmarkComparison::compute("B", &port, &bench).unwrap();
        assert_eq!(c.periods, 3);
        assert!((c.portfolio_return - c.benchmark_return).abs() < 1e-12);
    }

    #[test]
    fn too_little_overlap_is_none() {
        let port = dated(&[0.01, 0.02]);
        let bench: BTreeMap<NaiveDate, f64> = port.iter().take(1).map(|(d, r)| (*d, *r)).collect();
        assert!(BenchmarkComparison::compute("B", &port, &bench).is_none());
    }
}

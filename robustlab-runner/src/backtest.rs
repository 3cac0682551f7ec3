//! Backtest runner: portfolio + date window → one `BacktestResult`.
//!
//! Pipeline per run:
//! 1. Fetch closes for every held instrument (unservable instruments are dropped)
//! 2. Align to the union of dates, drop instruments below the coverage threshold
//! 3. Forward-fill gaps, drop rows that still have gaps
//! 4. Renormalise surviving weights, compute weighted daily portfolio returns
//! 5. Compute metrics, the rolling Sharpe profile, and (when configured) the
//!    comparison against a benchmark instrument
//!
//! Data insufficiency never escapes as an error: the result is marked
//! unsuccessful and carries the failed sentinel metrics.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use robustlab_core::data::align_closes;
use robustlab_core::{DateWindow, Portfolio, PriceProvider, PriceSeries};

use crate::benchmark::BenchmarkComparison;
use crate::metrics::{
    PerformanceMetrics, RollingSharpeSummary, DEFAULT_RISK_FREE_RATE, DEFAULT_ROLLING_WINDOW,
};

// ─── Configuration ───────────────────────────────────────────────────

/// Settings shared by every backtest in a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    /// Minimum fraction of aligned dates an instrument must cover (default 0.7).
    pub coverage_threshold: f64,
    /// Annual risk-free rate for the Sharpe ratio (default 0.02).
    pub risk_free_rate: f64,
    /// Returns per rolling-Sharpe window (default 63, about a quarter).
    pub rolling_window: usize,
    /// Reference instrument every successful backtest is compared against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<String>,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            coverage_threshold: 0.7,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            rolling_window: DEFAULT_ROLLING_WINDOW,
            benchmark: None,
        }
    }
}

// ─── Result types ────────────────────────────────────────────────────

/// Why a backtest produced no usable return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktestFailure {
    /// The strategy selected nothing.
    EmptyPortfolio,
    /// The provider could not serve any held instrument.
    NoData,
    /// Every instrument fell below the coverage threshold.
    InsufficientCoverage,
    /// Surviving instruments carry zero total weight.
    ZeroWeight,
    /// Fewer than two complete rows remained after cleaning.
    NoReturnPeriods,
}

impl fmt::Display for BacktestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::EmptyPortfolio => "empty portfolio",
            Self::NoData => "no price data",
            Self::InsufficientCoverage => "insufficient coverage",
            Self::ZeroWeight => "zero surviving weight",
            Self::NoReturnPeriods => "no return periods",
        };
        f.write_str(s)
    }
}

/// Outcome of one backtested window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Timeframe name, walk-forward window label, or simulation label.
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<BacktestFailure>,
    #[serde(flatten)]
    pub metrics: PerformanceMetrics,
    /// Number of instruments actually held.
    pub num_trades: usize,
    /// Instruments actually held, in symbol order.
    pub stocks_selected: Vec<String>,
    /// Normalised weights of the held instruments.
    #[serde(default)]
    pub weights_used: BTreeMap<String, f64>,
    /// Number of daily return observations.
    #[serde(default)]
    pub num_periods: usize,
    /// Rolling Sharpe profile. Absent when the window is shorter than one
    /// rolling window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_sharpe: Option<RollingSharpeSummary>,
    /// Comparison against the configured benchmark, when it could be fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<BenchmarkComparison>,
}

impl BacktestResult {
    /// Unsuccessful result with the failed sentinel metrics.
    pub fn failed(period: impl Into<String>, window: DateWindow, reason: BacktestFailure) -> Self {
        Self {
            period: period.into(),
            start_date: window.start,
            end_date: window.end,
            success: false,
            failure: Some(reason),
            metrics: PerformanceMetrics::failed(),
            num_trades: 0,
            stocks_selected: Vec::new(),
            weights_used: BTreeMap::new(),
            num_periods: 0,
            rolling_sharpe: None,
            benchmark: None,
        }
    }

    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date, self.end_date)
    }

    pub fn sharpe_ratio(&self) -> f64 {
        self.metrics.sharpe_ratio
    }

    pub fn total_return(&self) -> f64 {
        self.metrics.total_return
    }
}

// ─── Runner ──────────────────────────────────────────────────────────

/// Backtests fixed-weight portfolios against a price provider.
#[derive(Debug, Clone)]
pub struct BacktestRunner<P> {
    provider: P,
    settings: BacktestSettings,
}

impl<P: PriceProvider> BacktestRunner<P> {
    pub fn new(provider: P, settings: BacktestSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn settings(&self) -> &BacktestSettings {
        &self.settings
    }

    /// Backtest `portfolio` over `window`, holding weights fixed (no rebalancing).
    pub fn run(&self, portfolio: &Portfolio, window: DateWindow, period: &str) -> BacktestResult {
        if portfolio.is_empty() {
            return BacktestResult::failed(period, window, BacktestFailure::EmptyPortfolio);
        }

        let series: Vec<PriceSeries> = portfolio
            .symbols()
            .filter_map(|symbol| match self.provider.fetch(symbol, window.start, window.end) {
                Ok(s) if !s.is_empty() => Some(s),
                Ok(_) => {
                    warn!(symbol, %window, "provider returned an empty series, dropping");
                    None
                }
                Err(e) => {
                    warn!(symbol, %window, error = %e, "price fetch failed, dropping");
                    None
                }
            })
            .collect();
        if series.is_empty() {
            return BacktestResult::failed(period, window, BacktestFailure::NoData);
        }

        let mut aligned = align_closes(&series);
        let dropped = aligned.drop_sparse(self.settings.coverage_threshold);
        if !dropped.is_empty() {
            debug!(period, ?dropped, "dropped instruments below coverage threshold");
        }
        if aligned.closes.is_empty() {
            return BacktestResult::failed(period, window, BacktestFailure::InsufficientCoverage);
        }
        aligned.forward_fill();
        aligned.drop_incomplete_rows();

        let total_weight: f64 = aligned
            .symbols()
            .filter_map(|s| portfolio.weight(s))
            .sum();
        if total_weight <= 0.0 {
            return BacktestResult::failed(period, window, BacktestFailure::ZeroWeight);
        }
        let weights: BTreeMap<String, f64> = aligned
            .symbols()
            .map(|s| (s.to_string(), portfolio.weight(s).unwrap_or(0.0) / total_weight))
            .collect();

        let returns = aligned.returns();
        let num_periods = aligned.dates.len().saturating_sub(1);
        if num_periods == 0 {
            return BacktestResult::failed(period, window, BacktestFailure::NoReturnPeriods);
        }
        let portfolio_returns: Vec<f64> = (0..num_periods)
            .map(|t| {
                weights
                    .iter()
                    .map(|(s, w)| w * returns.get(s).map_or(0.0, |r| r[t]))
                    .sum()
            })
            .collect();

        let metrics = PerformanceMetrics::compute(
            &portfolio_returns,
            window.calendar_days(),
            self.settings.risk_free_rate,
        );
        let rolling_sharpe = RollingSharpeSummary::compute(
            &portfolio_returns,
            self.settings.rolling_window,
            self.settings.risk_free_rate,
        );
        let benchmark = self.settings.benchmark.as_deref().and_then(|symbol| {
            let dated: BTreeMap<NaiveDate, f64> = aligned.dates[1..]
                .iter()
                .copied()
                .zip(portfolio_returns.iter().copied())
                .collect();
            self.compare_to_benchmark(symbol, window, &dated)
        });
        debug!(
            period,
            %window,
            holdings = weights.len(),
            sharpe = metrics.sharpe_ratio,
            "backtest complete"
        );

        let stocks_selected: Vec<String> = weights.keys().cloned().collect();
        BacktestResult {
            period: period.to_string(),
            start_date: window.start,
            end_date: window.end,
            success: true,
            failure: None,
            metrics,
            num_trades: stocks_selected.len(),
            stocks_selected,
            weights_used: weights,
            num_periods,
            rolling_sharpe,
            benchmark,
        }
    }

    /// Fetch `symbol` over `window` and compare it to the dated portfolio
    /// returns. A benchmark that cannot be served is logged and skipped.
    fn compare_to_benchmark(
        &self,
        symbol: &str,
        window: DateWindow,
        portfolio: &BTreeMap<NaiveDate, f64>,
    ) -> Option<BenchmarkComparison> {
        let series = match self.provider.fetch(symbol, window.start, window.end) {
            Ok(s) => s,
            Err(e) => {
                warn!(benchmark = symbol, %window, error = %e, "benchmark fetch failed");
                return None;
            }
        };
        let closes: Vec<(NaiveDate, f64)> = series
            .points
            .iter()
            .filter(|p| p.close.is_finite() && p.close > 0.0)
            .map(|p| (p.date, p.close))
            .collect();
        let returns: BTreeMap<NaiveDate, f64> = closes
            .windows(2)
            .map(|w| (w[1].0, w[1].1 / w[0].1 - 1.0))
            .collect();
        let comparison = BenchmarkComparison::compute(symbol, portfolio, &returns);
        if comparison.is_none() {
            debug!(benchmark = symbol, %window, "too few common dates for a benchmark comparison");
        }
        comparison
    }
}

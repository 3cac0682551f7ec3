//! Performance metrics: pure functions that compute portfolio statistics.
//!
//! Every metric is a pure function: daily fractional return series in, scalar
//! out. No dependencies on the runner, data pipeline, or testers. Degenerate
//! inputs (empty series, zero variance) return defined values, never NaN.

use serde::{Deserialize, Serialize};

/// Trading days per year used for volatility and Sharpe annualisation.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Calendar days per year used for return annualisation.
pub const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;

/// Default annual risk-free rate for the Sharpe ratio.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Standard deviations below this are treated as zero variance.
const STD_EPSILON: f64 = 1e-12;

/// Sentinel profile for a backtest that produced no return periods.
pub const FAILED_RETURN: f64 = -1.0;
pub const FAILED_SHARPE: f64 = -10.0;
pub const FAILED_DRAWDOWN: f64 = -1.0;

/// Aggregate performance metrics for one backtested window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub annual_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from a daily return series.
    ///
    /// `calendar_days` is the literal span of the tested window, not the number
    /// of observations, so sparse trading days do not distort annualisation.
    pub fn compute(returns: &[f64], calendar_days: i64, risk_free_rate: f64) -> Self {
        if returns.is_empty() {
            return Self::failed();
        }
        let total = total_return(returns);
        Self {
            total_return: total,
            annual_return: annual_return(total, calendar_days),
            volatility: volatility(returns),
            sharpe_ratio: sharpe_ratio(returns, risk_free_rate),
            max_drawdown: max_drawdown(returns),
            win_rate: win_rate(returns),
        }
    }

    /// Failed sentinel: strongly negative so it sorts below any real outcome.
    pub fn failed() -> Self {
        Self {
            total_return: FAILED_RETURN,
            annual_return: FAILED_RETURN,
            volatility: 0.0,
            sharpe_ratio: FAILED_SHARPE,
            max_drawdown: FAILED_DRAWDOWN,
            win_rate: 0.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        [
            self.total_return,
            self.annual_return,
            self.volatility,
            self.sharpe_ratio,
            self.max_drawdown,
            self.win_rate,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Compounded return: Π(1 + r) − 1.
pub fn total_return(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Annualised return over a calendar span: (1 + total)^(365 / days) − 1.
///
/// Returns 0.0 for a non-positive span and −1.0 when the position was wiped out.
pub fn annual_return(total_return: f64, calendar_days: i64) -> f64 {
    if calendar_days <= 0 {
        return 0.0;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(CALENDAR_DAYS_PER_YEAR / calendar_days as f64) - 1.0
}

/// Annualised volatility: sample std × sqrt(252). 0.0 with fewer than 2 returns.
pub fn volatility(returns: &[f64]) -> f64 {
    std_dev(returns) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Annualised Sharpe ratio.
///
/// Sharpe = sqrt(252) × mean(r − rf/252) / std(r).
/// Returns 0.0 for an empty series or zero variance.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let std = std_dev(returns);
    if std < STD_EPSILON {
        return 0.0;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let mean_excess = mean_f64(returns) - daily_rf;
    TRADING_DAYS_PER_YEAR.sqrt() * mean_excess / std
}

/// Maximum drawdown of the compounded return path, as a non-positive fraction.
///
/// The running peak starts at the first compounded value, matching a
/// cumulative-product path that begins after the first period.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut cumulative = 1.0_f64;
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for r in returns {
        cumulative *= 1.0 + r;
        if cumulative > peak {
            peak = cumulative;
        }
        if peak > 0.0 {
            let dd = (cumulative - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd.max(-1.0)
}

/// Fraction of periods with a strictly positive return.
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().filter(|&&r| r > 0.0).count() as f64 / returns.len() as f64
}

// ─── Rolling Sharpe ─────────────────────────────────────────────────

/// Default rolling window: about one quarter of trading days.
pub const DEFAULT_ROLLING_WINDOW: usize = 63;

/// Sharpe ratio of every complete `window`-length run of returns.
///
/// Element `i` covers `returns[i..i + window]`. Empty when `window` is zero or
/// longer than the series. Zero-variance runs score 0.0 like [`sharpe_ratio`].
pub fn rolling_sharpe(returns: &[f64], window: usize, risk_free_rate: f64) -> Vec<f64> {
    if window == 0 || window > returns.len() {
        return Vec::new();
    }
    returns
        .windows(window)
        .map(|w| sharpe_ratio(w, risk_free_rate))
        .collect()
}

/// Distribution of a rolling Sharpe series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingSharpeSummary {
    /// Returns per rolling window.
    pub window: usize,
    /// Number of complete windows.
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Percent (0–100) of windows with a positive Sharpe.
    pub positive_pct: f64,
}

impl RollingSharpeSummary {
    /// Summarise the rolling Sharpe of `returns`. `None` when the series is
    /// shorter than one window.
    pub fn compute(returns: &[f64], window: usize, risk_free_rate: f64) -> Option<Self> {
        let series = rolling_sharpe(returns, window, risk_free_rate);
        if series.is_empty() {
            return None;
        }
        let n = series.len() as f64;
        Some(Self {
            window,
            count: series.len(),
            mean: mean_f64(&series),
            min: series.iter().copied().fold(f64::INFINITY, f64::min),
            max: series.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            positive_pct: series.iter().filter(|&&s| s > 0.0).count() as f64 / n * 100.0,
        })
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Sample covariance (n − 1 denominator) of two equal-length series.
pub(crate) fn covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let (ma, mb) = (mean_f64(&a[..n]), mean_f64(&b[..n]));
    a[..n]
        .iter()
        .zip(&b[..n])
        .map(|(x, y)| (x - ma) * (y - mb))
        .sum::<f64>()
        / (n - 1) as f64
}

/// Population standard deviation (n denominator).
pub(crate) fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Linear-interpolated percentile of an ascending slice, `p` in [0, 100].
pub(crate) fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Total / annual return ──

    #[test]
    fn total_return_compounds() {
        let r = [0.1, -0.1];
        assert!((total_return(&r) - (1.1 * 0.9 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn total_return_empty_is_zero() {
        assert_eq!(total_return(&[]), 0.0);
    }

    #[test]
    fn annual_return_one_year_is_total() {
        assert!((annual_return(0.1, 365) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn annual_return_half_year_compounds() {
        let a = annual_return(0.1, 182);
        assert!((a - (1.1_f64.powf(365.0 / 182.0) - 1.0)).abs() < 1e-12);
        assert!(a > 0.2);
    }

    #[test]
    fn annual_return_degenerate_inputs() {
        assert_eq!(annual_return(0.5, 0), 0.0);
        assert_eq!(annual_return(-1.5, 365), -1.0);
    }

    // ── Volatility / Sharpe ──

    #[test]
    fn volatility_known_value() {
        let r = [0.01, -0.01];
        // Sample std of ±0.01 is sqrt(0.0002)
        let expected = 0.0002_f64.sqrt() * 252.0_f64.sqrt();
        assert!((volatility(&r) - expected).abs() < 1e-12);
    }

    #[test]
    fn sharpe_constant_returns_is_exactly_zero() {
        let r = vec![0.001; 250];
        assert_eq!(sharpe_ratio(&r, DEFAULT_RISK_FREE_RATE), 0.0);
    }

    #[test]
    fn sharpe_empty_and_single_are_zero() {
        assert_eq!(sharpe_ratio(&[], 0.02), 0.0);
        assert_eq!(sharpe_ratio(&[0.05], 0.02), 0.0);
    }

    #[test]
    fn sharpe_known_value() {
        let r = [0.002, 0.0005, 0.002, 0.0005];
        let mean = 0.00125;
        let std = std_dev(&r);
        let expected = 252.0_f64.sqrt() * (mean - 0.02 / 252.0) / std;
        assert!((sharpe_ratio(&r, 0.02) - expected).abs() < 1e-9);
        assert!(expected > 5.0);
    }

    #[test]
    fn sharpe_risk_free_lowers_ratio() {
        let r = [0.002, -0.001, 0.003, 0.0];
        assert!(sharpe_ratio(&r, 0.05) < sharpe_ratio(&r, 0.0));
    }

    // ── Max drawdown ──

    #[test]
    fn max_drawdown_known() {
        // Path: 1.1, 0.9, 0.95 → peak 1.1, trough 0.9
        let r = [0.1, 0.9 / 1.1 - 1.0, 0.95 / 0.9 - 1.0];
        let expected = (0.9 - 1.1) / 1.1;
        assert!((max_drawdown(&r) - expected).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_monotonic_is_zero() {
        assert_eq!(max_drawdown(&[0.01, 0.02, 0.0, 0.03]), 0.0);
    }

    #[test]
    fn max_drawdown_first_period_loss_is_not_a_drawdown() {
        // The peak starts at the first compounded value.
        assert_eq!(max_drawdown(&[-0.5]), 0.0);
    }

    #[test]
    fn max_drawdown_empty_is_zero() {
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    // ── Win rate ──

    #[test]
    fn win_rate_counts_strictly_positive() {
        assert!((win_rate(&[0.01, 0.0, -0.01, 0.02]) - 0.5).abs() < 1e-12);
        assert_eq!(win_rate(&[]), 0.0);
    }

    // ── Aggregate ──

    #[test]
    fn compute_empty_is_failed_sentinel() {
        let m = PerformanceMetrics::compute(&[], 365, 0.02);
        assert_eq!(m, PerformanceMetrics::failed());
        assert!(m.is_finite());
        assert!(m.max_drawdown <= 0.0);
    }

    #[test]
    fn compute_all_finite() {
        let r: Vec<f64> = (0..252)
            .map(|i| if i % 3 == 0 { -0.004 } else { 0.003 })
            .collect();
        let m = PerformanceMetrics::compute(&r, 365, 0.02);
        assert!(m.is_finite());
        assert!(m.total_return > 0.0);
        assert!(m.sharpe_ratio > 0.0);
        assert!(m.max_drawdown < 0.0);
        assert!((m.win_rate - 168.0 / 252.0).abs() < 1e-12);
    }

    // ── Helpers ──

    #[test]
    fn percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(percentile_sorted(&sorted, 100.0), 4.0);
        assert!((percentile_sorted(&sorted, 25.0) - 1.75).abs() < 1e-12);
        assert!((percentile_sorted(&sorted, 50.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn population_std_matches_definition() {
        assert!((population_std_dev(&[1.0, 3.0]) - 1.0).abs() < 1e-12);
        assert_eq!(population_std_dev(&[]), 0.0);
    }

    #[test]
    fn covariance_of_series_with_itself_is_variance() {
        let r = [0.01, -0.02, 0.03, 0.0];
        assert!((covariance(&r, &r) - std_dev(&r).powi(2)).abs() < 1e-15);
        assert_eq!(covariance(&[0.1], &[0.2]), 0.0);
    }

    // ── Rolling Sharpe ──

    #[test]
    fn rolling_sharpe_has_one_value_per_complete_window() {
        let r: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 0.01 } else { -0.005 }).collect();
        let rolling = rolling_sharpe(&r, DEFAULT_ROLLING_WINDOW, 0.02);
        assert_eq!(rolling.len(), 100 - 63 + 1);
        assert!((rolling[0] - sharpe_ratio(&r[..63], 0.02)).abs() < 1e-12);
        assert!((rolling[37] - sharpe_ratio(&r[37..], 0.02)).abs() < 1e-12);
    }

    #[test]
    fn rolling_sharpe_degenerate_windows() {
        let r = [0.01, 0.02, -0.01];
        assert!(rolling_sharpe(&r, 0, 0.02).is_empty());
        assert!(rolling_sharpe(&r, 4, 0.02).is_empty());
        assert_eq!(rolling_sharpe(&[0.001; 10], 5, 0.02), vec![0.0; 6]);
    }

    #[test]
    fn rolling_summary_tracks_regime_change() {
        // A calm rising first half and a falling second half.
        let mut r: Vec<f64> = (0..63).map(|i| if i % 2 == 0 { 0.004 } else { 0.001 }).collect();
        r.extend((0..63).map(|i| if i % 2 == 0 { -0.004 } else { -0.001 }));
        let summary = RollingSharpeSummary::compute(&r, 63, 0.0).unwrap();
        assert_eq!(summary.count, 64);
        assert!(summary.max > 0.0);
        assert!(summary.min < 0.0);
        assert!(summary.positive_pct > 0.0 && summary.positive_pct < 100.0);
        assert!(RollingSharpeSummary::compute(&r[..10], 63, 0.0).is_none());
    }
}

//! Walk-forward validation: rolling train/test windows over calendar time.
//!
//! Starting `total_history_days` before the anchor, each window trains (selects)
//! on `[train_start, train_start + train_days]` and backtests the selected
//! portfolio out of sample on the adjacent `[train_end, train_end + test_days]`.
//! The train start then advances by `step_days`. Scheduling stops at the first
//! window whose test end would pass the anchor.
//!
//! Window count = floor((H − train − test) / step) + 1 when non-negative, else 0.

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use robustlab_core::{DateWindow, Portfolio, PriceProvider, Strategy, StrategyParams};

use crate::backtest::{BacktestResult, BacktestRunner};
use crate::config::{check_span, ConfigError};

// ─── Configuration ───────────────────────────────────────────────────

/// Configuration for walk-forward scheduling (calendar days).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    /// Selection window length (default 730).
    pub train_days: u32,
    /// Out-of-sample test window length (default 180).
    pub test_days: u32,
    /// Advance between consecutive windows (default 90).
    pub step_days: u32,
    /// History covered, ending at the anchor (default 1825).
    pub total_history_days: u32,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            train_days: 730,
            test_days: 180,
            step_days: 90,
            total_history_days: 1825,
        }
    }
}

impl WalkForwardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.train_days == 0 {
            return Err(ConfigError::ZeroDays {
                field: "walk_forward.train_days",
            });
        }
        if self.test_days == 0 {
            return Err(ConfigError::ZeroDays {
                field: "walk_forward.test_days",
            });
        }
        if self.step_days == 0 {
            return Err(ConfigError::ZeroDays {
                field: "walk_forward.step_days",
            });
        }
        check_span("walk_forward.train_days", self.train_days)?;
        check_span("walk_forward.test_days", self.test_days)?;
        check_span("walk_forward.step_days", self.step_days)?;
        check_span("walk_forward.total_history_days", self.total_history_days)?;
        Ok(())
    }

    /// Number of windows the schedule produces.
    pub fn window_count(&self) -> usize {
        let slack = i64::from(self.total_history_days)
            - i64::from(self.train_days)
            - i64::from(self.test_days);
        if slack < 0 || self.step_days == 0 {
            return 0;
        }
        (slack / i64::from(self.step_days)) as usize + 1
    }
}

// ─── Window schedule ─────────────────────────────────────────────────

/// One scheduled (train, test) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkForwardWindow {
    /// 1-based position in the schedule.
    pub index: usize,
    pub train: DateWindow,
    pub test: DateWindow,
}

impl WalkForwardWindow {
    pub fn label(&self) -> String {
        format!("WF_Window_{}", self.index)
    }
}

/// Build the window schedule ending at `as_of`.
///
/// Returns an empty schedule for a zero step rather than looping forever, and
/// when the history reaches past the representable calendar.
pub fn plan_windows(config: &WalkForwardConfig, as_of: NaiveDate) -> Vec<WalkForwardWindow> {
    if config.step_days == 0 {
        return Vec::new();
    }
    let train = Duration::days(i64::from(config.train_days));
    let test = Duration::days(i64::from(config.test_days));
    let step = Duration::days(i64::from(config.step_days));

    let mut windows = Vec::with_capacity(config.window_count());
    let Some(mut train_start) =
        as_of.checked_sub_signed(Duration::days(i64::from(config.total_history_days)))
    else {
        return windows;
    };
    loop {
        let Some(train_end) = train_start.checked_add_signed(train) else {
            break;
        };
        let Some(test_end) = train_end.checked_add_signed(test) else {
            break;
        };
        if test_end > as_of {
            break;
        }
        windows.push(WalkForwardWindow {
            index: windows.len() + 1,
            train: DateWindow::new(train_start, train_end),
            test: DateWindow::new(train_end, test_end),
        });
        match train_start.checked_add_signed(step) {
            Some(next) => train_start = next,
            None => break,
        }
    }
    windows
}

// ─── Execution ───────────────────────────────────────────────────────

/// Run the walk-forward schedule, returning results in window order.
///
/// Windows are independent and evaluated in parallel. A strategy error
/// degrades to an empty portfolio; the schedule is never aborted.
pub fn run_walk_forward<S, P>(
    strategy: &S,
    runner: &BacktestRunner<P>,
    config: &WalkForwardConfig,
    as_of: NaiveDate,
) -> Vec<BacktestResult>
where
    S: Strategy + ?Sized,
    P: PriceProvider,
{
    let windows = plan_windows(config, as_of);
    info!(windows = windows.len(), %as_of, "walk-forward test");
    if windows.is_empty() {
        warn!(
            total_history_days = config.total_history_days,
            "history too short for a single walk-forward window"
        );
    }

    let params = StrategyParams::new();
    windows
        .par_iter()
        .map(|w| {
            let label = w.label();
            debug!(window = label.as_str(), train = %w.train, test = %w.test, "walk-forward window");
            let portfolio = strategy.select(w.train, &params).unwrap_or_else(|e| {
                warn!(window = label.as_str(), error = %e, "strategy failed, using empty portfolio");
                Portfolio::empty()
            });
            runner.run(&portfolio, w.test, &label)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn config(train: u32, test: u32, step: u32, history: u32) -> WalkForwardConfig {
        WalkForwardConfig {
            train_days: train,
            test_days: test,
            step_days: step,
            total_history_days: history,
        }
    }

    #[test]
    fn four_windows_for_two_years() {
        let c = config(365, 90, 90, 730);
        let windows = plan_windows(&c, as_of());
        assert_eq!(windows.len(), 4);
        assert_eq!(c.window_count(), 4);
    }

    #[test]
    fn test_starts_where_train_ends() {
        let windows = plan_windows(&WalkForwardConfig::default(), as_of());
        assert!(!windows.is_empty());
        for w in &windows {
            assert_eq!(w.test.start, w.train.end);
            assert!(w.test.end <= as_of());
        }
    }

    #[test]
    fn train_start_advances_by_step() {
        let windows = plan_windows(&WalkForwardConfig::default(), as_of());
        for pair in windows.windows(2) {
            assert_eq!((pair[1].train.start - pair[0].train.start).num_days(), 90);
            assert_eq!(pair[1].index, pair[0].index + 1);
        }
        assert_eq!(windows[0].index, 1);
        assert_eq!(windows[0].label(), "WF_Window_1");
    }

    #[test]
    fn first_window_starts_at_history_start() {
        let windows = plan_windows(&WalkForwardConfig::default(), as_of());
        assert_eq!(windows[0].train.start, as_of() - Duration::days(1825));
    }

    #[test]
    fn short_history_yields_no_windows() {
        let c = config(730, 180, 90, 365);
        assert!(plan_windows(&c, as_of()).is_empty());
        assert_eq!(c.window_count(), 0);
    }

    #[test]
    fn exact_fit_yields_one_window() {
        let c = config(300, 65, 30, 365);
        let windows = plan_windows(&c, as_of());
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].test.end, as_of());
    }

    #[test]
    fn count_matches_formula_for_defaults() {
        let c = WalkForwardConfig::default();
        // floor((1825 - 730 - 180) / 90) + 1 = 11
        assert_eq!(c.window_count(), 11);
        assert_eq!(plan_windows(&c, as_of()).len(), 11);
    }

    #[test]
    fn zero_durations_are_config_errors() {
        for c in [config(0, 90, 90, 730), config(365, 0, 90, 730), config(365, 90, 0, 730)] {
            assert!(matches!(c.validate(), Err(ConfigError::ZeroDays { .. })));
        }
        assert!(plan_windows(&config(365, 90, 0, 730), as_of()).is_empty());
    }

    #[test]
    fn history_past_the_calendar_yields_no_windows() {
        let c = config(365, 90, 90, u32::MAX);
        assert!(matches!(c.validate(), Err(ConfigError::SpanTooLong { .. })));
        assert!(plan_windows(&c, as_of()).is_empty());
    }
}

//! Walk-forward scheduling and execution against a provider.

use chrono::{Duration, NaiveDate};

use robustlab_core::data::synthetic::ConstantReturnProvider;
use robustlab_core::strategy::FnStrategy;
use robustlab_core::{DateWindow, Portfolio, StrategyError, StrategyParams};

use robustlab_runner::walk_forward::{plan_windows, run_walk_forward, WalkForwardConfig};
use robustlab_runner::{BacktestFailure, BacktestRunner, BacktestSettings};

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
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
fn schedule_matches_count_formula() {
    for (train, test, step, history) in [
        (365, 90, 90, 730),
        (730, 180, 90, 1825),
        (100, 20, 7, 400),
        (30, 30, 30, 59),
        (30, 30, 30, 60),
    ] {
        let c = config(train, test, step, history);
        let slack = history as i64 - train as i64 - test as i64;
        let expected = if slack < 0 { 0 } else { (slack / step as i64) as usize + 1 };
        assert_eq!(plan_windows(&c, as_of()).len(), expected, "{c:?}");
        assert_eq!(c.window_count(), expected);
    }
}

#[test]
fn windows_are_adjacent_and_never_pass_the_anchor() {
    let windows = plan_windows(&config(365, 90, 90, 730), as_of());
    assert_eq!(windows.len(), 4);
    for w in &windows {
        assert_eq!(w.test.start, w.train.end);
        assert_eq!(w.train.calendar_days(), 365);
        assert_eq!(w.test.calendar_days(), 90);
        assert!(w.test.end <= as_of());
    }
    let last = windows.last().unwrap();
    assert!(last.test.end + Duration::days(90) > as_of());
}

#[test]
fn strategy_sees_train_window_and_backtest_uses_test_window() {
    let c = config(365, 90, 90, 730);
    let strategy = FnStrategy::new("train-window-check", |w: DateWindow, _p: &StrategyParams| {
        assert_eq!(w.calendar_days(), 365);
        Ok(Portfolio::from_weights([("A", 1.0)])?)
    });
    let runner = BacktestRunner::new(ConstantReturnProvider::new(0.0004), BacktestSettings::default());
    let results = run_walk_forward(&strategy, &runner, &c, as_of());
    let windows = plan_windows(&c, as_of());

    assert_eq!(results.len(), windows.len());
    for (r, w) in results.iter().zip(&windows) {
        assert_eq!(r.period, w.label());
        assert_eq!(r.start_date, w.test.start);
        assert_eq!(r.end_date, w.test.end);
        assert!(r.success);
    }
}

#[test]
fn failing_strategy_never_aborts_the_schedule() {
    let c = config(365, 90, 90, 730);
    let windows = plan_windows(&c, as_of());
    let failing_start = windows[1].train.start;
    let strategy = FnStrategy::new("flaky", move |w: DateWindow, _p: &StrategyParams| {
        if w.start == failing_start {
            Err(StrategyError::Failed("no signal".into()))
        } else {
            Ok(Portfolio::from_weights([("A", 1.0)])?)
        }
    });
    let runner = BacktestRunner::new(ConstantReturnProvider::new(0.0004), BacktestSettings::default());
    let results = run_walk_forward(&strategy, &runner, &c, as_of());

    assert_eq!(results.len(), 4);
    assert!(results.iter().any(|r| !r.success));
    assert!(results.iter().any(|r| r.success));
    assert!(!results[1].success);
    assert_eq!(results[1].failure, Some(BacktestFailure::EmptyPortfolio));
    assert_eq!(results[1].period, "WF_Window_2");
    for i in [0, 2, 3] {
        assert!(results[i].success, "window {} should succeed", i + 1);
    }
}

#[test]
fn too_short_history_runs_nothing() {
    let strategy = FnStrategy::new("unused", |_w, _p: &StrategyParams| {
        Ok(Portfolio::from_weights([("A", 1.0)])?)
    });
    let runner = BacktestRunner::new(ConstantReturnProvider::new(0.0004), BacktestSettings::default());
    let results = run_walk_forward(&strategy, &runner, &config(730, 180, 90, 800), as_of());
    assert!(results.is_empty());
}

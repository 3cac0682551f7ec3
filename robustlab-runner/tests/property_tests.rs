//! Property tests for metric and sampling invariants.
//!
//! Uses proptest to verify:
//! 1. Drawdown bounds: max drawdown lies in [-1, 0] for any return sequence
//! 2. Win-rate bounds: win rate lies in [0, 1]
//! 3. Zero variance: Sharpe of a constant series is exactly 0.0
//! 4. Integer draws: integer ranges stay inclusive of both bounds
//! 5. Score bounds: the composite score stays in [0, 100]

use std::collections::BTreeMap;

use chrono::NaiveDate;
use proptest::prelude::*;

use robustlab_core::{ParamValue, RngHierarchy, StrategyParams};
use robustlab_runner::metrics::{max_drawdown, sharpe_ratio, win_rate, PerformanceMetrics};
use robustlab_runner::monte_carlo::{McSample, McSummary, MonteCarloResult, ParamRange};
use robustlab_runner::report::build_report;
use robustlab_runner::{BacktestResult, Recommendation};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_returns() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.99..1.0_f64, 0..300)
}

fn arb_sharpes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-12.0..12.0_f64, 0..20)
}

fn result(i: usize, sharpe: f64) -> BacktestResult {
    let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    BacktestResult {
        period: format!("p{i}"),
        start_date: d,
        end_date: d,
        success: true,
        failure: None,
        metrics: PerformanceMetrics {
            sharpe_ratio: sharpe,
            ..PerformanceMetrics::failed()
        },
        num_trades: 1,
        stocks_selected: vec!["A".into()],
        weights_used: BTreeMap::new(),
        num_periods: 1,
        rolling_sharpe: None,
        benchmark: None,
    }
}

// ── 1–3. Metric bounds ───────────────────────────────────────────────

proptest! {
    #[test]
    fn drawdown_is_bounded(returns in arb_returns()) {
        let dd = max_drawdown(&returns);
        prop_assert!(dd <= 0.0);
        prop_assert!(dd >= -1.0);
    }

    #[test]
    fn win_rate_is_a_fraction(returns in arb_returns()) {
        let w = win_rate(&returns);
        prop_assert!((0.0..=1.0).contains(&w));
    }

    #[test]
    fn constant_series_has_zero_sharpe(r in -0.05..0.05_f64, n in 2usize..500, rf in 0.0..0.1_f64) {
        let returns = vec![r; n];
        prop_assert_eq!(sharpe_ratio(&returns, rf), 0.0);
    }

    #[test]
    fn computed_metrics_are_finite(returns in arb_returns(), days in 1i64..4000) {
        // A window spans at least one calendar day per observation.
        let days = days.max(returns.len() as i64);
        let m = PerformanceMetrics::compute(&returns, days, 0.02);
        prop_assert!(m.is_finite());
        prop_assert!(m.max_drawdown <= 0.0);
    }
}

// ── 4. Integer draws ─────────────────────────────────────────────────

#[test]
fn integer_draws_cover_both_bounds_inclusively() {
    let range = ParamRange(ParamValue::Int(8), ParamValue::Int(12));
    let mut rng = RngHierarchy::new(2024).rng_for("monte_carlo", 0);
    let mut seen = [false; 5];
    for _ in 0..10_000 {
        let v = range.sample(&mut rng);
        assert_integer(v);
        let i = v.as_i64();
        assert!((8..=12).contains(&i), "draw {i} out of range");
        seen[(i - 8) as usize] = true;
    }
    assert!(seen[0], "lower bound never drawn");
    assert!(seen[4], "upper bound never drawn");
}

fn assert_integer(v: ParamValue) {
    assert!(v.is_int(), "expected an integer draw, got {v:?}");
}

proptest! {
    #[test]
    fn integer_draws_stay_in_range(lo in -50i64..50, span in 0i64..20, seed in any::<u64>()) {
        let range = ParamRange(ParamValue::Int(lo), ParamValue::Int(lo + span));
        let mut rng = RngHierarchy::new(seed).rng_for("monte_carlo", 0);
        for _ in 0..50 {
            let v = range.sample(&mut rng).as_i64();
            prop_assert!(v >= lo && v <= lo + span);
        }
    }
}

// ── 5. Score bounds ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn score_is_bounded_and_tier_consistent(
        mt in arb_sharpes(),
        wf in arb_sharpes(),
        mc in arb_sharpes(),
    ) {
        let mt_results: BTreeMap<String, BacktestResult> = mt
            .iter()
            .enumerate()
            .map(|(i, &s)| (format!("tf{i}"), result(i, s)))
            .collect();
        let wf_results: Vec<BacktestResult> =
            wf.iter().enumerate().map(|(i, &s)| result(i, s)).collect();
        let samples: Vec<McSample> = mc
            .iter()
            .enumerate()
            .map(|(i, &s)| McSample {
                index: i + 1,
                params: StrategyParams::new(),
                sharpe: s,
                total_return: s,
                max_drawdown: 0.0,
                success: true,
            })
            .collect();
        let mc_result = MonteCarloResult {
            attempted: samples.len(),
            skipped: 0,
            summary: McSummary::from_samples(&samples),
            samples,
        };

        let report = build_report(
            "prop".into(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            mt_results,
            wf_results,
            mc_result,
        );
        prop_assert!((0.0..=100.0).contains(&report.robustness_score));
        prop_assert_eq!(
            report.recommendation,
            Recommendation::from_score(report.robustness_score)
        );
        prop_assert_eq!(report.monte_carlo_results.summary.is_none(), mc.is_empty());
    }
}

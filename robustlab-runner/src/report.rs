//! Report aggregation: sub-scores, composite robustness score, tier, warnings.
//!
//! Scoring:
//! - each tester dimension scores `positive_sharpe_pct * 0.5`
//! - Sharpe quality scores `mean(MT and WF Sharpes) * 50`, clamped to [0, 50]
//! - composite = 0.25·MT + 0.35·WF + 0.25·MC + 0.15·Sharpe quality
//!
//! A dimension with no samples scores zero and adds an "insufficient data"
//! warning instead of dividing by zero.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::backtest::BacktestResult;
use crate::config::RunId;
use crate::monte_carlo::MonteCarloResult;

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

pub const MULTI_TIMEFRAME_WEIGHT: f64 = 0.25;
pub const WALK_FORWARD_WEIGHT: f64 = 0.35;
pub const MONTE_CARLO_WEIGHT: f64 = 0.25;
pub const SHARPE_QUALITY_WEIGHT: f64 = 0.15;

/// Cap on the Sharpe-quality component (reached at a mean Sharpe of 1.0).
pub const SHARPE_QUALITY_CAP: f64 = 50.0;

const MT_WARN_BELOW_PCT: f64 = 60.0;
const WF_WARN_BELOW_PCT: f64 = 50.0;
const MC_WARN_BELOW_PCT: f64 = 70.0;

// ─── Recommendation ──────────────────────────────────────────────────

/// Discrete verdict. Ordered `Fail < Weak < Moderate < Strong`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Fail,
    Weak,
    Moderate,
    Strong,
}

impl Recommendation {
    /// Tier for a composite score: `[70, ∞)` strong, `[50, 70)` moderate,
    /// `[30, 50)` weak, below 30 fail.
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            Self::Strong
        } else if score >= 50.0 {
            Self::Moderate
        } else if score >= 30.0 {
            Self::Weak
        } else {
            Self::Fail
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Fail => "FAIL",
            Self::Weak => "WEAK",
            Self::Moderate => "MODERATE",
            Self::Strong => "STRONG",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Fail => "FAIL - Strategy is not viable, reconsider approach",
            Self::Weak => "WEAK - Strategy needs significant improvement",
            Self::Moderate => "MODERATE - Strategy shows promise but needs refinement",
            Self::Strong => "STRONG - Strategy is robust and ready for live trading",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ─── Sub-scores ──────────────────────────────────────────────────────

/// Score of one tester dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    /// Samples the dimension was scored on.
    pub samples: usize,
    /// Percent (0–100) of samples with positive Sharpe. `None` without samples.
    pub positive_pct: Option<f64>,
    /// `positive_pct * 0.5`, or 0 without samples.
    pub score: f64,
}

impl DimensionScore {
    fn from_sharpes(sharpes: &[f64]) -> Self {
        let positive_pct = positive_pct(sharpes);
        Self {
            samples: sharpes.len(),
            positive_pct,
            score: positive_pct.map_or(0.0, |p| p * 0.5),
        }
    }
}

/// Per-dimension breakdown of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub multi_timeframe: DimensionScore,
    pub walk_forward: DimensionScore,
    pub monte_carlo: DimensionScore,
    /// Mean Sharpe across multi-timeframe and walk-forward results.
    pub mean_sharpe: f64,
    /// `mean_sharpe * 50`, clamped to [0, 50].
    pub sharpe_quality: f64,
}

impl SubScores {
    /// Weighted composite in [0, 100].
    pub fn composite(&self) -> f64 {
        self.multi_timeframe.score * MULTI_TIMEFRAME_WEIGHT
            + self.walk_forward.score * WALK_FORWARD_WEIGHT
            + self.monte_carlo.score * MONTE_CARLO_WEIGHT
            + self.sharpe_quality * SHARPE_QUALITY_WEIGHT
    }
}

fn positive_pct(sharpes: &[f64]) -> Option<f64> {
    if sharpes.is_empty() {
        return None;
    }
    let positive = sharpes.iter().filter(|&&s| s > 0.0).count();
    Some(positive as f64 / sharpes.len() as f64 * 100.0)
}

// ─── Report ──────────────────────────────────────────────────────────

/// Immutable outcome of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub schema_version: u32,
    pub run_id: RunId,
    /// Anchor date every window was measured from.
    pub as_of: NaiveDate,
    pub multi_timeframe_results: BTreeMap<String, BacktestResult>,
    pub walk_forward_results: Vec<BacktestResult>,
    pub monte_carlo_results: MonteCarloResult,
    pub sub_scores: SubScores,
    pub robustness_score: f64,
    pub recommendation: Recommendation,
    pub warnings: Vec<String>,
}

/// Aggregate tester outputs into a report.
pub fn build_report(
    run_id: RunId,
    as_of: NaiveDate,
    multi_timeframe_results: BTreeMap<String, BacktestResult>,
    walk_forward_results: Vec<BacktestResult>,
    monte_carlo_results: MonteCarloResult,
) -> ValidationReport {
    let mt_sharpes: Vec<f64> = multi_timeframe_results
        .values()
        .map(BacktestResult::sharpe_ratio)
        .collect();
    let wf_sharpes: Vec<f64> = walk_forward_results
        .iter()
        .map(BacktestResult::sharpe_ratio)
        .collect();
    let mc_sharpes: Vec<f64> = monte_carlo_results
        .samples
        .iter()
        .map(|s| s.sharpe)
        .collect();

    let multi_timeframe = DimensionScore::from_sharpes(&mt_sharpes);
    let walk_forward = DimensionScore::from_sharpes(&wf_sharpes);
    let monte_carlo = DimensionScore::from_sharpes(&mc_sharpes);

    let combined: Vec<f64> = mt_sharpes.iter().chain(&wf_sharpes).copied().collect();
    let mean_sharpe = if combined.is_empty() {
        0.0
    } else {
        combined.iter().sum::<f64>() / combined.len() as f64
    };
    let sharpe_quality = (mean_sharpe * 50.0).clamp(0.0, SHARPE_QUALITY_CAP);

    let sub_scores = SubScores {
        multi_timeframe,
        walk_forward,
        monte_carlo,
        mean_sharpe,
        sharpe_quality,
    };

    let mut warnings = Vec::new();
    match multi_timeframe.positive_pct {
        Some(p) if p < MT_WARN_BELOW_PCT => {
            warnings.push(format!("Only {p:.0}% of timeframes are profitable"));
        }
        None => warnings.push("Multi-timeframe: insufficient data to score".to_string()),
        _ => {}
    }
    match walk_forward.positive_pct {
        Some(p) if p < WF_WARN_BELOW_PCT => {
            warnings.push(format!("Walk-forward: Only {p:.0}% of windows are profitable"));
        }
        None => warnings.push(
            "Walk-forward: insufficient data to score (no window fits the history)".to_string(),
        ),
        _ => {}
    }
    match monte_carlo.positive_pct {
        Some(p) if p < MC_WARN_BELOW_PCT => warnings.push(format!(
            "Monte Carlo: Only {p:.0}% of parameter combinations are profitable"
        )),
        None => warnings.push(
            "Monte Carlo: insufficient data to score (no simulation completed)".to_string(),
        ),
        _ => {}
    }

    let robustness_score = sub_scores.composite().clamp(0.0, 100.0);
    ValidationReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        as_of,
        multi_timeframe_results,
        walk_forward_results,
        monte_carlo_results,
        sub_scores,
        robustness_score,
        recommendation: Recommendation::from_score(robustness_score),
        warnings,
    }
}

//! Monte Carlo parameter sensitivity: random parameter draws, one backtest each.
//!
//! Each simulation draws every parameter uniformly from its configured range
//! (inclusive integer draw when both bounds are integers, continuous otherwise),
//! lets the strategy select over `[as_of − test_days, as_of]` with those
//! parameters, and backtests the same window.
//!
//! Simulation `i` draws from its own RNG derived from `(seed, "monte_carlo", i)`,
//! so results do not depend on thread scheduling.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use robustlab_core::{
    DateWindow, ParamValue, PriceProvider, RngHierarchy, Strategy, StrategyParams,
};

use crate::backtest::BacktestRunner;
use crate::config::{check_span, ConfigError};
use crate::metrics::{mean_f64, percentile_sorted, population_std_dev};

const RNG_STREAM: &str = "monte_carlo";

// ─── Configuration ───────────────────────────────────────────────────

/// Inclusive `[min, max]` range for one parameter. Serialized as `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange(pub ParamValue, pub ParamValue);

impl ParamRange {
    pub fn min(&self) -> ParamValue {
        self.0
    }

    pub fn max(&self) -> ParamValue {
        self.1
    }

    /// Both bounds are integers: draws are integers, inclusive of both ends.
    pub fn is_integer(&self) -> bool {
        self.0.is_int() && self.1.is_int()
    }

    pub fn is_continuous(&self) -> bool {
        !self.is_integer()
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let (min, max) = (self.0.as_f64(), self.1.as_f64());
        if !min.is_finite() || !max.is_finite() {
            return Err(ConfigError::NonFiniteRange {
                name: name.to_string(),
            });
        }
        if min > max {
            return Err(ConfigError::InvalidRange {
                name: name.to_string(),
                min,
                max,
            });
        }
        if self.is_continuous() && !(max - min).is_finite() {
            return Err(ConfigError::RangeTooWide {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Draw one value. The range must have passed validation.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ParamValue {
        if self.is_integer() {
            ParamValue::Int(rng.gen_range(self.0.as_i64()..=self.1.as_i64()))
        } else {
            let (min, max) = (self.0.as_f64(), self.1.as_f64());
            ParamValue::Float(rng.gen_range(min..=max))
        }
    }
}

/// Configuration for Monte Carlo parameter sensitivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Number of parameter draws (default 100).
    pub num_simulations: usize,
    /// Length of the selection/test window ending at the anchor (default 365).
    pub test_days: u32,
    /// Master seed for the per-simulation RNGs (default 42).
    pub seed: u64,
    pub parameter_ranges: BTreeMap<String, ParamRange>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        let mut parameter_ranges = BTreeMap::new();
        parameter_ranges.insert(
            "num_stocks".to_string(),
            ParamRange(ParamValue::Int(8), ParamValue::Int(12)),
        );
        parameter_ranges.insert(
            "min_momentum".to_string(),
            ParamRange(ParamValue::Float(0.0), ParamValue::Float(0.1)),
        );
        Self {
            num_simulations: 100,
            test_days: 365,
            seed: 42,
            parameter_ranges,
        }
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_simulations == 0 {
            return Err(ConfigError::ZeroSimulations);
        }
        if self.test_days == 0 {
            return Err(ConfigError::ZeroDays {
                field: "monte_carlo.test_days",
            });
        }
        check_span("monte_carlo.test_days", self.test_days)?;
        if self.parameter_ranges.is_empty() {
            return Err(ConfigError::EmptyParameterRanges);
        }
        for (name, range) in &self.parameter_ranges {
            range.validate(name)?;
        }
        Ok(())
    }
}

/// Draw one value for every parameter.
pub fn sample_params<R: Rng + ?Sized>(
    ranges: &BTreeMap<String, ParamRange>,
    rng: &mut R,
) -> StrategyParams {
    ranges
        .iter()
        .map(|(name, range)| (name.clone(), range.sample(rng)))
        .collect()
}

// ─── Result types ────────────────────────────────────────────────────

/// One completed simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McSample {
    /// 1-based simulation index.
    pub index: usize,
    pub params: StrategyParams,
    pub sharpe: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    /// Whether the backtest produced a return series.
    pub success: bool,
}

/// Distribution summary over successful simulations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McSummary {
    pub num_simulations: usize,
    /// Percent (0–100) of samples with positive total return.
    pub profitable_pct: f64,
    /// Percent (0–100) of samples with positive Sharpe.
    pub positive_sharpe_pct: f64,
    pub avg_sharpe: f64,
    pub median_sharpe: f64,
    pub std_sharpe: f64,
    pub min_sharpe: f64,
    pub max_sharpe: f64,
    pub avg_return: f64,
    pub std_return: f64,
    pub sharpe_25th_percentile: f64,
    pub sharpe_75th_percentile: f64,
}

impl McSummary {
    /// Summarise `samples`. `None` when there are none.
    pub fn from_samples(samples: &[McSample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let mut sharpes: Vec<f64> = samples.iter().map(|s| s.sharpe).collect();
        let returns: Vec<f64> = samples.iter().map(|s| s.total_return).collect();
        sharpes.sort_by(f64::total_cmp);

        Some(Self {
            num_simulations: samples.len(),
            profitable_pct: returns.iter().filter(|&&r| r > 0.0).count() as f64 / n * 100.0,
            positive_sharpe_pct: sharpes.iter().filter(|&&s| s > 0.0).count() as f64 / n * 100.0,
            avg_sharpe: mean_f64(&sharpes),
            median_sharpe: percentile_sorted(&sharpes, 50.0),
            std_sharpe: population_std_dev(&sharpes),
            min_sharpe: sharpes[0],
            max_sharpe: sharpes[sharpes.len() - 1],
            avg_return: mean_f64(&returns),
            std_return: population_std_dev(&returns),
            sharpe_25th_percentile: percentile_sorted(&sharpes, 25.0),
            sharpe_75th_percentile: percentile_sorted(&sharpes, 75.0),
        })
    }
}

/// Outcome of the Monte Carlo tester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    /// Simulations attempted.
    pub attempted: usize,
    /// Simulations skipped because the strategy errored.
    pub skipped: usize,
    /// Completed simulations in index order.
    pub samples: Vec<McSample>,
    /// Absent when no simulation completed.
    pub summary: Option<McSummary>,
}

// ─── Execution ───────────────────────────────────────────────────────

/// Run all simulations in parallel and summarise the completed ones.
pub fn run_monte_carlo<S, P>(
    strategy: &S,
    runner: &BacktestRunner<P>,
    config: &MonteCarloConfig,
    as_of: NaiveDate,
) -> MonteCarloResult
where
    S: Strategy + ?Sized,
    P: PriceProvider,
{
    let window = DateWindow::ending_at(as_of, config.test_days);
    let rngs = RngHierarchy::new(config.seed);
    info!(
        simulations = config.num_simulations,
        %window,
        seed = config.seed,
        "monte carlo sensitivity test"
    );

    let outcomes: Vec<Option<McSample>> = (0..config.num_simulations)
        .into_par_iter()
        .map(|i| {
            let index = i + 1;
            let mut rng = rngs.rng_for(RNG_STREAM, i as u64);
            let params = sample_params(&config.parameter_ranges, &mut rng);
            let portfolio = match strategy.select(window, &params) {
                Ok(p) => p,
                Err(e) => {
                    warn!(simulation = index, %params, error = %e, "strategy failed, skipping simulation");
                    return None;
                }
            };
            let result = runner.run(&portfolio, window, &format!("MC_Sim_{index}"));
            debug!(simulation = index, %params, sharpe = result.metrics.sharpe_ratio, "simulation complete");
            Some(McSample {
                index,
                params,
                sharpe: result.metrics.sharpe_ratio,
                total_return: result.metrics.total_return,
                max_drawdown: result.metrics.max_drawdown,
                success: result.success,
            })
        })
        .collect();

    let samples: Vec<McSample> = outcomes.into_iter().flatten().collect();
    let skipped = config.num_simulations - samples.len();
    if skipped > 0 {
        warn!(skipped, attempted = config.num_simulations, "monte carlo simulations skipped");
    }
    MonteCarloResult {
        attempted: config.num_simulations,
        skipped,
        summary: McSummary::from_samples(&samples),
        samples,
    }
}

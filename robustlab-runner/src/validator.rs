//! Validator: orchestrates the three testers and the report aggregator.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use robustlab_core::{PriceProvider, Strategy};

use crate::backtest::{BacktestResult, BacktestRunner};
use crate::config::{ConfigError, ValidationConfig};
use crate::monte_carlo::{run_monte_carlo, MonteCarloResult};
use crate::report::{build_report, ValidationReport};
use crate::timeframe::run_multi_timeframe;
use crate::walk_forward::run_walk_forward;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// A strategy, a price provider, and a checked configuration.
///
/// Construction validates the configuration, so every run method is
/// infallible: bad strategies and missing data show up in the report.
pub struct Validator<S, P> {
    strategy: S,
    runner: BacktestRunner<P>,
    config: ValidationConfig,
}

impl<S, P> Validator<S, P>
where
    S: Strategy,
    P: PriceProvider,
{
    pub fn new(strategy: S, provider: P, config: ValidationConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        let runner = BacktestRunner::new(provider, config.backtest.clone());
        Ok(Self {
            strategy,
            runner,
            config,
        })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn runner(&self) -> &BacktestRunner<P> {
        &self.runner
    }

    pub fn run_multi_timeframe(&self, as_of: NaiveDate) -> BTreeMap<String, BacktestResult> {
        run_multi_timeframe(
            &self.strategy,
            &self.runner,
            &self.config.multi_timeframe,
            as_of,
        )
    }

    pub fn run_walk_forward(&self, as_of: NaiveDate) -> Vec<BacktestResult> {
        run_walk_forward(&self.strategy, &self.runner, &self.config.walk_forward, as_of)
    }

    pub fn run_monte_carlo(&self, as_of: NaiveDate) -> MonteCarloResult {
        run_monte_carlo(&self.strategy, &self.runner, &self.config.monte_carlo, as_of)
    }

    /// Full validation anchored at the configured date (or today).
    pub fn run(&self) -> ValidationReport {
        self.run_at(self.config.anchor())
    }

    /// Full validation anchored at `as_of`. The testers run concurrently.
    pub fn run_at(&self, as_of: NaiveDate) -> ValidationReport {
        let run_id = self.config.run_id();
        info!(
            strategy = self.strategy.name(),
            provider = self.runner.provider().name(),
            %as_of,
            run_id = &run_id[..12],
            "validation started"
        );

        let (multi_timeframe, (walk_forward, monte_carlo)) = rayon::join(
            || self.run_multi_timeframe(as_of),
            || {
                rayon::join(
                    || self.run_walk_forward(as_of),
                    || self.run_monte_carlo(as_of),
                )
            },
        );

        let report = build_report(run_id, as_of, multi_timeframe, walk_forward, monte_carlo);
        info!(
            score = report.robustness_score,
            recommendation = report.recommendation.label(),
            warnings = report.warnings.len(),
            "validation finished"
        );
        report
    }
}

//! RobustLab Runner: backtesting, robustness testers, scoring, export.
//!
//! This crate builds on `robustlab-core` to provide:
//! - Pure performance metrics over daily return series
//! - A fixed-weight portfolio backtest runner over any `PriceProvider`, with
//!   rolling Sharpe profiles and optional benchmark comparison
//! - Multi-timeframe, walk-forward, and Monte Carlo parameter-sensitivity testers
//! - Report aggregation into a 0–100 robustness score and recommendation tier
//! - TOML configuration, JSON/CSV export, and a plain-text summary

pub mod backtest;
pub mod benchmark;
pub mod config;
pub mod export;
pub mod metrics;
pub mod monte_carlo;
pub mod report;
pub mod timeframe;
pub mod validator;
pub mod walk_forward;

pub use backtest::{BacktestFailure, BacktestResult, BacktestRunner, BacktestSettings};
pub use config::{ConfigError, RunId, ValidationConfig};
pub use benchmark::BenchmarkComparison;
pub use metrics::{rolling_sharpe, PerformanceMetrics, RollingSharpeSummary};
pub use monte_carlo::{
    run_monte_carlo, sample_params, McSample, McSummary, MonteCarloConfig, MonteCarloResult,
    ParamRange,
};
pub use report::{build_report, Recommendation, SubScores, ValidationReport, SCHEMA_VERSION};
pub use timeframe::{run_multi_timeframe, MultiTimeframeConfig};
pub use validator::{ValidationError, Validator};
pub use walk_forward::{plan_windows, run_walk_forward, WalkForwardConfig, WalkForwardWindow};

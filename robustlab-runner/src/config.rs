//! Serializable validation configuration.
//!
//! One `ValidationConfig` drives a whole run: backtest settings plus one
//! section per tester. Every section has defaults, so an empty TOML document
//! is a valid configuration.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backtest::BacktestSettings;
use crate::monte_carlo::MonteCarloConfig;
use crate::timeframe::MultiTimeframeConfig;
use crate::walk_forward::WalkForwardConfig;

/// Content-addressable identifier of a configuration (BLAKE3 hex).
pub type RunId = String;

/// Longest accepted calendar span for any day-count field (about a century).
pub const MAX_SPAN_DAYS: u32 = 36_600;

/// Invalid configuration, reported before any sample work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("at least one timeframe is required")]
    EmptyTimeframes,

    #[error("timeframe '{label}' has a zero-day lookback")]
    ZeroLookback { label: String },

    #[error("{field} must be greater than zero")]
    ZeroDays { field: &'static str },

    #[error("monte_carlo.num_simulations must be greater than zero")]
    ZeroSimulations,

    #[error("monte_carlo.parameter_ranges must name at least one parameter")]
    EmptyParameterRanges,

    #[error("parameter range '{name}' is invalid: min {min} > max {max}")]
    InvalidRange { name: String, min: f64, max: f64 },

    #[error("parameter range '{name}' has a non-finite bound")]
    NonFiniteRange { name: String },

    #[error("parameter range '{name}' is too wide to sample (max - min overflows)")]
    RangeTooWide { name: String },

    #[error("{field} = {days} exceeds the maximum span of {} days", MAX_SPAN_DAYS)]
    SpanTooLong { field: String, days: u32 },

    #[error("backtest.rolling_window must be greater than zero")]
    ZeroRollingWindow,

    #[error("backtest.benchmark must not be blank")]
    BlankBenchmark,

    #[error("backtest.coverage_threshold must be in (0, 1], got {0}")]
    CoverageOutOfRange(f64),

    #[error("backtest.risk_free_rate must be finite, got {0}")]
    InvalidRiskFreeRate(f64),
}

/// Complete configuration of a validation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Anchor date ("now") for every window. `None` means today.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    pub backtest: BacktestSettings,
    pub multi_timeframe: MultiTimeframeConfig,
    pub walk_forward: WalkForwardConfig,
    pub monte_carlo: MonteCarloConfig,
}

/// Reject a day count too long to subtract from any anchor date.
pub(crate) fn check_span(field: impl Into<String>, days: u32) -> Result<(), ConfigError> {
    if days > MAX_SPAN_DAYS {
        return Err(ConfigError::SpanTooLong {
            field: field.into(),
            days,
        });
    }
    Ok(())
}

impl ValidationConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check every section, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = self.backtest.coverage_threshold;
        if !(c > 0.0 && c <= 1.0) {
            return Err(ConfigError::CoverageOutOfRange(c));
        }
        if !self.backtest.risk_free_rate.is_finite() {
            return Err(ConfigError::InvalidRiskFreeRate(self.backtest.risk_free_rate));
        }
        if self.backtest.rolling_window == 0 {
            return Err(ConfigError::ZeroRollingWindow);
        }
        if matches!(&self.backtest.benchmark, Some(b) if b.trim().is_empty()) {
            return Err(ConfigError::BlankBenchmark);
        }
        self.multi_timeframe.validate()?;
        self.walk_forward.validate()?;
        self.monte_carlo.validate()?;
        Ok(())
    }

    /// The anchor date: `as_of` when set, otherwise today's local date.
    pub fn anchor(&self) -> NaiveDate {
        self.as_of
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Deterministic hash of the configuration.
    ///
    /// Two runs with identical configurations share a RunId.
    pub fn run_id(&self) -> RunId {
        // Serializing plain data with string keys cannot fail; fall back to
        // the debug form rather than panic.
        let json = serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"));
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

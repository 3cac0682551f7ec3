//! Multi-timeframe consistency: one in-sample backtest per named lookback.
//!
//! For each `(label, lookback_days)` the strategy selects on
//! `[as_of − lookback, as_of]` and the same window is backtested. Timeframes are
//! evaluated in parallel; the output map is keyed by label so evaluation order
//! never shows up in the result.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use robustlab_core::{DateWindow, Portfolio, PriceProvider, Strategy, StrategyParams};

use crate::backtest::{BacktestResult, BacktestRunner};
use crate::config::{check_span, ConfigError};

// ─── Configuration ───────────────────────────────────────────────────

/// Named lookback windows, in calendar days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiTimeframeConfig {
    pub timeframes: BTreeMap<String, u32>,
}

impl Default for MultiTimeframeConfig {
    fn default() -> Self {
        let timeframes = [
            ("6mo", 180),
            ("1yr", 365),
            ("2yr", 730),
            ("5yr", 1825),
            ("10yr", 3650),
        ]
        .into_iter()
        .map(|(label, days)| (label.to_string(), days))
        .collect();
        Self { timeframes }
    }
}

impl MultiTimeframeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeframes.is_empty() {
            return Err(ConfigError::EmptyTimeframes);
        }
        if let Some((label, _)) = self.timeframes.iter().find(|(_, &days)| days == 0) {
            return Err(ConfigError::ZeroLookback {
                label: label.clone(),
            });
        }
        for (label, &days) in &self.timeframes {
            check_span(format!("multi_timeframe.timeframes.{label}"), days)?;
        }
        Ok(())
    }

    /// The window each timeframe tests, keyed by label.
    pub fn windows(&self, as_of: NaiveDate) -> BTreeMap<String, DateWindow> {
        self.timeframes
            .iter()
            .map(|(label, &days)| (label.clone(), DateWindow::ending_at(as_of, days)))
            .collect()
    }
}

// ─── Execution ───────────────────────────────────────────────────────

/// Run every timeframe and collect results keyed by label.
///
/// A strategy error degrades to an empty portfolio, which backtests as a
/// failure sample.
pub fn run_multi_timeframe<S, P>(
    strategy: &S,
    runner: &BacktestRunner<P>,
    config: &MultiTimeframeConfig,
    as_of: NaiveDate,
) -> BTreeMap<String, BacktestResult>
where
    S: Strategy + ?Sized,
    P: PriceProvider,
{
    info!(timeframes = config.timeframes.len(), %as_of, "multi-timeframe test");
    let params = StrategyParams::new();
    let windows: Vec<(String, DateWindow)> = config.windows(as_of).into_iter().collect();

    windows
        .into_par_iter()
        .map(|(label, window)| {
            let portfolio = strategy.select(window, &params).unwrap_or_else(|e| {
                warn!(timeframe = label.as_str(), error = %e, "strategy failed, using empty portfolio");
                Portfolio::empty()
            });
            let result = runner.run(&portfolio, window, &label);
            (label, result)
        })
        .collect()
}

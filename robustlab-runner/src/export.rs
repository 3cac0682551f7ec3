//! Reporting and export: JSON, CSV, and plain-text summaries.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: one row per backtest result for external analysis tools
//! - **Text**: the human-readable summary printed by the CLI
//!
//! Persisted reports carry a `schema_version`. Newer versions are rejected on load.

use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::backtest::BacktestResult;
use crate::report::{ValidationReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `ValidationReport` to pretty JSON.
pub fn export_json(report: &ValidationReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize ValidationReport to JSON")
}

/// Deserialize a `ValidationReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ValidationReport> {
    let report: ValidationReport =
        serde_json::from_str(json).context("failed to deserialize ValidationReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

/// Write a report to `path` as pretty JSON, creating parent directories.
pub fn save_report(report: &ValidationReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = export_json(report)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Read a report previously written by [`save_report`].
pub fn load_report(path: &Path) -> Result<ValidationReport> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json).with_context(|| format!("invalid report {}", path.display()))
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export every backtest result as CSV: multi-timeframe rows, then walk-forward rows.
///
/// Columns: test, period, start_date, end_date, success, total_return,
/// annual_return, volatility, sharpe_ratio, max_drawdown, win_rate, num_trades,
/// stocks_selected, rolling_sharpe_min, benchmark_alpha, benchmark_beta.
/// The last three are empty when not computed.
pub fn export_results_csv(report: &ValidationReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "test",
        "period",
        "start_date",
        "end_date",
        "success",
        "total_return",
        "annual_return",
        "volatility",
        "sharpe_ratio",
        "max_drawdown",
        "win_rate",
        "num_trades",
        "stocks_selected",
        "rolling_sharpe_min",
        "benchmark_alpha",
        "benchmark_beta",
    ])?;

    let rows = report
        .multi_timeframe_results
        .values()
        .map(|r| ("multi_timeframe", r))
        .chain(report.walk_forward_results.iter().map(|r| ("walk_forward", r)));
    for (test, r) in rows {
        let m = &r.metrics;
        wtr.write_record(&[
            test.to_string(),
            r.period.clone(),
            r.start_date.to_string(),
            r.end_date.to_string(),
            r.success.to_string(),
            format!("{:.6}", m.total_return),
            format!("{:.6}", m.annual_return),
            format!("{:.6}", m.volatility),
            format!("{:.6}", m.sharpe_ratio),
            format!("{:.6}", m.max_drawdown),
            format!("{:.6}", m.win_rate),
            r.num_trades.to_string(),
            r.stocks_selected.join(";"),
            optional(r.rolling_sharpe.map(|s| s.min)),
            optional(r.benchmark.as_ref().map(|b| b.alpha)),
            optional(r.benchmark.as_ref().map(|b| b.beta)),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

// ─── Text summary ───────────────────────────────────────────────────

/// Plain-text rendering of a report, printed by the CLI.
pub struct Summary<'a>(pub &'a ValidationReport);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_summary(f, self.0)
    }
}

/// Render the plain-text report.
pub fn render_summary(report: &ValidationReport) -> String {
    Summary(report).to_string()
}

fn write_result_row<W: fmt::Write>(
    out: &mut W,
    r: &BacktestResult,
    with_drawdown: bool,
) -> fmt::Result {
    let m = &r.metrics;
    write!(
        out,
        "{:<15} | Sharpe: {:6.2} | Return: {:6.1}%",
        r.period,
        m.sharpe_ratio,
        m.total_return * 100.0
    )?;
    if with_drawdown {
        write!(out, " | MaxDD: {:6.1}%", m.max_drawdown * 100.0)?;
    }
    if let Some(b) = &r.benchmark {
        write!(out, " | vs {}: {:+6.1}%", b.symbol, b.outperformance)?;
    }
    if let Some(reason) = r.failure {
        write!(out, " | FAILED ({reason})")?;
    }
    writeln!(out)
}

/// Write the full plain-text report into `out`.
pub fn write_summary<W: fmt::Write>(out: &mut W, report: &ValidationReport) -> fmt::Result {
    let rule = "=".repeat(70);
    let thin = "-".repeat(70);

    writeln!(out, "{rule}")?;
    writeln!(out, "PORTFOLIO STRATEGY VALIDATION REPORT")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "As of:            {}", report.as_of)?;
    writeln!(out, "Run:              {}", report.run_id)?;
    writeln!(out, "\nROBUSTNESS SCORE: {:.1}/100", report.robustness_score)?;
    writeln!(out, "RECOMMENDATION:   {}", report.recommendation.description())?;

    if !report.warnings.is_empty() {
        writeln!(out, "\nWARNINGS ({}):", report.warnings.len())?;
        for w in &report.warnings {
            writeln!(out, "   - {w}")?;
        }
    }

    let s = &report.sub_scores;
    writeln!(out, "\n{thin}\nSCORE BREAKDOWN\n{thin}")?;
    for (name, dim) in [
        ("Multi-timeframe", &s.multi_timeframe),
        ("Walk-forward", &s.walk_forward),
        ("Monte Carlo", &s.monte_carlo),
    ] {
        let pct = dim
            .positive_pct
            .map_or_else(|| "n/a".to_string(), |p| format!("{p:.0}%"));
        writeln!(
            out,
            "{name:<16} | positive: {pct:>5} of {:<4} | score: {:5.1}",
            dim.samples, dim.score
        )?;
    }
    writeln!(
        out,
        "{:<16} | mean Sharpe: {:6.2}     | score: {:5.1}",
        "Sharpe quality", s.mean_sharpe, s.sharpe_quality
    )?;

    writeln!(out, "\n{thin}\nMULTI-TIMEFRAME ANALYSIS\n{thin}")?;
    for r in report.multi_timeframe_results.values() {
        write_result_row(out, r, true)?;
    }

    writeln!(out, "\n{thin}\nWALK-FORWARD ANALYSIS\n{thin}")?;
    if report.walk_forward_results.is_empty() {
        writeln!(out, "(no windows)")?;
    }
    for r in &report.walk_forward_results {
        write_result_row(out, r, false)?;
    }
    if s.walk_forward.samples > 0 {
        let avg = report
            .walk_forward_results
            .iter()
            .map(BacktestResult::sharpe_ratio)
            .sum::<f64>()
            / s.walk_forward.samples as f64;
        writeln!(out, "\nAverage Walk-Forward Sharpe: {avg:.2}")?;
    }

    writeln!(out, "\n{thin}\nMONTE CARLO ANALYSIS\n{thin}")?;
    let mc = &report.monte_carlo_results;
    match &mc.summary {
        Some(sum) => {
            writeln!(out, "Simulations run:        {}", sum.num_simulations)?;
            if mc.skipped > 0 {
                writeln!(out, "Simulations skipped:    {}", mc.skipped)?;
            }
            writeln!(out, "Profitable:             {:.1}%", sum.profitable_pct)?;
            writeln!(out, "Positive Sharpe:        {:.1}%", sum.positive_sharpe_pct)?;
            writeln!(out, "Average Sharpe:         {:.2}", sum.avg_sharpe)?;
            writeln!(
                out,
                "Sharpe 25th-75th %ile:  {:.2} to {:.2}",
                sum.sharpe_25th_percentile, sum.sharpe_75th_percentile
            )?;
        }
        None => {
            writeln!(
                out,
                "No simulation completed ({} attempted, {} skipped)",
                mc.attempted, mc.skipped
            )?;
        }
    }

    writeln!(out, "\n{rule}")
}

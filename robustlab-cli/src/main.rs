//! RobustLab CLI: validate, plan, and show commands.
//!
//! Commands:
//! - `validate`: run the full robustness validation over a CSV price directory
//! - `plan`: print the windows a validation would test, without running it
//! - `show`: print the summary of a saved report

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use serde::Deserialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use robustlab_core::data::{CachedProvider, CsvDirProvider};
use robustlab_core::strategy::{FixedWeights, MomentumTopN};
use robustlab_core::{DateWindow, Portfolio, Strategy};
use robustlab_runner::export::{export_results_csv, load_report, render_summary, save_report};
use robustlab_runner::walk_forward::plan_windows;
use robustlab_runner::{ValidationConfig, Validator};

#[derive(Parser)]
#[command(
    name = "robustlab",
    about = "RobustLab CLI: strategy robustness validation"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run multi-timeframe, walk-forward, and Monte Carlo validation.
    Validate {
        /// Path to a TOML validation config. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of `{SYMBOL}.csv` price files.
        #[arg(long)]
        prices: PathBuf,

        /// TOML file with a `[weights]` table: validate this fixed portfolio.
        #[arg(long, conflicts_with = "universe")]
        portfolio: Option<PathBuf>,

        /// Comma-separated universe for the momentum strategy.
        /// Defaults to every symbol in the price directory.
        #[arg(long, value_delimiter = ',')]
        universe: Option<Vec<String>>,

        /// Anchor date (YYYY-MM-DD). Overrides the config; defaults to today.
        #[arg(long)]
        as_of: Option<String>,

        /// Benchmark symbol every backtest is compared against. Overrides the config.
        #[arg(long)]
        benchmark: Option<String>,

        /// Write the full report as JSON.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write per-window results as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Print the tested windows without running anything.
    Plan {
        /// Path to a TOML validation config. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Anchor date (YYYY-MM-DD). Overrides the config; defaults to today.
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Print the summary of a saved JSON report.
    Show {
        /// Path to a report written by `validate --output`.
        report: PathBuf,
    },
}

/// On-disk fixed portfolio: `[weights]` table of symbol → weight.
#[derive(Debug, Deserialize)]
struct PortfolioFile {
    weights: BTreeMap<String, f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Validate {
            config,
            prices,
            portfolio,
            universe,
            as_of,
            benchmark,
            output,
            csv,
        } => run_validate(config, prices, portfolio, universe, as_of, benchmark, output, csv),
        Commands::Plan { config, as_of } => run_plan(config, as_of),
        Commands::Show { report } => run_show(&report),
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")
}

fn load_config(path: Option<&Path>, as_of: Option<&str>) -> Result<ValidationConfig> {
    let mut config = match path {
        Some(p) => ValidationConfig::from_file(p)?,
        None => ValidationConfig::default(),
    };
    if let Some(s) = as_of {
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --as-of date '{s}', expected YYYY-MM-DD"))?;
        config.as_of = Some(date);
    }
    config.validate()?;
    Ok(config)
}

fn load_portfolio(path: &Path) -> Result<Portfolio> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read portfolio {}", path.display()))?;
    let file: PortfolioFile = toml::from_str(&content)
        .with_context(|| format!("failed to parse portfolio {}", path.display()))?;
    if file.weights.is_empty() {
        bail!("portfolio {} has no weights", path.display());
    }
    Ok(Portfolio::from_weights(file.weights)?)
}

#[allow(clippy::too_many_arguments)]
fn run_validate(
    config_path: Option<PathBuf>,
    prices: PathBuf,
    portfolio_path: Option<PathBuf>,
    universe: Option<Vec<String>>,
    as_of: Option<String>,
    benchmark: Option<String>,
    output: Option<PathBuf>,
    csv: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config_path.as_deref(), as_of.as_deref())?;
    if benchmark.is_some() {
        config.backtest.benchmark = benchmark;
        config.validate()?;
    }
    if !prices.is_dir() {
        bail!("price directory does not exist: {}", prices.display());
    }
    let provider = Arc::new(CachedProvider::new(CsvDirProvider::new(&prices)));

    let outputs = Outputs { output, csv };
    match portfolio_path {
        Some(path) => {
            let portfolio = load_portfolio(&path)?;
            info!(holdings = portfolio.len(), "validating fixed portfolio");
            execute(FixedWeights::new(portfolio), provider, config, &outputs)
        }
        None => {
            let universe = match universe {
                Some(u) => u.into_iter().filter(|s| !s.trim().is_empty()).collect(),
                None => provider.inner().available_symbols()?,
            };
            if universe.is_empty() {
                bail!("empty universe: no symbols given and none found in {}", prices.display());
            }
            info!(symbols = universe.len(), "validating momentum strategy");
            let strategy = MomentumTopN::new(Arc::clone(&provider), universe);
            execute(strategy, provider, config, &outputs)
        }
    }
}

struct Outputs {
    output: Option<PathBuf>,
    csv: Option<PathBuf>,
}

fn execute<S: Strategy>(
    strategy: S,
    provider: Arc<CachedProvider<CsvDirProvider>>,
    config: ValidationConfig,
    outputs: &Outputs,
) -> Result<()> {
    let validator = Validator::new(strategy, Arc::clone(&provider), config)?;
    let report = validator.run();
    info!(fetches = provider.fetch_count(), cached = provider.len(), "price requests served");

    print!("{}", render_summary(&report));

    if let Some(path) = &outputs.output {
        save_report(&report, path)?;
        println!("Report saved to: {}", path.display());
    }
    if let Some(path) = &outputs.csv {
        let csv = export_results_csv(&report)?;
        std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))?;
        println!("Results CSV saved to: {}", path.display());
    }
    Ok(())
}

fn run_plan(config_path: Option<PathBuf>, as_of: Option<String>) -> Result<()> {
    let config = load_config(config_path.as_deref(), as_of.as_deref())?;
    let anchor = config.anchor();

    println!("Anchor: {anchor}");
    println!("Run id: {}", config.run_id());

    println!("\nMulti-timeframe windows:");
    for (label, window) in config.multi_timeframe.windows(anchor) {
        println!("  {label:<8} {window}");
    }

    let windows = plan_windows(&config.walk_forward, anchor);
    println!("\nWalk-forward windows ({}):", windows.len());
    if windows.is_empty() {
        println!("  (history too short for a single window)");
    }
    for w in &windows {
        println!("  {:<14} train {}  test {}", w.label(), w.train, w.test);
    }

    let mc = &config.monte_carlo;
    println!(
        "\nMonte Carlo: {} simulations over {} (seed {})",
        mc.num_simulations,
        DateWindow::ending_at(anchor, mc.test_days),
        mc.seed
    );
    for (name, range) in &mc.parameter_ranges {
        let kind = if range.is_integer() { "integer" } else { "continuous" };
        println!("  {name:<16} [{}, {}] {kind}", range.min(), range.max());
    }
    Ok(())
}

fn run_show(path: &Path) -> Result<()> {
    let report = load_report(path)?;
    print!("{}", render_summary(&report));
    Ok(())
}

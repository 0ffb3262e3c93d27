//! LedgerLab CLI: run and init commands.
//!
//! Commands:
//! - `run`: execute every configured strategy over one aligned price panel
//! - `init`: write the default session config as TOML

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use ledgerlab_core::align_prices;
use ledgerlab_runner::{
    export_outcome, run_on_prices, run_session, synthetic_universe, BacktestConfig, RunOutcome,
    SyntheticOptions,
};

#[derive(Parser)]
#[command(
    name = "ledgerlab",
    about = "LedgerLab CLI: daily-signal portfolio backtester"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every strategy in a session config and export the ledgers.
    Run {
        /// Path to a TOML session config. Defaults to the built-in config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Generate this many trading days of seeded synthetic prices
        /// instead of reading the data directory.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Output directory for ledgers, blotters and summaries.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Log at debug level unless RUST_LOG says otherwise.
        #[arg(long, short)]
        verbose: bool,
    },
    /// Write the default session config.
    Init {
        /// Where to write the config.
        #[arg(long, default_value = "ledgerlab.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            synthetic,
            output_dir,
            verbose,
        } => {
            init_tracing(verbose);
            run_cmd(config.as_deref(), synthetic, &output_dir)
        }
        Commands::Init { output } => init_cmd(&output),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_cmd(config_path: Option<&Path>, synthetic: Option<usize>, output_dir: &Path) -> Result<()> {
    let config = match config_path {
        Some(path) => BacktestConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => BacktestConfig::default_config(),
    };

    let outcome = match synthetic {
        Some(days) => run_synthetic(&config, days)?,
        None => run_session(&config)?,
    };

    print_summary(&outcome);

    let written = export_outcome(&outcome, output_dir)
        .with_context(|| format!("exporting to {}", output_dir.display()))?;
    println!(
        "{} artifacts saved to: {}",
        written.len(),
        output_dir.display()
    );

    if outcome.runs.is_empty() {
        bail!("every strategy failed; see {}", output_dir.display());
    }
    Ok(())
}

fn run_synthetic(config: &BacktestConfig, days: usize) -> Result<RunOutcome> {
    if days == 0 {
        bail!("--synthetic needs at least one day");
    }
    let symbols = if config.data.symbols.is_empty() {
        SyntheticOptions::default().symbols
    } else {
        config.data.symbols.clone()
    };
    let series = synthetic_universe(&SyntheticOptions::new(symbols, days));

    // A synthetic universe is exactly `days` long; cap the history floor to it.
    let mut opts = config.data.align_options();
    opts.min_history = opts.min_history.min(days);
    let prices = align_prices(&series, &opts).context("aligning synthetic prices")?;

    Ok(run_on_prices(config, &prices)?)
}

fn init_cmd(output: &Path) -> Result<()> {
    if output.exists() {
        bail!("{} already exists; refusing to overwrite", output.display());
    }
    let text = BacktestConfig::default_config().to_toml()?;
    std::fs::write(output, text).with_context(|| format!("writing {}", output.display()))?;
    println!("Wrote default config to {}", output.display());
    Ok(())
}

fn print_summary(outcome: &RunOutcome) {
    println!();
    println!("=== Session {} ===", outcome.run_id);
    println!("Dataset:        {}", outcome.dataset_hash);
    if let Some(first) = outcome.runs.first() {
        let dates = first.ledger.dates();
        if let (Some(start), Some(end)) = (dates.first(), dates.last()) {
            println!("Period:         {start} to {end}");
        }
        println!("Instruments:    {}", first.ledger.symbols().len());
    }
    println!();
    println!(
        "{:<20} {:>14} {:>9} {:>8} {:>8} {:>7} {:>7}",
        "Strategy", "Final Value", "Return", "CAGR", "MaxDD", "Buys", "Sells"
    );
    for run in &outcome.runs {
        let m = &run.metrics;
        println!(
            "{:<20} {:>14.2} {:>8.2}% {:>7.2}% {:>7.2}% {:>7} {:>7}",
            run.label,
            m.final_value,
            m.total_return * 100.0,
            m.cagr * 100.0,
            m.max_drawdown * 100.0,
            m.buy_count,
            m.sell_count
        );
    }
    for failure in &outcome.failures {
        eprintln!("FAILED {}: {}", failure.label, failure.error);
    }
    println!();
}

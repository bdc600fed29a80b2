use std::path::PathBuf;

use clap::Parser;

use crib_runner::config::{ResolvedOutputs, RunConfig};
use crib_runner::logging::init_logging;
use crib_runner::runner::GameRunner;

/// Plays four-pile card-matching games by planning every move up front.
#[derive(Debug, Parser)]
#[command(
    name = "crib-runner",
    author,
    version,
    about = "Best-first planner and click driver for the four-pile counting game"
)]
struct Cli {
    /// Path to the YAML configuration file. Defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    attempts: Option<usize>,

    /// Use the sample layout and record clicks instead of performing them.
    #[arg(long)]
    offline: bool,

    /// Deal seeded random layouts instead of reading them.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the win-seeking search budget (states expanded).
    #[arg(long, value_name = "STATES")]
    win_budget: Option<usize>,

    /// Override the loss-seeking fallback budget (states expanded).
    #[arg(long, value_name = "STATES")]
    loss_budget: Option<usize>,

    /// Exit after validating the configuration (no games are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => RunConfig::from_path(path)?,
        None => RunConfig::default(),
    };

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(attempts) = cli.attempts {
        config.games.attempts = attempts;
    }

    if cli.offline {
        config.force_offline();
    }

    if let Some(seed) = cli.seed {
        config.layout.source = crib_runner::config::LayoutSourceKind::Seeded;
        config.layout.seed = Some(seed);
    }

    if let Some(budget) = cli.win_budget {
        config.search.win_budget = Some(budget);
    }

    if let Some(budget) = cli.loss_budget {
        config.search.loss_budget = Some(budget);
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let attempts = config.games.attempts;
    let budgets = config.search.budgets();

    println!(
        "Loaded configuration '{run_id}' ({attempts} game{}, win budget {}, loss budget {})",
        if attempts == 1 { "" } else { "s" },
        budgets.win,
        budgets.loss
    );

    if cli.validate_only {
        println!("Validation-only mode: no games played.");
        return Ok(());
    }

    let logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = GameRunner::new(config, outputs);
    let summary = runner.run()?;

    println!("Games won: {}", summary.games_won);
    println!("Games lost: {}", summary.games_lost);
    println!("Game log: {}", summary.jsonl_path.display());
    if let Some(plans_dir) = summary.plans_dir.as_ref() {
        println!("Plans: {}", plans_dir.display());
    }
    if let Some(telemetry_path) = logging_guard.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}

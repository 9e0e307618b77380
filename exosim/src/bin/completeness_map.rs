//! Detection completeness for every candidate planet in a catalog
//!
//! Targets whose separation range never reaches the working-angle window
//! are reported with zero completeness without sampling. The rest run the
//! Monte-Carlo engine, one seeded generator per target, in parallel unless
//! `--serial` is given.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use exosim::io::{write_completeness_summary, write_histograms};
use exosim::shared_args::SharedSimulationArgs;
use exosim::sims::{CompletenessEngine, TerminationReason};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser, Debug)]
#[command(
    name = "Completeness Map",
    about = "Monte-Carlo detection completeness and (WA, dMag) histograms per planet",
    long_about = None
)]
struct Args {
    #[command(flatten)]
    shared: SharedSimulationArgs,

    /// Directory for the output CSV files
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,

    /// Override samples per iteration from the configuration
    #[arg(long)]
    samples: Option<usize>,

    /// Cap iterations per target
    #[arg(long)]
    max_iterations: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = args.shared.load_config()?;
    if let Some(samples) = args.samples {
        config.completeness.samples_per_iteration = samples;
    }
    if args.max_iterations.is_some() {
        config.completeness.max_iterations = args.max_iterations;
    }
    let ctx = args.shared.load_context(&config)?;
    let filler = args.shared.load_filler()?;
    let targets = args.shared.load_targets(&filler)?;
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let engine = CompletenessEngine::new(&ctx, config.completeness.clone());
    let candidates = targets.iter().filter(|r| engine.is_candidate(r)).count();
    println!(
        "Running completeness for {} targets ({} candidates) {} with seed {}...",
        targets.len(),
        candidates,
        if args.shared.serial {
            "serially"
        } else {
            "in parallel"
        },
        args.shared.seed
    );

    let progress_style = ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .context("progress bar template")?
        .progress_chars("█▉▊▋▌▍▎▏ ");
    let pb = ProgressBar::new(targets.len() as u64);
    pb.set_style(progress_style);
    pb.set_message("Completeness");

    let results = engine.run_batch(&targets, args.shared.seed, args.shared.serial, || pb.inc(1));
    pb.finish_with_message("Completeness done");

    write_histograms(&args.out_dir.join("completeness_histograms.csv"), &results)?;
    write_completeness_summary(&args.out_dir.join("completeness.csv"), &results)?;

    let count = |reason: TerminationReason| results.iter().filter(|r| r.termination == reason).count();
    println!("Completeness summary");
    println!("  targets run:          {}", results.len());
    println!("  skipped:              {}", targets.len() - results.len());
    println!("  converged:            {}", count(TerminationReason::Converged));
    println!("  undetectable:         {}", count(TerminationReason::Undetectable));
    println!("  diminishing returns:  {}", count(TerminationReason::DiminishingReturns));
    println!("  iteration budget:     {}", count(TerminationReason::IterationBudget));
    println!("  time budget:          {}", count(TerminationReason::TimeBudget));
    if let Some(best) = results
        .iter()
        .max_by(|a, b| a.completeness.total_cmp(&b.completeness))
    {
        println!("  highest:              {} ({:.4})", best.name, best.completeness);
    }
    Ok(())
}

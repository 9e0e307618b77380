//! Quadrature and orbit photometry tables for a planet catalog
//!
//! Fills derived catalog columns, then for every usable target writes:
//! quadrature brightness per band and cloud level, a 100-point full orbit
//! with cross-cloud summaries, and 30-day alternate-inclination tracks for
//! planets without a measured inclination.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use exocatalog::TargetRecord;
use exosim::context::ObservatoryContext;
use exosim::io::{
    write_alt_orbits, write_orbit_clouds, write_orbits, write_quadrature, write_targets,
};
use exosim::shared_args::SharedSimulationArgs;
use exosim::sims::{
    alternate_inclination_track, orbit_track, quadrature_photometry, AltOrbitTrack, OrbitTrack,
    QuadratureResult, SimulationError, DEFAULT_EPOCH_JD,
};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

#[derive(Parser, Debug)]
#[command(
    name = "Orbit Tables",
    about = "Generates quadrature, orbit and alternate-inclination photometry tables",
    long_about = None
)]
struct Args {
    #[command(flatten)]
    shared: SharedSimulationArgs,

    /// Directory for the output CSV files
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,

    /// Julian date the orbit time axis starts at
    #[arg(long, default_value_t = DEFAULT_EPOCH_JD)]
    epoch: f64,
}

struct TargetTables {
    quadrature: Option<QuadratureResult>,
    orbit: Option<OrbitTrack>,
    alternate: Option<AltOrbitTrack>,
}

fn keep<T>(result: Result<T, SimulationError>, table: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(SimulationError::InclinationKnown { .. }) => None,
        Err(e) => {
            log::warn!("No {table} row: {e}");
            None
        }
    }
}

fn tables_for(record: &TargetRecord, ctx: &ObservatoryContext, epoch: f64) -> TargetTables {
    TargetTables {
        quadrature: keep(quadrature_photometry(record, ctx), "quadrature"),
        orbit: keep(orbit_track(record, ctx, epoch), "orbit"),
        alternate: keep(alternate_inclination_track(record, ctx, epoch), "alternate orbit"),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = args.shared.load_config()?;
    let ctx = args.shared.load_context(&config)?;
    let filler = args.shared.load_filler()?;
    let targets = args.shared.load_targets(&filler)?;
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    write_targets(&args.out_dir.join("targets.csv"), &targets)?;

    println!(
        "Generating photometry for {} targets {}...",
        targets.len(),
        if args.shared.serial {
            "serially"
        } else {
            "in parallel"
        }
    );

    let progress_style = ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .context("progress bar template")?
        .progress_chars("█▉▊▋▌▍▎▏ ");
    let pb = ProgressBar::new(targets.len() as u64);
    pb.set_style(progress_style);
    pb.set_message("Orbit tables");

    let run = |record: &TargetRecord| {
        let tables = tables_for(record, &ctx, args.epoch);
        pb.inc(1);
        tables
    };
    let tables: Vec<TargetTables> = if args.shared.serial {
        targets.iter().map(run).collect()
    } else {
        targets.par_iter().map(run).collect()
    };
    pb.finish_with_message("Orbit tables done");

    let mut quadrature = Vec::new();
    let mut orbits = Vec::new();
    let mut alternates = Vec::new();
    for t in tables {
        quadrature.extend(t.quadrature);
        orbits.extend(t.orbit);
        alternates.extend(t.alternate);
    }

    write_quadrature(&args.out_dir.join("quadrature.csv"), &quadrature)?;
    write_orbits(&args.out_dir.join("orbits.csv"), &orbits)?;
    write_orbit_clouds(&args.out_dir.join("orbit_clouds.csv"), &orbits)?;
    write_alt_orbits(&args.out_dir.join("alt_orbits.csv"), &alternates)?;

    println!(
        "Wrote {} quadrature, {} orbit and {} alternate-inclination targets to {}",
        quadrature.len(),
        orbits.len(),
        alternates.len(),
        args.out_dir.display()
    );
    Ok(())
}

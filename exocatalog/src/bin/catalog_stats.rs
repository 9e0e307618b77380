//! Tool to load and summarise a planet catalog export
//!
//! Reads a composite-table CSV and prints how many records are usable for
//! photometry and completeness work, plus the mix of mass provenance and
//! which orbital elements are populated.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use exocatalog::{filter_usable, read_composite_csv, MassProvenance, Measurement, TargetRecord};

/// Command line arguments for the catalog summary
#[derive(Parser, Debug)]
#[command(
    name = "Catalog Stats",
    about = "Summarises a composite planet catalog export",
    long_about = None
)]
struct Args {
    /// Path to the composite-table CSV
    catalog: PathBuf,
}

fn count(records: &[TargetRecord], field: impl Fn(&TargetRecord) -> &Measurement) -> usize {
    records.iter().filter(|r| field(r).is_known()).count()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("Planet Catalog Statistics");
    println!("=========================");

    let all = read_composite_csv(&args.catalog)
        .with_context(|| format!("reading catalog {}", args.catalog.display()))?;
    let total = all.len();
    let usable = filter_usable(all);

    println!("Total rows:      {total}");
    println!("Usable targets:  {}", usable.len());

    println!("\nPopulated orbital elements (usable targets):");
    let fields: [(&str, fn(&TargetRecord) -> &Measurement); 6] = [
        ("semi-major axis", |r| &r.sma_au),
        ("eccentricity", |r| &r.eccentricity),
        ("inclination", |r| &r.inclination_deg),
        ("arg. of periapsis", |r| &r.periapsis_arg_deg),
        ("period", |r| &r.period_days),
        ("time of periapsis", |r| &r.periapsis_time_jd),
    ];
    for (label, field) in fields {
        println!("  {label:<20} {:>6}", count(&usable, field));
    }

    let msini = usable
        .iter()
        .filter(|r| r.mass_provenance == MassProvenance::Msini)
        .count();
    let true_mass = usable
        .iter()
        .filter(|r| r.mass_provenance == MassProvenance::Mass)
        .count();
    let calculated_radius = usable.iter().filter(|r| r.radius_calculated).count();

    println!("\nMass provenance:");
    println!("  true mass            {true_mass:>6}");
    println!("  minimum mass         {msini:>6}");
    println!("  other                {:>6}", usable.len() - msini - true_mass);
    println!("\nCalculated radii:      {calculated_radius:>6}");

    Ok(())
}

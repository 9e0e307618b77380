//! Package a long-format albedo table into the photometry grid JSON
//!
//! Reads `metallicity,distance,cloud,phase,wavelength,albedo` rows, fills
//! partially missing wavelength rows with a cubic spline and writes the grid
//! in the format the other tools load with `--grid`.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use exosim::photometry::{GridData, PhotometryGrid};

#[derive(Parser, Debug)]
#[command(
    name = "Package Photometry",
    about = "Converts a long albedo table into a photometry grid JSON",
    long_about = None
)]
struct Args {
    /// Long-format albedo CSV
    input: PathBuf,

    /// Output grid JSON
    #[arg(long, default_value = "photometry_grid.json")]
    output: PathBuf,

    /// Build the interpolants after writing to check the grid loads
    #[arg(long, default_value_t = false)]
    verify: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let file = File::open(&args.input)
        .with_context(|| format!("opening albedo table {}", args.input.display()))?;
    let mut grid = GridData::from_long_table(BufReader::new(file))
        .with_context(|| format!("parsing albedo table {}", args.input.display()))?;

    let filled = grid.fill_missing_wavelengths();
    let missing = grid.albedo.iter().filter(|v| !v.is_finite()).count();
    let axes = &grid.axes;
    println!("Photometry grid");
    println!("  metallicities: {:?}", axes.metallicities);
    println!("  distances:     {:?}", axes.distances);
    println!("  clouds:        {:?}", axes.cloud_labels);
    println!("  phase angles:  {}", axes.phase_angles.len());
    println!("  wavelengths:   {}", axes.wavelengths.len());
    println!("  filled {filled} samples, {missing} still missing");

    grid.save_json(&args.output)
        .with_context(|| format!("writing grid {}", args.output.display()))?;
    println!("Wrote {}", args.output.display());

    if args.verify {
        PhotometryGrid::load_json(&args.output)
            .with_context(|| format!("reloading grid {}", args.output.display()))?;
        println!("Grid reloads and interpolants build");
    }
    Ok(())
}

use std::path::{Path, PathBuf};

use clap::Parser;
use exocatalog::{filter_usable, read_composite_csv, CatalogError, TargetRecord};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::catalog_fill::CatalogFiller;
use crate::config::SimulationConfig;
use crate::context::ObservatoryContext;
use crate::photometry::{
    ContrastCurve, ContrastCurveError, GridError, Instrument, PhotometryGrid, StellarSequence,
    StellarTableError,
};
use crate::planet::{RadiusGridError, StructureModel};

/// Failures loading run inputs
#[derive(Debug, Error)]
pub enum InputError {
    #[error("catalog {path}: {source}")]
    Catalog {
        path: PathBuf,
        source: CatalogError,
    },

    #[error("photometry grid {path}: {source}")]
    Grid { path: PathBuf, source: GridError },

    #[error("contrast curve {path}: {source}")]
    Contrast {
        path: PathBuf,
        source: ContrastCurveError,
    },

    #[error("configuration {path}: {source}")]
    Config {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("stellar table {path}: {source}")]
    Stellar {
        path: PathBuf,
        source: StellarTableError,
    },

    #[error("radius grid {path}: {source}")]
    RadiusGrid {
        path: PathBuf,
        source: RadiusGridError,
    },
}

/// Parse a positive number
fn parse_positive(s: &str) -> Result<f64, String> {
    let v: f64 = s.trim().parse().map_err(|_| format!("Invalid number '{s}'"))?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(format!("Value must be positive, got {v}"))
    }
}

/// Common arguments shared across the photometry and completeness binaries
#[derive(Parser, Debug, Clone)]
pub struct SharedSimulationArgs {
    /// Composite-table planet catalog CSV
    #[arg(long, default_value = "planets.csv")]
    pub catalog: PathBuf,

    /// Photometry grid JSON produced by package_photometry
    #[arg(long, default_value = "photometry_grid.json")]
    pub grid: PathBuf,

    /// Instrument contrast curve (λ/D, contrast)
    #[arg(long, default_value = "contrast_curve.txt")]
    pub contrast: PathBuf,

    /// Wavelength in nanometers used to convert λ/D to milliarcseconds
    #[arg(long, default_value_t = 575.0, value_parser = parse_positive)]
    pub wavelength: f64,

    /// Telescope aperture diameter in meters
    #[arg(long, default_value_t = 2.37, value_parser = parse_positive)]
    pub aperture: f64,

    /// Stellar sequence CSV (spt,teff,logl) for filling missing luminosities
    #[arg(long)]
    pub stellar_table: Option<PathBuf>,

    /// Giant-planet radius grid CSV (sma_au,mass_earth,radius_earth)
    #[arg(long)]
    pub radius_grid: Option<PathBuf>,

    /// JSON configuration overriding engine defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Random seed for reproducible runs
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Process targets serially instead of in parallel
    #[arg(long, default_value_t = false)]
    pub serial: bool,
}

impl SharedSimulationArgs {
    pub fn instrument(&self) -> Instrument {
        Instrument::new(self.wavelength, self.aperture)
    }

    /// Configuration from `--config`, or the defaults
    pub fn load_config(&self) -> Result<SimulationConfig, InputError> {
        match &self.config {
            Some(path) => SimulationConfig::load_from_file(path).map_err(|source| InputError::Config {
                path: path.clone(),
                source,
            }),
            None => Ok(SimulationConfig::default()),
        }
    }

    /// Load the grid and contrast curve into a context
    pub fn load_context(&self, config: &SimulationConfig) -> Result<ObservatoryContext, InputError> {
        let grid = PhotometryGrid::load_json(&self.grid).map_err(|source| InputError::Grid {
            path: self.grid.clone(),
            source,
        })?;
        let contrast = ContrastCurve::load(&self.contrast, &self.instrument()).map_err(|source| {
            InputError::Contrast {
                path: self.contrast.clone(),
                source,
            }
        })?;
        Ok(ObservatoryContext::new(grid, contrast).with_kepler(config.kepler))
    }

    /// Gap filler with whichever optional model tables were given
    pub fn load_filler(&self) -> Result<CatalogFiller, InputError> {
        let structure = self
            .radius_grid
            .as_deref()
            .map(|path| load_with(path, StructureModel::load, |path, source| InputError::RadiusGrid { path, source }))
            .transpose()?;
        let stellar = self
            .stellar_table
            .as_deref()
            .map(|path| load_with(path, StellarSequence::load, |path, source| InputError::Stellar { path, source }))
            .transpose()?;
        if structure.is_none() {
            log::warn!("No radius grid given; structure-model radii will be left empty");
        }
        if stellar.is_none() {
            log::warn!("No stellar table given; missing luminosities will not be filled");
        }
        Ok(CatalogFiller::new(structure, stellar))
    }

    /// Usable catalog records with derived columns filled.
    ///
    /// Error draws use a generator seeded from `--seed`, so the filled
    /// uncertainties repeat between runs.
    pub fn load_targets(&self, filler: &CatalogFiller) -> Result<Vec<TargetRecord>, InputError> {
        let records = read_composite_csv(&self.catalog).map_err(|source| InputError::Catalog {
            path: self.catalog.clone(),
            source,
        })?;
        let mut records = filter_usable(records);
        let mut rng = StdRng::seed_from_u64(self.seed);
        filler.fill_all(&mut records, &mut rng);
        Ok(records)
    }
}

fn load_with<T, E>(
    path: &Path,
    load: impl FnOnce(&Path) -> Result<T, E>,
    wrap: impl FnOnce(PathBuf, E) -> InputError,
) -> Result<T, InputError> {
    load(path).map_err(|e| wrap(path.to_path_buf(), e))
}

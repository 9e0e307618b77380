//! Rock/iron and giant-planet structure radii
//!
//! Below [`GIANT_MASS_THRESHOLD`] the radius follows the rock/iron mixture
//! fit with a fixed rock fraction. Above it, radii come from a tabulated
//! giant-planet grid (fixed 10 M⊕ core) over semi-major axis and mass, with
//! both queries clamped onto the grid before bilinear interpolation.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::algo::bilinear::{BilinearGrid, InterpolationError};

/// Masses above this (Earth masses) use the giant-planet grid
pub const GIANT_MASS_THRESHOLD: f64 = 17.0;

/// Rock mass fraction of the terrestrial branch
pub const ROCK_FRACTION: f64 = 0.67;

/// Errors loading the giant-planet radius grid
#[derive(Debug, Error)]
pub enum RadiusGridError {
    #[error("I/O error reading radius grid: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error reading radius grid: {0}")]
    Csv(#[from] csv::Error),

    #[error("Radius grid: {0}")]
    Grid(#[from] InterpolationError),
}

/// Radius in Earth radii of a rock/iron planet with rock fraction `rmf`.
pub fn rock_iron_radius(rmf: f64, mass_earth: f64) -> f64 {
    let log_m = mass_earth.log10();
    (0.0592 * rmf + 0.0975) * log_m * log_m
        + (0.2337 * rmf + 0.4938) * log_m
        + (0.3102 * rmf + 0.7932)
}

#[derive(Debug, Deserialize)]
struct GridRow {
    sma_au: f64,
    mass_earth: f64,
    radius_earth: f64,
}

/// Two-branch structure model
#[derive(Debug, Clone)]
pub struct StructureModel {
    giant: BilinearGrid,
}

impl StructureModel {
    pub fn new(giant: BilinearGrid) -> Self {
        Self { giant }
    }

    /// Read a CSV lattice with columns `sma_au,mass_earth,radius_earth`
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RadiusGridError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);
        let points: Vec<(f64, f64, f64)> = csv_reader
            .deserialize::<GridRow>()
            .map(|row| row.map(|r| (r.sma_au, r.mass_earth, r.radius_earth)))
            .collect::<Result<_, _>>()?;
        Ok(Self::new(BilinearGrid::from_points(&points)?))
    }

    pub fn load(path: &Path) -> Result<Self, RadiusGridError> {
        let model = Self::from_reader(std::fs::File::open(path)?)?;
        let (a_lo, a_hi) = model.giant.x_range();
        let (m_lo, m_hi) = model.giant.y_range();
        log::info!(
            "Loaded giant radius grid {} (a {a_lo}-{a_hi} AU, M {m_lo}-{m_hi} Earth masses)",
            path.display()
        );
        Ok(model)
    }

    pub fn giant_grid(&self) -> &BilinearGrid {
        &self.giant
    }

    /// Radius in Earth radii. NaN for non-positive or non-finite masses.
    pub fn radius(&self, mass_earth: f64, sma_au: f64) -> f64 {
        if !(mass_earth.is_finite() && mass_earth > 0.0) {
            return f64::NAN;
        }
        if mass_earth <= GIANT_MASS_THRESHOLD {
            rock_iron_radius(ROCK_FRACTION, mass_earth)
        } else {
            self.giant.interpolate_clamped(sma_au, mass_earth)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Radius grows slowly with mass and shrinks slightly with distance
    pub(crate) const GIANT_GRID_CSV: &str = "\
sma_au,mass_earth,radius_earth
0.02,17,4.0
0.02,100,11.0
0.02,1000,13.0
1.0,17,3.8
1.0,100,10.0
1.0,1000,12.0
10.0,17,3.6
10.0,100,9.6
10.0,1000,11.6
";

    pub(crate) fn model() -> StructureModel {
        StructureModel::from_reader(GIANT_GRID_CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_rock_iron_earth() {
        // One Earth mass: 0.3102·0.67 + 0.7932
        assert_relative_eq!(
            rock_iron_radius(ROCK_FRACTION, 1.0),
            0.3102 * 0.67 + 0.7932,
            epsilon = 1e-12
        );
        assert_relative_eq!(model().radius(1.0, 1.0), 1.001_034, epsilon = 1e-9);
    }

    #[test]
    fn test_branch_selection() {
        let m = model();
        assert_relative_eq!(m.radius(17.0, 1.0), rock_iron_radius(ROCK_FRACTION, 17.0));
        assert_relative_eq!(m.radius(100.0, 1.0), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_giant_grid_clamped() {
        let m = model();
        assert_relative_eq!(m.radius(5000.0, 50.0), 11.6, epsilon = 1e-12);
        assert_relative_eq!(m.radius(100.0, 0.001), 11.0, epsilon = 1e-12);
        assert_relative_eq!(m.radius(550.0, 1.0), 11.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_masses() {
        let m = model();
        assert!(m.radius(0.0, 1.0).is_nan());
        assert!(m.radius(-1.0, 1.0).is_nan());
        assert!(m.radius(f64::NAN, 1.0).is_nan());
    }

    #[test]
    fn test_incomplete_grid_rejected() {
        let csv = "sma_au,mass_earth,radius_earth\n1.0,100,10\n2.0,100,9\n1.0,200,11\n";
        assert!(matches!(
            StructureModel::from_reader(csv.as_bytes()),
            Err(RadiusGridError::Grid(InterpolationError::MissingNode { .. }))
        ));
    }
}

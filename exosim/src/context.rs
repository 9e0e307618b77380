//! Shared read-only inputs for photometry and completeness runs
//!
//! Built once per run and then only borrowed, so one context can be shared
//! across rayon workers without locking.

use std::collections::HashMap;

use crate::algo::kepler::KeplerSolver;
use crate::algo::sampling::CloudDistribution;
use crate::algo::spline::CubicSpline;
use crate::photometry::{Band, CellKey, ContrastCurve, PhotometryGrid, STANDARD_BANDS};

/// Photometry grid, instrument contrast curve and the fixed run settings
#[derive(Debug)]
pub struct ObservatoryContext {
    pub grid: PhotometryGrid,
    pub contrast: ContrastCurve,
    pub bands: Vec<Band>,
    pub clouds: CloudDistribution,
    pub kepler: KeplerSolver,
}

impl ObservatoryContext {
    /// Context with the standard bands, the fsed population and default
    /// Kepler settings
    pub fn new(grid: PhotometryGrid, contrast: ContrastCurve) -> Self {
        Self {
            grid,
            contrast,
            bands: STANDARD_BANDS.clone(),
            clouds: CloudDistribution::fsed_population(),
            kepler: KeplerSolver::default(),
        }
    }

    pub fn with_kepler(mut self, kepler: KeplerSolver) -> Self {
        self.kepler = kepler;
        self
    }

    pub fn with_bands(mut self, bands: Vec<Band>) -> Self {
        assert!(!bands.is_empty(), "At least one band is required");
        self.bands = bands;
        self
    }

    /// The band completeness is evaluated in
    pub fn primary_band(&self) -> &Band {
        &self.bands[0]
    }
}

/// Per-caller memo of band phase curves keyed by grid cell.
///
/// Each worker owns one, so the context itself stays immutable.
#[derive(Debug, Default)]
pub struct PhaseCurveCache {
    curves: HashMap<(CellKey, usize), Option<CubicSpline>>,
}

impl PhaseCurveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Band-averaged pΦ(β) for a cell and band index; `None` when the cell
    /// has no surface
    pub fn curve(&mut self, ctx: &ObservatoryContext, key: CellKey, band: usize) -> Option<&CubicSpline> {
        self.curves
            .entry((key, band))
            .or_insert_with(|| ctx.grid.band_phase_curve(key, &ctx.bands[band]))
            .as_ref()
    }

    /// pΦ at a phase angle in degrees, NaN when the cell has no surface
    pub fn evaluate(&mut self, ctx: &ObservatoryContext, key: CellKey, band: usize, phase_deg: f64) -> f64 {
        self.curve(ctx, key, band)
            .map_or(f64::NAN, |c| c.evaluate(phase_deg))
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

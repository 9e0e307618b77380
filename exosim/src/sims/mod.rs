//! Per-target photometry generators and the completeness engine
//!
//! Every generator reads a filled [`TargetRecord`] and the shared
//! [`ObservatoryContext`](crate::context::ObservatoryContext) and returns
//! plain result structs; writing them out is left to [`crate::io`].

pub mod completeness;
pub mod orbit_data;
pub mod quadrature;

use exocatalog::TargetRecord;
use thiserror::Error;

pub use completeness::{
    CompletenessEngine, CompletenessResult, HistogramBounds, HistogramRow, TargetPriors,
    TerminationReason,
};
pub use orbit_data::{alternate_inclination_track, orbit_track, AltOrbitTrack, OrbitTrack};
pub use quadrature::{quadrature_photometry, QuadraturePoint, QuadratureResult};

/// Julian date of 2026-01-01T00:00:00 UTC, the default time origin
pub const DEFAULT_EPOCH_JD: f64 = 2_461_041.5;

/// Reasons a target cannot be simulated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("{name}: missing {parameter}")]
    MissingParameter {
        name: String,
        parameter: &'static str,
    },

    #[error("{name}: no orbital period and no stellar mass to derive one")]
    NoPeriod { name: String },

    #[error("{name}: inclination is already constrained")]
    InclinationKnown { name: String },
}

impl SimulationError {
    pub fn missing(record: &TargetRecord, parameter: &'static str) -> Self {
        SimulationError::MissingParameter {
            name: record.name.clone(),
            parameter,
        }
    }
}

/// `n` evenly spaced values over `[lo, hi]`, both ends included
pub(crate) fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// Period in days from the catalog, or from Kepler's third law.
/// A zero catalog period counts as unknown.
pub(crate) fn period_or_derived(record: &TargetRecord) -> Option<f64> {
    record
        .period_days
        .known()
        .filter(|p| *p != 0.0)
        .or_else(|| {
            let a = record.sma_au.known()?;
            let mstar = record.stellar_mass_msun.known()?;
            Some(crate::orbit::period_days(a, mstar))
        })
}

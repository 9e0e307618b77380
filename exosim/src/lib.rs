//! Exoplanet photometry and detection completeness
//!
//! This crate turns catalog records into direct-imaging observables: it
//! fills missing catalog columns, interpolates a reflected-light albedo grid,
//! propagates orbits to working angle and Δmag, and estimates per-target
//! detection completeness by Monte-Carlo sampling.

pub mod algo;
pub mod catalog_fill;
pub mod config;
pub mod context;
pub mod io;
pub mod orbit;
pub mod photometry;
pub mod planet;
pub mod shared_args;
pub mod sims;
pub mod units;

// Re-exports for easier access
pub use catalog_fill::CatalogFiller;
pub use config::{CompletenessConfig, SimulationConfig};
pub use context::ObservatoryContext;
pub use photometry::{ContrastCurve, PhotometryGrid};
pub use sims::{CompletenessEngine, CompletenessResult, TerminationReason};

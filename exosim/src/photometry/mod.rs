//! Reflected-light photometry of giant planets

pub mod bands;
pub mod contrast;
pub mod dmag;
pub mod grid;
pub mod stellar;

pub use bands::{Band, STANDARD_BANDS};
pub use contrast::{ContrastCurve, ContrastCurveError, Instrument};
pub use dmag::{delta_mag, delta_mag_rjup_au};
pub use grid::{CellKey, GridData, GridError, PhotometryGrid};
pub use stellar::{SpectralType, StellarSequence, StellarTableError};

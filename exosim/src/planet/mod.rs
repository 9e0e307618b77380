//! Planet radius models
//!
//! [`forecaster`] maps mass to radius with a continuous broken power law.
//! [`fortney`] combines a rock/iron fit for small planets with a tabulated
//! giant-planet grid.

pub mod forecaster;
pub mod fortney;

pub use forecaster::{radius_from_mass, PowerLawForecaster};
pub use fortney::{rock_iron_radius, RadiusGridError, StructureModel};

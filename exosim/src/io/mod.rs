//! Tabular export of simulation results

pub mod tables;

pub use tables::{
    write_alt_orbits, write_completeness_summary, write_histograms, write_orbit_clouds,
    write_orbits, write_quadrature, write_rows, write_targets, TableError,
};

//! Exoplanet target catalog
//!
//! Target records for known planets and ingestion of local catalog exports.
//! Records produced here are the read-only inputs of the photometry and
//! completeness code in `exosim`, after gap filling has populated their
//! derived columns.

pub mod catalogs;
pub mod records;

pub use catalogs::{read_composite_csv, CatalogError, PlanetCatalog};
pub use records::{filter_usable, DerivedParameters, MassProvenance, Measurement, TargetRecord};

//! Target record model
//!
//! One [`TargetRecord`] per planet. Catalog values are kept in the units the
//! composite table reports them in (AU, days, degrees, Jupiter masses/radii,
//! parsecs, log10 solar luminosities) and every quantity that carries
//! asymmetric uncertainties is stored as a [`Measurement`].

use serde::{Deserialize, Serialize};

/// A catalog value with asymmetric uncertainties.
///
/// `err_upper` is the positive (err1) uncertainty and `err_lower` the
/// negative (err2) one, stored with the sign the catalog reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: Option<f64>,
    pub err_upper: Option<f64>,
    pub err_lower: Option<f64>,
    /// The value is only an upper or lower limit
    pub limit_only: bool,
}

impl Measurement {
    /// A measurement with no uncertainty information
    pub fn new(value: f64) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }

    /// A measurement with symmetric or asymmetric errors (`err_lower` negative)
    pub fn with_errors(value: f64, err_upper: f64, err_lower: f64) -> Self {
        Self {
            value: Some(value),
            err_upper: Some(err_upper),
            err_lower: Some(err_lower),
            limit_only: false,
        }
    }

    /// An absent measurement
    pub fn missing() -> Self {
        Self::default()
    }

    /// The value, if present and finite
    pub fn known(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite())
    }

    pub fn is_known(&self) -> bool {
        self.known().is_some()
    }

    /// Half the spread between the upper and lower error bars.
    ///
    /// Returns `None` unless both error bars are present and finite.
    pub fn sigma(&self) -> Option<f64> {
        match (self.err_upper, self.err_lower) {
            (Some(hi), Some(lo)) if hi.is_finite() && lo.is_finite() => Some((hi - lo) / 2.0),
            _ => None,
        }
    }

    /// Replace value and errors, clearing the limit flag
    pub fn set(&mut self, value: f64, sigma: Option<f64>) {
        self.value = Some(value);
        self.err_upper = sigma;
        self.err_lower = sigma.map(|s| -s);
        self.limit_only = false;
    }
}

/// Whether the catalog mass is a true mass or a projected minimum mass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MassProvenance {
    /// True mass
    Mass,
    /// Minimum mass, known only up to sin(I)
    Msini,
    /// Any other provenance (mass-radius relation, unknown)
    #[default]
    Other,
}

impl MassProvenance {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "Mass" => MassProvenance::Mass,
            "Msini" | "M*sin(i)/sin(i)" | "Msin(i)/sin(i)" => MassProvenance::Msini,
            _ => MassProvenance::Other,
        }
    }

    pub fn is_minimum_mass(&self) -> bool {
        matches!(self, MassProvenance::Msini)
    }
}

/// Columns derived by gap filling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedParameters {
    /// Semi-major axis was computed from period and stellar mass
    pub sma_calculated: bool,
    /// Angular separation atan(a/d) in milliarcseconds
    pub angular_separation_mas: Measurement,
    /// Minimum possible projected separation in milliarcseconds
    pub min_angular_separation_mas: Option<f64>,
    /// Maximum possible projected separation in milliarcseconds
    pub max_angular_separation_mas: Option<f64>,
    /// Radius from the piecewise power-law forecaster (Jupiter radii)
    pub radius_forecaster_rjup: Measurement,
    /// Radius from the rock/iron + giant grid model (Jupiter radii)
    pub radius_fortney_rjup: Measurement,
}

/// One row per planet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub name: String,
    pub host: String,

    // Orbital elements
    pub sma_au: Measurement,
    pub eccentricity: Measurement,
    pub inclination_deg: Measurement,
    pub periapsis_arg_deg: Measurement,
    pub period_days: Measurement,
    pub periapsis_time_jd: Measurement,

    // Planet physical parameters
    pub mass_mjup: Measurement,
    pub mass_provenance: MassProvenance,
    pub radius_rjup: Measurement,
    /// Catalog radius is itself a calculated value rather than a measurement
    pub radius_calculated: bool,

    // Host star
    pub distance_pc: Measurement,
    /// [Fe/H]
    pub metallicity: Measurement,
    /// log10(L / L_sun)
    pub luminosity_log: Measurement,
    pub stellar_mass_msun: Measurement,
    pub effective_temperature_k: Measurement,
    pub spectral_type: Option<String>,

    // Provenance
    pub reference_link: Option<String>,
    pub radius_reference_link: Option<String>,

    pub derived: DerivedParameters,
}

impl TargetRecord {
    /// Create an otherwise empty record for a planet
    pub fn named(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            ..Default::default()
        }
    }

    /// Minimum data needed downstream: distance, an orbit size (or the
    /// period and stellar mass to derive one) and a radius or mass.
    pub fn is_usable(&self) -> bool {
        let has_orbit = self.sma_au.is_known()
            || (self.period_days.is_known() && self.stellar_mass_msun.is_known());
        let has_size = self.mass_mjup.is_known() || self.radius_rjup.is_known();
        self.distance_pc.is_known() && has_orbit && has_size
    }

    /// [Fe/H], defaulting to solar when unknown
    pub fn metallicity_or_solar(&self) -> f64 {
        self.metallicity.known().unwrap_or(0.0)
    }

    /// Square root of the stellar luminosity in solar units, 1 when unknown.
    ///
    /// Orbital radii are divided by this before the photometry grid's
    /// distance axis is consulted.
    pub fn luminosity_scale(&self) -> f64 {
        match self.luminosity_log.known() {
            Some(log_l) => 10f64.powf(log_l).sqrt(),
            None => 1.0,
        }
    }

    /// Radius to use for photometry: the forecaster column when filled,
    /// otherwise the catalog radius.
    pub fn photometric_radius_rjup(&self) -> Option<f64> {
        self.derived
            .radius_forecaster_rjup
            .known()
            .or_else(|| self.radius_rjup.known())
    }
}

/// Keep only the records that satisfy [`TargetRecord::is_usable`].
pub fn filter_usable(records: Vec<TargetRecord>) -> Vec<TargetRecord> {
    let before = records.len();
    let kept: Vec<TargetRecord> = records.into_iter().filter(|r| r.is_usable()).collect();
    log::info!(
        "Kept {} of {} catalog records with distance, orbit size and mass or radius",
        kept.len(),
        before
    );
    kept
}

//! Piecewise power-law mass-radius relation
//!
//! Five log-log segments split at 2.04 M⊕, 95.16 M⊕, one Jupiter mass and
//! 0.08 solar masses. The inner slope and intercept and the outer slope are
//! fixed; the remaining coefficients are solved so the curve passes through
//! a Saturn radius at 95.16 M⊕ and a Jupiter radius at one Jupiter mass,
//! which makes it continuous at every breakpoint. Segments are half-open
//! `[lo, hi)`, so a mass exactly on a breakpoint uses the segment above it.

use once_cell::sync::Lazy;

use crate::units::{M_JUPITER_IN_EARTH, M_SUN_IN_EARTH, R_JUPITER_IN_EARTH};

/// Saturn radius in Earth radii used as the anchor at 95.16 M⊕
pub const SATURN_RADIUS_EARTH: f64 = 8.522;

/// Segment boundaries in Earth masses
pub static BREAKPOINTS: Lazy<[f64; 4]> =
    Lazy::new(|| [2.04, 95.16, M_JUPITER_IN_EARTH, 0.08 * M_SUN_IN_EARTH]);

/// Slope and intercept of each log10(R) = C + S log10(M) segment
#[derive(Debug, Clone, PartialEq)]
pub struct PowerLawForecaster {
    breakpoints: [f64; 4],
    slopes: [f64; 5],
    intercepts: [f64; 5],
}

impl PowerLawForecaster {
    pub fn new() -> Self {
        let t = *BREAKPOINTS;
        let log_t = t.map(f64::log10);
        let log_rj = R_JUPITER_IN_EARTH.log10();
        let log_rs = SATURN_RADIUS_EARTH.log10();

        let mut s = [0.279, 0.0, 0.0, 0.0, 0.881];
        let mut c = [1.008f64.log10(), 0.0, 0.0, 0.0, 0.0];

        s[1] = (log_rs - (c[0] + log_t[0] * s[0])) / (log_t[1] - log_t[0]);
        c[1] = log_rs - log_t[1] * s[1];

        s[2] = (log_rj - log_rs) / (log_t[2] - log_t[1]);
        c[2] = log_rj - log_t[2] * s[2];

        c[3] = log_rj;

        c[4] = log_rj - log_t[3] * s[4];

        Self {
            breakpoints: t,
            slopes: s,
            intercepts: c,
        }
    }

    pub fn breakpoints(&self) -> &[f64; 4] {
        &self.breakpoints
    }

    /// Segment holding `mass`, `None` for negative or non-finite masses
    pub fn segment(&self, mass_earth: f64) -> Option<usize> {
        if !mass_earth.is_finite() || mass_earth < 0.0 {
            return None;
        }
        Some(self.breakpoints.partition_point(|&b| b <= mass_earth))
    }

    /// Radius in Earth radii for a mass in Earth masses.
    ///
    /// Negative masses give 0 and non-finite masses NaN.
    pub fn radius(&self, mass_earth: f64) -> f64 {
        if mass_earth.is_nan() || mass_earth.is_infinite() {
            return f64::NAN;
        }
        match self.segment(mass_earth) {
            Some(j) => 10f64.powf(self.intercepts[j] + mass_earth.log10() * self.slopes[j]),
            None => 0.0,
        }
    }

    pub fn radius_many(&self, masses_earth: &[f64]) -> Vec<f64> {
        masses_earth.iter().map(|&m| self.radius(m)).collect()
    }
}

impl Default for PowerLawForecaster {
    fn default() -> Self {
        Self::new()
    }
}

static FORECASTER: Lazy<PowerLawForecaster> = Lazy::new(PowerLawForecaster::new);

/// Radius in Earth radii for a mass in Earth masses
pub fn radius_from_mass(mass_earth: f64) -> f64 {
    FORECASTER.radius(mass_earth)
}

//! Planet-star brightness contrast

use crate::units::rjup_to_au;

/// Smallest phase-albedo product allowed into Monte-Carlo magnitudes
pub const MIN_PHASE_ALBEDO: f64 = 1e-16;

/// Δmag = -2.5 log10(p (Rp/r)² Φ), with `planet_radius` and `orbit_radius`
/// in the same length unit. Non-finite results are NaN.
pub fn delta_mag(p: f64, planet_radius: f64, orbit_radius: f64, phi: f64) -> f64 {
    let ratio = planet_radius / orbit_radius;
    finite_or_nan(-2.5 * (p * ratio * ratio * phi).log10())
}

/// Δmag for a radius in Jupiter radii at an orbital distance in AU, given the
/// band-averaged albedo-phase product pΦ.
pub fn delta_mag_rjup_au(radius_rjup: f64, orbit_radius_au: f64, p_phi: f64) -> f64 {
    delta_mag(1.0, rjup_to_au(radius_rjup), orbit_radius_au, p_phi)
}

/// Infinite values become NaN
pub fn finite_or_nan(v: f64) -> f64 {
    if v.is_infinite() {
        f64::NAN
    } else {
        v
    }
}

/// Sanitise a sampled pΦ: infinite → NaN, non-positive → [`MIN_PHASE_ALBEDO`].
/// NaN passes through.
pub fn sampled_phase_albedo(p_phi: f64) -> f64 {
    if p_phi.is_infinite() {
        f64::NAN
    } else if p_phi <= 0.0 {
        MIN_PHASE_ALBEDO
    } else {
        p_phi
    }
}

//! Orbit-to-observable geometry
//!
//! Angles are in radians, distances along the orbit in AU and stellar
//! distances in parsecs. The observer looks down the reference z axis;
//! inclination 0 is face-on.

use std::f64::consts::TAU;

use crate::algo::kepler::{true_anomaly, KeplerSolver};
use crate::units::{AU_M, AU_PER_PARSEC, DAY_S, G_SI, MAS_PER_RAD, M_SUN_KG};

/// Star-planet distance from the conic equation
pub fn orbital_radius(sma: f64, eccentricity: f64, true_anomaly: f64) -> f64 {
    sma * (1.0 - eccentricity * eccentricity) / (1.0 + eccentricity * true_anomaly.cos())
}

/// Sky-plane separation for a star-planet distance `r`
pub fn projected_separation(r: f64, true_anomaly: f64, inclination: f64, periapsis_arg: f64) -> f64 {
    let i2 = 2.0 * inclination;
    let u2 = 2.0 * (true_anomaly + periapsis_arg);
    let arg = 4.0 * i2.cos() + 4.0 * u2.cos() - 2.0 * (-i2 + u2).cos() - 2.0 * (i2 + u2).cos() + 12.0;
    r * arg.max(0.0).sqrt() / 4.0
}

/// Star-planet-observer phase angle
pub fn phase_angle(true_anomaly: f64, inclination: f64, periapsis_arg: f64) -> f64 {
    (-inclination.sin() * (true_anomaly + periapsis_arg).sin())
        .clamp(-1.0, 1.0)
        .acos()
}

/// Working angle in milliarcseconds of a separation in AU at a distance in pc
pub fn working_angle_mas(separation_au: f64, distance_pc: f64) -> f64 {
    (separation_au / (distance_pc * AU_PER_PARSEC)).atan() * MAS_PER_RAD
}

/// Standard gravitational parameter of a star in m³/s²
fn stellar_mu(stellar_mass_msun: f64) -> f64 {
    G_SI * stellar_mass_msun * M_SUN_KG
}

/// Orbital period in days from Kepler's third law
pub fn period_days(sma_au: f64, stellar_mass_msun: f64) -> f64 {
    let a = sma_au * AU_M;
    TAU * (a.powi(3) / stellar_mu(stellar_mass_msun)).sqrt() / DAY_S
}

/// Semi-major axis in AU from a period in days
pub fn sma_from_period(period_days: f64, stellar_mass_msun: f64) -> f64 {
    let t = period_days * DAY_S;
    (stellar_mu(stellar_mass_msun) * t * t / (TAU * TAU)).cbrt() / AU_M
}

/// Keplerian elements needed for photometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalElements {
    pub sma_au: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub periapsis_arg: f64,
}

/// Orbit state and observables at one mean anomaly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitSample {
    pub mean_anomaly: f64,
    pub eccentric_anomaly: f64,
    pub true_anomaly: f64,
    /// Star-planet distance (AU)
    pub radius_au: f64,
    /// Projected separation (AU)
    pub separation_au: f64,
    /// Phase angle (rad)
    pub phase_angle: f64,
}

impl OrbitalElements {
    pub fn sample(&self, mean_anomaly: f64, solver: &KeplerSolver) -> OrbitSample {
        let e = self.eccentricity;
        let eccentric_anomaly = solver.eccentric_anomaly(mean_anomaly, e);
        self.sample_with_anomaly(mean_anomaly, eccentric_anomaly)
    }

    /// Observables once the eccentric anomaly is known
    pub fn sample_with_anomaly(&self, mean_anomaly: f64, eccentric_anomaly: f64) -> OrbitSample {
        let nu = true_anomaly(eccentric_anomaly, self.eccentricity);
        let r = orbital_radius(self.sma_au, self.eccentricity, nu);
        OrbitSample {
            mean_anomaly,
            eccentric_anomaly,
            true_anomaly: nu,
            radius_au: r,
            separation_au: projected_separation(r, nu, self.inclination, self.periapsis_arg),
            phase_angle: phase_angle(nu, self.inclination, self.periapsis_arg),
        }
    }

    /// Sample many mean anomalies; Kepler non-convergence is logged once
    pub fn sample_many(&self, mean_anomalies: &[f64], solver: &KeplerSolver) -> Vec<OrbitSample> {
        let eccentricities = vec![self.eccentricity; mean_anomalies.len()];
        let (anomalies, _) = solver.solve_many(mean_anomalies, &eccentricities);
        mean_anomalies
            .iter()
            .zip(anomalies)
            .map(|(&m, ecc)| self.sample_with_anomaly(m, ecc))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_conic_radius() {
        assert_relative_eq!(orbital_radius(1.0, 0.5, 0.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(orbital_radius(1.0, 0.5, PI), 1.5, epsilon = 1e-12);
        assert_relative_eq!(orbital_radius(2.0, 0.0, 1.234), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_face_on_orbit() {
        for nu in [0.0, 0.7, 2.0, 4.5] {
            assert_relative_eq!(projected_separation(1.3, nu, 0.0, 0.4), 1.3, epsilon = 1e-12);
            assert_relative_eq!(phase_angle(nu, 0.0, 0.4), FRAC_PI_2, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_edge_on_orbit() {
        for nu in [0.0, 0.7, 2.0, 4.5] {
            let w = 0.3;
            assert_relative_eq!(
                projected_separation(1.0, nu, FRAC_PI_2, w),
                (nu + w).cos().abs(),
                epsilon = 1e-7
            );
            assert_relative_eq!(
                phase_angle(nu, FRAC_PI_2, w),
                (-(nu + w).sin()).acos(),
                epsilon = 1e-12
            );
        }
        // Full phase behind the star, new phase in front
        assert_relative_eq!(phase_angle(-FRAC_PI_2, FRAC_PI_2, 0.0), 0.0, epsilon = 1e-7);
        assert_relative_eq!(phase_angle(FRAC_PI_2, FRAC_PI_2, 0.0), PI, epsilon = 1e-7);
    }

    #[test]
    fn test_working_angle() {
        // 1 AU at 10 pc is 100 mas
        assert_relative_eq!(working_angle_mas(1.0, 10.0), 100.0, max_relative = 1e-9);
    }

    #[test]
    fn test_earth_year() {
        assert_relative_eq!(period_days(1.0, 1.0), 365.25, max_relative = 1e-3);
        assert_relative_eq!(sma_from_period(period_days(3.7, 0.8), 0.8), 3.7, max_relative = 1e-12);
    }

    #[test]
    fn test_sample_circular() {
        let elements = OrbitalElements {
            sma_au: 2.0,
            eccentricity: 0.0,
            inclination: 0.0,
            periapsis_arg: 0.0,
        };
        let sample = elements.sample(1.0, &KeplerSolver::default());
        assert_relative_eq!(sample.true_anomaly, 1.0, epsilon = 1e-12);
        assert_relative_eq!(sample.radius_au, 2.0, epsilon = 1e-12);
        assert_relative_eq!(sample.separation_au, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_batch_matches_scalar() {
        let elements = OrbitalElements {
            sma_au: 1.5,
            eccentricity: 0.4,
            inclination: 1.1,
            periapsis_arg: 2.2,
        };
        let solver = KeplerSolver::default();
        let ms: Vec<f64> = (0..40).map(|i| i as f64 * 0.157).collect();
        let batch = elements.sample_many(&ms, &solver);
        for (m, s) in ms.iter().zip(&batch) {
            assert_eq!(*s, elements.sample(*m, &solver));
        }
    }
}

//! Kepler's equation for elliptical orbits
//!
//! Solves `M = E - e sin(E)` for the eccentric anomaly `E` by Newton-Raphson
//! iteration, and converts eccentric anomaly to true anomaly with the
//! half-angle tangent identity.
//!
//! Newton iteration runs on the mean anomaly reduced to `[0, 2π)`, and the
//! whole turns are added back so `E` follows `M` continuously (`E == M`
//! exactly for circular orbits). A solve that hits
//! the iteration cap returns its last iterate and reports `converged: false`
//! rather than failing; batch solves log a single warning with the count.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

/// Solver settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeplerSolver {
    /// Absolute tolerance on the residual |M - (E - e sin E)| in radians
    pub tolerance: f64,
    /// Newton iteration cap
    pub max_iterations: usize,
}

impl Default for KeplerSolver {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 100,
        }
    }
}

/// Result of one solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerSolution {
    /// Eccentric anomaly in radians
    pub eccentric_anomaly: f64,
    /// Newton steps taken
    pub iterations: usize,
    /// Residual was within tolerance when iteration stopped
    pub converged: bool,
}

impl KeplerSolver {
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Solve for a single mean anomaly and eccentricity in [0, 1).
    pub fn solve(&self, mean_anomaly: f64, eccentricity: f64) -> KeplerSolution {
        let e = eccentricity;
        if e == 0.0 || !mean_anomaly.is_finite() || !e.is_finite() {
            return KeplerSolution {
                eccentric_anomaly: mean_anomaly,
                iterations: 0,
                converged: mean_anomaly.is_finite() && e.is_finite(),
            };
        }

        let m = mean_anomaly.rem_euclid(TAU);
        let turns = mean_anomaly - m;

        // Starting guess: M/(1-e), or the cubic approximation near periapsis
        // of highly eccentric orbits where M/(1-e) overshoots.
        let mut ecc_anom = m / (1.0 - e);
        if e * ecc_anom * ecc_anom > 6.0 * (1.0 - e) {
            ecc_anom = (6.0 * m / e).cbrt();
        }

        let mut residual = m - (ecc_anom - e * ecc_anom.sin());
        let mut iterations = 0;
        while residual.abs() > self.tolerance && iterations < self.max_iterations {
            ecc_anom -= (ecc_anom - e * ecc_anom.sin() - m) / (1.0 - e * ecc_anom.cos());
            residual = m - (ecc_anom - e * ecc_anom.sin());
            iterations += 1;
        }

        KeplerSolution {
            eccentric_anomaly: ecc_anom + turns,
            iterations,
            converged: residual.abs() <= self.tolerance,
        }
    }

    /// Eccentric anomaly for a single input, warning when not converged
    pub fn eccentric_anomaly(&self, mean_anomaly: f64, eccentricity: f64) -> f64 {
        let solution = self.solve(mean_anomaly, eccentricity);
        if !solution.converged {
            log::warn!(
                "Kepler solve did not converge after {} iterations (M = {mean_anomaly}, e = {eccentricity})",
                solution.iterations
            );
        }
        solution.eccentric_anomaly
    }

    /// Solve element-wise over paired mean anomalies and eccentricities.
    ///
    /// Identical to calling [`solve`](Self::solve) per element. Returns the
    /// eccentric anomalies and the number of non-converged elements.
    pub fn solve_many(&self, mean_anomalies: &[f64], eccentricities: &[f64]) -> (Vec<f64>, usize) {
        assert_eq!(
            mean_anomalies.len(),
            eccentricities.len(),
            "Mean anomaly and eccentricity counts differ"
        );

        let mut failures = 0;
        let anomalies = mean_anomalies
            .iter()
            .zip(eccentricities)
            .map(|(&m, &e)| {
                let solution = self.solve(m, e);
                if !solution.converged {
                    failures += 1;
                }
                solution.eccentric_anomaly
            })
            .collect();

        if failures > 0 {
            log::warn!(
                "Kepler solve did not converge for {failures} of {} samples",
                mean_anomalies.len()
            );
        }
        (anomalies, failures)
    }
}

/// True anomaly from eccentric anomaly, `2 atan(sqrt((1+e)/(1-e)) tan(E/2))`.
pub fn true_anomaly(eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    let e = eccentricity;
    2.0 * (((1.0 + e) / (1.0 - e)).sqrt() * (eccentric_anomaly / 2.0).tan()).atan()
}

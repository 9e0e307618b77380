//! Marginal distributions for Monte-Carlo parameter draws
//!
//! Each orbital or physical parameter is drawn from a [`Marginal`]: a tagged
//! [`Sampler`] plus an optional clip range. Samplers are plain data so that a
//! target's full sampling configuration can be built, inspected and logged
//! before any random numbers are drawn.

use std::f64::consts::{PI, TAU};

use rand::Rng;
use rand_distr::StandardNormal;

/// Mean eccentricity of the population prior used for unknown eccentricity
pub const MEAN_UNKNOWN_ECCENTRICITY: f64 = 0.175;

/// Distribution family for one parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sampler {
    /// Always the same value
    Fixed(f64),
    /// Gaussian with the given mean and standard deviation
    Normal { mean: f64, std: f64 },
    /// Rayleigh with scale σ (mean σ·√(π/2))
    Rayleigh { scale: f64 },
    /// Uniform over [lo, hi)
    Uniform { lo: f64, hi: f64 },
    /// Density proportional to sin(x) over [lo, hi], for isotropic inclinations
    SineRestricted { lo: f64, hi: f64 },
}

impl Sampler {
    /// Rayleigh prior whose mean is [`MEAN_UNKNOWN_ECCENTRICITY`]
    pub fn unknown_eccentricity() -> Self {
        Sampler::Rayleigh {
            scale: MEAN_UNKNOWN_ECCENTRICITY * (2.0 / PI).sqrt(),
        }
    }

    /// Isotropic orientation over the full inclination range [0, π]
    pub fn isotropic_inclination() -> Self {
        Sampler::SineRestricted { lo: 0.0, hi: PI }
    }

    /// Uniform angle over [0, 2π)
    pub fn uniform_angle() -> Self {
        Sampler::Uniform { lo: 0.0, hi: TAU }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Sampler::Fixed(v) => v,
            Sampler::Normal { mean, std } => {
                let z: f64 = rng.sample(StandardNormal);
                mean + std * z
            }
            Sampler::Rayleigh { scale } => {
                let u: f64 = rng.gen();
                scale * (-2.0 * (1.0 - u).ln()).sqrt()
            }
            Sampler::Uniform { lo, hi } => lo + (hi - lo) * rng.gen::<f64>(),
            Sampler::SineRestricted { lo, hi } => {
                let c = 0.5 * (lo.cos() - hi.cos());
                let u: f64 = rng.gen();
                (lo.cos() - 2.0 * c * u).clamp(-1.0, 1.0).acos()
            }
        }
    }
}

/// A sampler with an optional clip to [lo, hi]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marginal {
    pub sampler: Sampler,
    pub clip: Option<(f64, f64)>,
}

impl Marginal {
    pub fn new(sampler: Sampler) -> Self {
        Self {
            sampler,
            clip: None,
        }
    }

    pub fn clipped(sampler: Sampler, lo: f64, hi: f64) -> Self {
        Self {
            sampler,
            clip: Some((lo, hi)),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let v = self.sampler.sample(rng);
        match self.clip {
            Some((lo, hi)) => v.clamp(lo, hi),
            None => v,
        }
    }

    /// Fill `out` with independent draws
    pub fn sample_into<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut [f64]) {
        for v in out.iter_mut() {
            *v = self.sample(rng);
        }
    }

    pub fn sample_n<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<f64> {
        let mut out = vec![0.0; n];
        self.sample_into(rng, &mut out);
        out
    }
}

/// Discrete distribution of cloud sedimentation (fsed) levels.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudDistribution {
    values: Vec<f64>,
    cumulative: Vec<f64>,
}

impl CloudDistribution {
    /// Build from (value, frequency) pairs; frequencies should sum to one
    pub fn new(levels: &[(f64, f64)]) -> Self {
        let mut total = 0.0;
        let mut values = Vec::with_capacity(levels.len());
        let mut cumulative = Vec::with_capacity(levels.len());
        for &(value, frequency) in levels {
            total += frequency;
            values.push(value);
            cumulative.push(total);
        }
        Self { values, cumulative }
    }

    /// Population frequencies of fsed for giant planets
    pub fn fsed_population() -> Self {
        Self::new(&[
            (0.0, 0.099),
            (0.01, 0.001),
            (0.03, 0.005),
            (0.1, 0.010),
            (0.3, 0.025),
            (1.0, 0.280),
            (3.0, 0.300),
            (6.0, 0.280),
        ])
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Map a uniform number in [0, 1) to a level index
    pub fn index_for(&self, u: f64) -> usize {
        self.cumulative
            .iter()
            .position(|&c| u < c)
            .unwrap_or(self.values.len() - 1)
    }

    /// Map a uniform number in [0, 1) to a level value
    pub fn value_for(&self, u: f64) -> f64 {
        self.values[self.index_for(u)]
    }

    /// Draw a level index
    pub fn sample_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.index_for(rng.gen())
    }
}

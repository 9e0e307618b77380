//! Numerical building blocks for photometry and completeness simulations
//!
//! Interpolation (1D, bilinear, cubic and bicubic splines), Kepler's
//! equation, parameter samplers and fixed-bin histograms.

pub mod bilinear;
pub mod histogram;
pub mod interp;
pub mod kepler;
pub mod sampling;
pub mod spline;
pub mod stats;

pub use bilinear::{BilinearGrid, InterpolationError};
pub use histogram::{Histogram2d, UniformAxis};
pub use interp::{Interp1dError, LinearInterpolator, NearestSnap};
pub use kepler::{true_anomaly, KeplerSolution, KeplerSolver};
pub use sampling::{CloudDistribution, Marginal, Sampler};
pub use spline::{BicubicSpline, CubicSpline};
pub use stats::FiniteSummary;

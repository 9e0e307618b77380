//! One-dimensional interpolants over tabulated data
//!
//! [`LinearInterpolator`] is piecewise linear with optional linear
//! extrapolation (instrument contrast curves, stellar sequences).
//! [`NearestSnap`] maps arbitrary queries onto the nearest tabulated axis
//! value, clamping out-of-range queries to the axis endpoints.

use thiserror::Error;

/// Errors constructing a 1D interpolant
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Interp1dError {
    #[error("Need at least {needed} points, got {got}")]
    TooFewPoints { needed: usize, got: usize },

    #[error("X and Y lengths differ ({x_len} vs {y_len})")]
    LengthMismatch { x_len: usize, y_len: usize },

    #[error("X values must be finite and strictly ascending")]
    NotAscending,
}

fn check_ascending(x: &[f64]) -> Result<(), Interp1dError> {
    if x.iter().any(|v| !v.is_finite()) || x.windows(2).any(|w| w[1] <= w[0]) {
        return Err(Interp1dError::NotAscending);
    }
    Ok(())
}

/// Piecewise-linear interpolant
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    x: Vec<f64>,
    y: Vec<f64>,
    extrapolate: bool,
}

impl LinearInterpolator {
    /// Build from ascending `x`. Out-of-range queries return NaN unless
    /// [`with_extrapolation`](Self::with_extrapolation) is enabled.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, Interp1dError> {
        if x.len() != y.len() {
            return Err(Interp1dError::LengthMismatch {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(Interp1dError::TooFewPoints {
                needed: 2,
                got: x.len(),
            });
        }
        check_ascending(&x)?;
        Ok(Self {
            x,
            y,
            extrapolate: false,
        })
    }

    /// Build from unsorted pairs, sorting by `x` first
    pub fn from_unsorted(mut pairs: Vec<(f64, f64)>) -> Result<Self, Interp1dError> {
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (x, y) = pairs.into_iter().unzip();
        Self::new(x, y)
    }

    /// Extend the end segments linearly beyond the table
    pub fn with_extrapolation(mut self, allow: bool) -> Self {
        self.extrapolate = allow;
        self
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.x.len();
        if x.is_nan() {
            return f64::NAN;
        }
        if (x < self.x[0] || x > self.x[n - 1]) && !self.extrapolate {
            return f64::NAN;
        }

        // partition_point gives the first knot strictly greater than x
        let upper = self.x.partition_point(|&v| v <= x).clamp(1, n - 1);
        let lower = upper - 1;
        let t = (x - self.x[lower]) / (self.x[upper] - self.x[lower]);
        self.y[lower] + t * (self.y[upper] - self.y[lower])
    }
}

/// Snap-to-nearest interpolant over a sorted axis.
///
/// Ties between two neighbours resolve to the lower value. Queries below
/// the first or above the last axis value return that endpoint.
#[derive(Debug, Clone)]
pub struct NearestSnap {
    values: Vec<f64>,
}

impl NearestSnap {
    pub fn new(values: Vec<f64>) -> Result<Self, Interp1dError> {
        if values.is_empty() {
            return Err(Interp1dError::TooFewPoints { needed: 1, got: 0 });
        }
        check_ascending(&values)?;
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Index of the nearest axis value, `None` for NaN queries
    pub fn index(&self, x: f64) -> Option<usize> {
        if x.is_nan() {
            return None;
        }
        let n = self.values.len();
        if x <= self.values[0] {
            return Some(0);
        }
        if x >= self.values[n - 1] {
            return Some(n - 1);
        }
        let upper = self.values.partition_point(|&v| v < x);
        let lower = upper - 1;
        let midpoint = (self.values[lower] + self.values[upper]) / 2.0;
        if x <= midpoint {
            Some(lower)
        } else {
            Some(upper)
        }
    }

    /// Nearest axis value, NaN for NaN queries
    pub fn snap(&self, x: f64) -> f64 {
        self.index(x).map_or(f64::NAN, |i| self.values[i])
    }
}

//! Fixed-bin 2D histogram for Monte-Carlo accumulation
//!
//! Only interior bins are stored. Samples below the first edge, at or above
//! the last edge, or non-finite are counted as dropped rather than binned.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Evenly spaced bins `[lo + i·step, lo + (i+1)·step)` for `i < bins`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformAxis {
    pub lo: f64,
    pub step: f64,
    pub bins: usize,
}

impl UniformAxis {
    /// Axis covering `[lo, hi)` with the given bin width.
    ///
    /// The bin count is rounded so that `lo + bins·step` lands on `hi` when
    /// the range is a whole number of steps.
    pub fn spanning(lo: f64, hi: f64, step: f64) -> Self {
        assert!(step > 0.0, "Bin width must be positive");
        assert!(hi > lo, "Axis upper bound must exceed lower bound");
        let bins = ((hi - lo) / step).round().max(1.0) as usize;
        Self { lo, step, bins }
    }

    pub fn hi(&self) -> f64 {
        self.edge(self.bins)
    }

    pub fn edge(&self, i: usize) -> f64 {
        self.lo + i as f64 * self.step
    }

    pub fn center(&self, i: usize) -> f64 {
        self.lo + (i as f64 + 0.5) * self.step
    }

    pub fn centers(&self) -> Vec<f64> {
        (0..self.bins).map(|i| self.center(i)).collect()
    }

    /// Interior bin holding `v`, if any
    pub fn index(&self, v: f64) -> Option<usize> {
        if !v.is_finite() || v < self.lo {
            return None;
        }
        let i = ((v - self.lo) / self.step).floor() as usize;
        (i < self.bins).then_some(i)
    }
}

/// Counts over an (x, y) pair of uniform axes.
#[derive(Debug, Clone)]
pub struct Histogram2d {
    x: UniformAxis,
    y: UniformAxis,
    counts: Array2<u64>,
    dropped: u64,
}

impl Histogram2d {
    pub fn new(x: UniformAxis, y: UniformAxis) -> Self {
        Self {
            x,
            y,
            counts: Array2::zeros((x.bins, y.bins)),
            dropped: 0,
        }
    }

    pub fn x_axis(&self) -> &UniformAxis {
        &self.x
    }

    pub fn y_axis(&self) -> &UniformAxis {
        &self.y
    }

    /// Bin one sample
    pub fn add(&mut self, x: f64, y: f64) {
        match (self.x.index(x), self.y.index(y)) {
            (Some(i), Some(j)) => self.counts[[i, j]] += 1,
            _ => self.dropped += 1,
        }
    }

    /// Bin paired samples
    pub fn add_all(&mut self, xs: &[f64], ys: &[f64]) {
        assert_eq!(xs.len(), ys.len(), "Histogram sample lengths differ");
        for (&x, &y) in xs.iter().zip(ys) {
            self.add(x, y);
        }
    }

    /// Counts indexed as `[x_bin, y_bin]`
    pub fn counts(&self) -> &Array2<u64> {
        &self.counts
    }

    /// Samples that landed in interior bins
    pub fn binned(&self) -> u64 {
        self.counts.sum()
    }

    /// Samples outside the interior bins or non-finite
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Counts divided by `total`
    pub fn normalized(&self, total: f64) -> Array2<f64> {
        self.counts.mapv(|c| c as f64 / total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_axis_spanning() {
        let wa = UniformAxis::spanning(150.0, 450.0, 1.0);
        assert_eq!(wa.bins, 300);
        assert_relative_eq!(wa.center(0), 150.5);

        let dmag = UniformAxis::spanning(0.0, 26.0, 0.1);
        assert_eq!(dmag.bins, 260);
        assert_relative_eq!(dmag.hi(), 26.0, epsilon = 1e-9);
    }

    #[test]
    fn test_axis_half_open() {
        let axis = UniformAxis::spanning(0.0, 10.0, 1.0);
        assert_eq!(axis.index(0.0), Some(0));
        assert_eq!(axis.index(0.999), Some(0));
        assert_eq!(axis.index(9.5), Some(9));
        assert_eq!(axis.index(10.0), None);
        assert_eq!(axis.index(-0.001), None);
        assert_eq!(axis.index(f64::NAN), None);
        assert_eq!(axis.index(f64::INFINITY), None);
    }

    #[test]
    fn test_catch_all_samples_dropped() {
        let mut hist = Histogram2d::new(
            UniformAxis::spanning(150.0, 450.0, 1.0),
            UniformAxis::spanning(0.0, 26.0, 0.1),
        );
        hist.add_all(
            &[100.0, 200.2, 200.7, 500.0, 300.0, 300.0],
            &[10.0, 10.04, 10.04, 10.0, 30.0, f64::NAN],
        );
        assert_eq!(hist.binned(), 2);
        assert_eq!(hist.dropped(), 4);
        assert_eq!(hist.counts()[[50, 100]], 2);
    }

    #[test]
    fn test_normalized_sum() {
        let mut hist = Histogram2d::new(
            UniformAxis::spanning(0.0, 2.0, 1.0),
            UniformAxis::spanning(0.0, 2.0, 1.0),
        );
        hist.add_all(&[0.5, 1.5, 5.0, 0.5], &[0.5, 1.5, 0.5, 1.5]);
        let h = hist.normalized(4.0);
        assert_relative_eq!(h.sum(), 0.75);
        assert_relative_eq!(h[[1, 1]], 0.25);
    }
}

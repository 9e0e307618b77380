//! Bilinear interpolation on rectilinear 2D grids.
//!
//! Axes may be irregularly spaced. Lookups either fail out of range
//! ([`BilinearGrid::interpolate`]) or clamp the query onto the grid bounds
//! first ([`BilinearGrid::interpolate_clamped`]), which is how tabulated
//! planet-structure models are consulted.

use ndarray::Array2;
use thiserror::Error;

/// Error types for bilinear grid construction and lookup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpolationError {
    #[error("{axis} coordinate {value} is outside valid range [{min}, {max}]")]
    OutOfBounds {
        axis: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Data dimensions ({data_shape:?}) don't match coordinate lengths (x: {x_len}, y: {y_len})")]
    DimensionMismatch {
        x_len: usize,
        y_len: usize,
        data_shape: (usize, usize),
    },

    #[error("{0} coordinates must be finite and strictly ascending")]
    Unsorted(&'static str),

    #[error("{0} axis needs at least one coordinate")]
    EmptyAxis(&'static str),

    #[error("Scattered points do not cover the lattice: no value at ({x}, {y})")]
    MissingNode { x: f64, y: f64 },
}

/// Bilinear interpolator for 2D data indexed as `data[[y_index, x_index]]`.
#[derive(Debug, Clone)]
pub struct BilinearGrid {
    x_coords: Vec<f64>,
    y_coords: Vec<f64>,
    data: Array2<f64>,
}

fn check_axis(coords: &[f64], axis: &'static str) -> Result<(), InterpolationError> {
    if coords.is_empty() {
        return Err(InterpolationError::EmptyAxis(axis));
    }
    if coords.iter().any(|c| !c.is_finite()) || coords.windows(2).any(|w| w[1] <= w[0]) {
        return Err(InterpolationError::Unsorted(axis));
    }
    Ok(())
}

/// Lower index and fractional weight of `value` inside `coords`.
///
/// `value` must already lie within the axis bounds.
fn bracket(coords: &[f64], value: f64) -> (usize, usize, f64) {
    let n = coords.len();
    if n == 1 {
        return (0, 0, 0.0);
    }
    let upper = coords.partition_point(|&c| c <= value).clamp(1, n - 1);
    let lower = upper - 1;
    let weight = (value - coords[lower]) / (coords[upper] - coords[lower]);
    (lower, upper, weight)
}

impl BilinearGrid {
    /// Build from axis coordinates and a `(y_coords.len(), x_coords.len())` array.
    pub fn new(
        x_coords: Vec<f64>,
        y_coords: Vec<f64>,
        data: Array2<f64>,
    ) -> Result<Self, InterpolationError> {
        check_axis(&x_coords, "X")?;
        check_axis(&y_coords, "Y")?;

        let (ny, nx) = data.dim();
        if nx != x_coords.len() || ny != y_coords.len() {
            return Err(InterpolationError::DimensionMismatch {
                x_len: x_coords.len(),
                y_len: y_coords.len(),
                data_shape: (ny, nx),
            });
        }

        Ok(Self {
            x_coords,
            y_coords,
            data,
        })
    }

    /// Build from `(x, y, value)` triples that together cover a full lattice.
    ///
    /// Axis values are the distinct x and y coordinates present, sorted.
    pub fn from_points(points: &[(f64, f64, f64)]) -> Result<Self, InterpolationError> {
        let mut xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let mut ys: Vec<f64> = points.iter().map(|p| p.1).collect();
        for (axis, name) in [(&mut xs, "X"), (&mut ys, "Y")] {
            if axis.iter().any(|v| !v.is_finite()) {
                return Err(InterpolationError::Unsorted(name));
            }
            axis.sort_by(f64::total_cmp);
            axis.dedup();
        }

        let mut data = Array2::from_elem((ys.len(), xs.len()), f64::NAN);
        for &(x, y, v) in points {
            let ix = xs.partition_point(|&c| c < x);
            let iy = ys.partition_point(|&c| c < y);
            data[[iy, ix]] = v;
        }

        for (iy, &y) in ys.iter().enumerate() {
            for (ix, &x) in xs.iter().enumerate() {
                if data[[iy, ix]].is_nan() {
                    return Err(InterpolationError::MissingNode { x, y });
                }
            }
        }

        Self::new(xs, ys, data)
    }

    pub fn x_coords(&self) -> &[f64] {
        &self.x_coords
    }

    pub fn y_coords(&self) -> &[f64] {
        &self.y_coords
    }

    pub fn x_range(&self) -> (f64, f64) {
        (self.x_coords[0], self.x_coords[self.x_coords.len() - 1])
    }

    pub fn y_range(&self) -> (f64, f64) {
        (self.y_coords[0], self.y_coords[self.y_coords.len() - 1])
    }

    fn blend(&self, x: f64, y: f64) -> f64 {
        let (x_low, x_high, x_weight) = bracket(&self.x_coords, x);
        let (y_low, y_high, y_weight) = bracket(&self.y_coords, y);

        let q11 = self.data[[y_low, x_low]];
        let q12 = self.data[[y_high, x_low]];
        let q21 = self.data[[y_low, x_high]];
        let q22 = self.data[[y_high, x_high]];

        q11 * (1.0 - x_weight) * (1.0 - y_weight)
            + q21 * x_weight * (1.0 - y_weight)
            + q12 * (1.0 - x_weight) * y_weight
            + q22 * x_weight * y_weight
    }

    /// Interpolate at (x, y), failing when either coordinate is off the grid.
    pub fn interpolate(&self, x: f64, y: f64) -> Result<f64, InterpolationError> {
        let (x_min, x_max) = self.x_range();
        if !(x_min..=x_max).contains(&x) {
            return Err(InterpolationError::OutOfBounds {
                axis: "X",
                value: x,
                min: x_min,
                max: x_max,
            });
        }
        let (y_min, y_max) = self.y_range();
        if !(y_min..=y_max).contains(&y) {
            return Err(InterpolationError::OutOfBounds {
                axis: "Y",
                value: y,
                min: y_min,
                max: y_max,
            });
        }
        Ok(self.blend(x, y))
    }

    /// Interpolate after clamping (x, y) onto the grid bounds.
    ///
    /// NaN inputs give NaN.
    pub fn interpolate_clamped(&self, x: f64, y: f64) -> f64 {
        if x.is_nan() || y.is_nan() {
            return f64::NAN;
        }
        let (x_min, x_max) = self.x_range();
        let (y_min, y_max) = self.y_range();
        self.blend(x.clamp(x_min, x_max), y.clamp(y_min, y_max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_simple_grid() -> BilinearGrid {
        let x_coords = vec![0.0, 1.0, 2.0];
        let y_coords = vec![0.0, 1.0, 2.0];
        let mut data = Array2::zeros((3, 3));

        // data[y,x] = x + y
        for y in 0..3 {
            for x in 0..3 {
                data[[y, x]] = x as f64 + y as f64;
            }
        }

        BilinearGrid::new(x_coords, y_coords, data).unwrap()
    }

    #[test]
    fn test_exact_grid_points() {
        let interp = create_simple_grid();
        assert_eq!(interp.interpolate(0.0, 0.0).unwrap(), 0.0);
        assert_eq!(interp.interpolate(1.0, 0.0).unwrap(), 1.0);
        assert_eq!(interp.interpolate(0.0, 1.0).unwrap(), 1.0);
        assert_eq!(interp.interpolate(2.0, 2.0).unwrap(), 4.0);
    }

    #[test]
    fn test_interpolation_midpoints() {
        let interp = create_simple_grid();
        assert_relative_eq!(interp.interpolate(0.5, 0.5).unwrap(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(interp.interpolate(1.5, 1.5).unwrap(), 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_out_of_bounds() {
        let interp = create_simple_grid();
        assert!(matches!(
            interp.interpolate(-0.1, 0.0),
            Err(InterpolationError::OutOfBounds { axis: "X", .. })
        ));
        assert!(matches!(
            interp.interpolate(0.0, 2.1),
            Err(InterpolationError::OutOfBounds { axis: "Y", .. })
        ));
    }

    #[test]
    fn test_clamped_lookup() {
        let interp = create_simple_grid();
        assert_relative_eq!(interp.interpolate_clamped(-5.0, 0.5), 0.5, epsilon = 1e-12);
        assert_relative_eq!(interp.interpolate_clamped(10.0, 10.0), 4.0, epsilon = 1e-12);
        assert!(interp.interpolate_clamped(f64::NAN, 1.0).is_nan());
    }

    #[test]
    fn test_irregular_grid() {
        let x_coords = vec![0.0, 0.3, 1.0, 2.5];
        let y_coords = vec![0.0, 0.7, 1.5, 3.0];
        let mut data = Array2::zeros((4, 4));
        for (j, &y) in y_coords.iter().enumerate() {
            for (i, &x) in x_coords.iter().enumerate() {
                data[[j, i]] = x * y;
            }
        }

        let interp = BilinearGrid::new(x_coords, y_coords, data).unwrap();
        assert_eq!(interp.interpolate(0.3, 0.7).unwrap(), 0.3 * 0.7);
        // x*y is bilinear, so interpolation inside one cell is exact
        assert_relative_eq!(interp.interpolate(0.5, 1.0).unwrap(), 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_from_points_any_order() {
        let points = [
            (2.0, 10.0, 12.0),
            (1.0, 10.0, 11.0),
            (2.0, 20.0, 22.0),
            (1.0, 20.0, 21.0),
        ];
        let grid = BilinearGrid::from_points(&points).unwrap();
        assert_eq!(grid.x_coords(), &[1.0, 2.0]);
        assert_eq!(grid.y_coords(), &[10.0, 20.0]);
        assert_relative_eq!(grid.interpolate(1.5, 15.0).unwrap(), 16.5, epsilon = 1e-12);
    }

    #[test]
    fn test_from_points_incomplete_lattice() {
        let points = [(1.0, 10.0, 11.0), (2.0, 10.0, 12.0), (1.0, 20.0, 21.0)];
        assert!(matches!(
            BilinearGrid::from_points(&points),
            Err(InterpolationError::MissingNode { .. })
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = BilinearGrid::new(vec![0.0, 1.0], vec![0.0, 1.0, 2.0], Array2::zeros((2, 2)));
        assert!(matches!(
            result,
            Err(InterpolationError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_unsorted_coords() {
        let result = BilinearGrid::new(vec![1.0, 0.0, 2.0], vec![0.0, 1.0], Array2::zeros((2, 3)));
        assert_eq!(result.unwrap_err(), InterpolationError::Unsorted("X"));
    }
}

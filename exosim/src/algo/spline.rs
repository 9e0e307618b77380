use ndarray::{Array2, ArrayView2};

/// Cubic spline interpolation for smooth curve fitting
///
/// Implements natural cubic spline interpolation through a set of data points.
/// Uses natural boundary conditions (second derivatives are zero at endpoints).
///
/// The spline is linear in its data values: the spline through `a*y1 + b*y2`
/// equals `a*S(y1) + b*S(y2)`. [`BicubicSpline::collapse_columns`] relies on
/// this to turn band-averaged albedo surfaces into 1D phase curves.
///
/// # Examples
///
/// ```rust
/// use exosim::algo::spline::CubicSpline;
///
/// let x = vec![0.0, 1.0, 2.0, 3.0];
/// let y = vec![0.0, 1.0, 4.0, 9.0];
/// let spline = CubicSpline::new(x, y);
///
/// let interpolated = spline.evaluate(1.5);
/// assert!(interpolated > 1.0 && interpolated < 4.0);
/// ```
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    coeffs: Vec<[f64; 4]>, // a, b, c, d coefficients for each segment
}

impl CubicSpline {
    /// Create a new cubic spline from input points
    ///
    /// # Arguments
    /// * `x` - X coordinates (must be sorted in ascending order, no duplicates)
    /// * `y` - Y coordinates corresponding to x values
    ///
    /// # Panics
    /// - If x and y vectors have different lengths
    /// - If fewer than 2 points are provided
    /// - If x values are not sorted in strictly ascending order
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        assert_eq!(x.len(), y.len(), "X and Y vectors must have same length");
        assert!(x.len() >= 2, "Need at least 2 points for interpolation");

        for i in 1..x.len() {
            assert!(
                x[i] > x[i - 1],
                "X values must be sorted in ascending order"
            );
        }

        let n = x.len();
        let mut spline = CubicSpline {
            x,
            y,
            coeffs: vec![[0.0; 4]; n - 1],
        };

        spline.compute_coefficients();
        spline
    }

    /// Compute cubic spline coefficients using natural boundary conditions
    ///
    /// Solves the tridiagonal system for the second derivatives with the
    /// Thomas algorithm.
    fn compute_coefficients(&mut self) {
        let n = self.x.len();
        let mut h = vec![0.0; n - 1];
        let mut alpha = vec![0.0; n - 1];

        for i in 0..n - 1 {
            h[i] = self.x[i + 1] - self.x[i];
        }

        for i in 1..n - 1 {
            alpha[i] = (3.0 / h[i]) * (self.y[i + 1] - self.y[i])
                - (3.0 / h[i - 1]) * (self.y[i] - self.y[i - 1]);
        }

        let mut l = vec![1.0; n];
        let mut mu = vec![0.0; n];
        let mut z = vec![0.0; n];

        for i in 1..n - 1 {
            l[i] = 2.0 * (self.x[i + 1] - self.x[i - 1]) - h[i - 1] * mu[i - 1];
            mu[i] = h[i] / l[i];
            z[i] = (alpha[i] - h[i - 1] * z[i - 1]) / l[i];
        }

        let mut c = vec![0.0; n];
        let mut b = vec![0.0; n - 1];
        let mut d = vec![0.0; n - 1];

        // Back substitution
        for j in (0..n - 1).rev() {
            c[j] = z[j] - mu[j] * c[j + 1];
            b[j] = (self.y[j + 1] - self.y[j]) / h[j] - h[j] * (c[j + 1] + 2.0 * c[j]) / 3.0;
            d[j] = (c[j + 1] - c[j]) / (3.0 * h[j]);
        }

        for i in 0..n - 1 {
            self.coeffs[i] = [self.y[i], b[i], c[i], d[i]];
        }
    }

    /// Evaluate the spline at a given x value
    ///
    /// For x values outside the knot range, returns the boundary value (no
    /// extrapolation). NaN input yields NaN.
    pub fn evaluate(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x <= self.x[0] {
            return self.y[0];
        }
        if x >= self.x[self.x.len() - 1] {
            return self.y[self.y.len() - 1];
        }

        let segment = self.find_segment(x);
        let dx = x - self.x[segment];
        let [a, b, c, d] = self.coeffs[segment];

        a + b * dx + c * dx * dx + d * dx * dx * dx
    }

    /// Evaluate the spline at many points
    pub fn evaluate_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }

    /// Knot positions
    pub fn knots(&self) -> &[f64] {
        &self.x
    }

    /// Knot values
    pub fn values(&self) -> &[f64] {
        &self.y
    }

    /// Binary search for the segment containing x (left endpoint index)
    fn find_segment(&self, x: f64) -> usize {
        let mut left = 0;
        let mut right = self.x.len() - 1;

        while left < right - 1 {
            let mid = (left + right) / 2;
            if x < self.x[mid] {
                right = mid;
            } else {
                left = mid;
            }
        }
        left
    }
}

/// Fill non-finite entries of `y` by cubic interpolation over the finite ones.
///
/// Leaves `y` untouched when every entry is finite, when every entry is
/// missing, or when fewer than two finite samples exist. Returns the number
/// of entries filled.
pub fn fill_missing_cubic(x: &[f64], y: &mut [f64]) -> usize {
    assert_eq!(x.len(), y.len(), "X and Y vectors must have same length");

    let (good_x, good_y): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y.iter())
        .filter(|(_, v)| v.is_finite())
        .map(|(&a, &b)| (a, b))
        .unzip();

    if good_x.len() == y.len() || good_x.len() < 2 {
        return 0;
    }

    let spline = CubicSpline::new(good_x, good_y);
    let mut filled = 0;
    for (xi, yi) in x.iter().zip(y.iter_mut()) {
        if !yi.is_finite() {
            *yi = spline.evaluate(*xi);
            filled += 1;
        }
    }
    filled
}

/// Tensor-product natural cubic spline over a rectangular grid.
///
/// Data is indexed `[row, column]`, rows along `x` and columns along `y`.
/// Evaluation splines each row along `y` and then splines the resulting
/// column along `x`.
#[derive(Debug, Clone)]
pub struct BicubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    rows: Vec<CubicSpline>,
}

impl BicubicSpline {
    /// # Panics
    /// If the data shape does not match the axes or either axis has fewer
    /// than two strictly ascending points.
    pub fn new(x: Vec<f64>, y: Vec<f64>, data: ArrayView2<f64>) -> Self {
        assert_eq!(
            data.dim(),
            (x.len(), y.len()),
            "Data shape must be (x.len(), y.len())"
        );
        assert!(x.len() >= 2, "Need at least 2 rows for interpolation");

        for i in 1..x.len() {
            assert!(
                x[i] > x[i - 1],
                "X values must be sorted in ascending order"
            );
        }

        let rows = data
            .outer_iter()
            .map(|row| CubicSpline::new(y.clone(), row.to_vec()))
            .collect();

        Self { x, y, rows }
    }

    /// Convenience constructor from an owned array
    pub fn from_array(x: Vec<f64>, y: Vec<f64>, data: &Array2<f64>) -> Self {
        Self::new(x, y, data.view())
    }

    pub fn x_knots(&self) -> &[f64] {
        &self.x
    }

    pub fn y_knots(&self) -> &[f64] {
        &self.y
    }

    /// Evaluate the surface at a single point
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let column: Vec<f64> = self.rows.iter().map(|row| row.evaluate(y)).collect();
        CubicSpline::new(self.x.clone(), column).evaluate(x)
    }

    /// Weighted sum over `y` sample points, as a spline along `x`.
    ///
    /// Returns the spline of `x -> sum_k weights[k] * S(x, ys[k])`. Because
    /// the natural spline is linear in its data this is exact, and lets a
    /// band-averaged lookup cost a single 1D evaluation per sample.
    pub fn collapse_columns(&self, ys: &[f64], weights: &[f64]) -> CubicSpline {
        assert_eq!(ys.len(), weights.len(), "Sample and weight counts differ");
        let column: Vec<f64> = self
            .rows
            .iter()
            .map(|row| {
                ys.iter()
                    .zip(weights)
                    .map(|(&yk, &wk)| wk * row.evaluate(yk))
                    .sum()
            })
            .collect();
        CubicSpline::new(self.x.clone(), column)
    }
}

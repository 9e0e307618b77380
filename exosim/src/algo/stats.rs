//! Summary statistics that skip non-finite samples
//!
//! Cross-cloud photometry summaries treat NaN entries as missing data, so a
//! scan only fails when no finite value is present at all.

use thiserror::Error;

/// Error types for summary scans
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SummaryError {
    #[error("No finite data (all {0} values are NaN or infinite)")]
    NoFiniteData(usize),
    #[error("No data provided (empty slice)")]
    NoData,
}

/// Minimum, maximum and median of the finite values in a slice
#[derive(Debug, Clone, PartialEq)]
pub struct FiniteSummary {
    min_value: Option<f64>,
    max_value: Option<f64>,
    median_value: Option<f64>,
    total: usize,
    skipped: usize,
}

impl FiniteSummary {
    /// Scan `data`, ignoring NaN and infinite entries.
    ///
    /// ```
    /// use exosim::algo::stats::FiniteSummary;
    ///
    /// let summary = FiniteSummary::new(&[3.0, f64::NAN, 1.0, 2.0]);
    /// assert_eq!(summary.min().unwrap(), 1.0);
    /// assert_eq!(summary.median().unwrap(), 2.0);
    /// ```
    pub fn new(data: &[f64]) -> Self {
        let mut finite: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
        finite.sort_by(f64::total_cmp);

        let n = finite.len();
        let median_value = match n {
            0 => None,
            _ if n % 2 == 1 => Some(finite[n / 2]),
            _ => Some((finite[n / 2 - 1] + finite[n / 2]) / 2.0),
        };

        Self {
            min_value: finite.first().copied(),
            max_value: finite.last().copied(),
            median_value,
            total: data.len(),
            skipped: data.len() - n,
        }
    }

    fn get(&self, value: Option<f64>) -> Result<f64, SummaryError> {
        match value {
            Some(v) => Ok(v),
            None if self.total == 0 => Err(SummaryError::NoData),
            None => Err(SummaryError::NoFiniteData(self.total)),
        }
    }

    pub fn min(&self) -> Result<f64, SummaryError> {
        self.get(self.min_value)
    }

    pub fn max(&self) -> Result<f64, SummaryError> {
        self.get(self.max_value)
    }

    pub fn median(&self) -> Result<f64, SummaryError> {
        self.get(self.median_value)
    }

    /// (min, max, median), each NaN when no finite value exists
    pub fn or_nan(&self) -> (f64, f64, f64) {
        (
            self.min_value.unwrap_or(f64::NAN),
            self.max_value.unwrap_or(f64::NAN),
            self.median_value.unwrap_or(f64::NAN),
        )
    }

    /// Number of entries skipped as non-finite
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Population standard deviation of the finite values, NaN when none
pub fn finite_std_dev(data: &[f64]) -> f64 {
    let (n, sum) = data
        .iter()
        .filter(|v| v.is_finite())
        .fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    if n == 0 {
        return f64::NAN;
    }
    let mean = sum / n as f64;
    let ss: f64 = data
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| (v - mean) * (v - mean))
        .sum();
    (ss / n as f64).sqrt()
}

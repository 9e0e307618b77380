//! Instrument contrast curve
//!
//! Curves are tabulated as (separation in λ/D, fractional contrast) pairs.
//! Separations are converted to milliarcseconds with a fixed wavelength and
//! aperture at load time, and contrast is interpolated linearly, extending
//! the end segments beyond the table.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::algo::interp::{Interp1dError, LinearInterpolator};
use crate::units::{diffraction_scale, AngleExt, Length, LengthExt};

/// Errors loading a contrast curve
#[derive(Debug, Error)]
pub enum ContrastCurveError {
    #[error("I/O error reading contrast curve: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: expected two numeric columns, got '{text}'")]
    Parse { line: usize, text: String },

    #[error("Contrast curve table: {0}")]
    Table(#[from] Interp1dError),
}

/// Wavelength and aperture used to express λ/D separations on the sky
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instrument {
    pub wavelength: Length,
    pub aperture: Length,
}

impl Instrument {
    pub fn new(wavelength_nm: f64, aperture_m: f64) -> Self {
        Self {
            wavelength: Length::from_nanometers(wavelength_nm),
            aperture: Length::from_meters(aperture_m),
        }
    }

    /// Milliarcseconds per λ/D
    pub fn mas_per_lambda_over_d(&self) -> f64 {
        diffraction_scale(self.wavelength, self.aperture).as_milliarcseconds()
    }
}

impl Default for Instrument {
    /// 575 nm on a 2.37 m aperture
    fn default() -> Self {
        Self::new(575.0, 2.37)
    }
}

/// Contrast as a function of working angle in milliarcseconds
#[derive(Debug, Clone)]
pub struct ContrastCurve {
    curve: LinearInterpolator,
}

impl ContrastCurve {
    /// Build from separations already in milliarcseconds
    pub fn from_mas(separations_mas: Vec<f64>, contrast: Vec<f64>) -> Result<Self, ContrastCurveError> {
        let pairs = separations_mas.into_iter().zip(contrast).collect();
        let curve = LinearInterpolator::from_unsorted(pairs)?.with_extrapolation(true);
        Ok(Self { curve })
    }

    /// Build from separations in λ/D
    pub fn from_lambda_over_d(
        separations: &[f64],
        contrast: Vec<f64>,
        instrument: &Instrument,
    ) -> Result<Self, ContrastCurveError> {
        let scale = instrument.mas_per_lambda_over_d();
        Self::from_mas(separations.iter().map(|s| s * scale).collect(), contrast)
    }

    /// Parse a two-column text table; columns split on whitespace or commas,
    /// `#` starts a comment.
    pub fn parse(text: &str, instrument: &Instrument) -> Result<Self, ContrastCurveError> {
        let mut separations = Vec::new();
        let mut contrast = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<f64> = line
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|f| !f.is_empty())
                .map(str::parse)
                .collect::<Result<_, _>>()
                .map_err(|_| ContrastCurveError::Parse {
                    line: i + 1,
                    text: raw.to_string(),
                })?;
            if fields.len() < 2 {
                return Err(ContrastCurveError::Parse {
                    line: i + 1,
                    text: raw.to_string(),
                });
            }
            separations.push(fields[0]);
            contrast.push(fields[1]);
        }
        Self::from_lambda_over_d(&separations, contrast, instrument)
    }

    pub fn load(path: &Path, instrument: &Instrument) -> Result<Self, ContrastCurveError> {
        let text = fs::read_to_string(path)?;
        let curve = Self::parse(&text, instrument)?;
        log::info!(
            "Loaded contrast curve {} ({} points, {:.1}-{:.1} mas)",
            path.display(),
            curve.curve.x().len(),
            curve.curve.x()[0],
            curve.curve.x()[curve.curve.x().len() - 1]
        );
        Ok(curve)
    }

    /// Fractional contrast at a working angle
    pub fn contrast(&self, working_angle_mas: f64) -> f64 {
        self.curve.evaluate(working_angle_mas)
    }

    /// Faintest detectable Δmag at a working angle, `-2.5 log10(contrast)`.
    ///
    /// NaN where the extrapolated contrast is not positive.
    pub fn dmag_limit(&self, working_angle_mas: f64) -> f64 {
        let c = self.contrast(working_angle_mas);
        if c > 0.0 {
            -2.5 * c.log10()
        } else {
            f64::NAN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_instrument_scale() {
        assert_relative_eq!(Instrument::default().mas_per_lambda_over_d(), 50.04, epsilon = 0.01);
    }

    #[test]
    fn test_parse_and_convert() {
        let text = "# lambda/D contrast\n3.0 1e-8\n6.0, 1e-9\n\n9.0\t1e-9 # outer\n";
        let curve = ContrastCurve::parse(text, &Instrument::default()).unwrap();
        let scale = Instrument::default().mas_per_lambda_over_d();
        assert_relative_eq!(curve.contrast(3.0 * scale), 1e-8, max_relative = 1e-9);
        assert_relative_eq!(curve.dmag_limit(6.0 * scale), 22.5, epsilon = 1e-9);
    }

    #[test]
    fn test_extrapolation() {
        let curve = ContrastCurve::from_mas(vec![100.0, 200.0], vec![2e-9, 1e-9]).unwrap();
        assert_relative_eq!(curve.contrast(300.0), 0.0, epsilon = 1e-20);
        assert_relative_eq!(curve.contrast(50.0), 2.5e-9, max_relative = 1e-9);
        assert!(curve.dmag_limit(400.0).is_nan());
    }

    #[test]
    fn test_bad_line() {
        let err = ContrastCurve::parse("3.0 abc\n", &Instrument::default()).unwrap_err();
        assert!(matches!(err, ContrastCurveError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contrast.txt");
        std::fs::write(&path, "3 1e-9\n9 1e-9\n").unwrap();
        let curve = ContrastCurve::load(&path, &Instrument::default()).unwrap();
        assert_relative_eq!(curve.dmag_limit(300.0), 22.5, epsilon = 1e-9);
    }
}

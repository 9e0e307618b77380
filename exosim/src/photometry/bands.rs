//! Observing bands for band-averaged albedo
//!
//! A band is a central wavelength and a fractional bandpass. Band averages
//! are taken over [`SAMPLES_PER_BAND`] evenly spaced wavelengths (in
//! micrometers, the photometry grid's wavelength unit) as
//! `Σ albedo(λ_k) · step / width`.

use once_cell::sync::Lazy;

use crate::units::{Length, LengthExt};

/// Wavelength samples per band
pub const SAMPLES_PER_BAND: usize = 100;

/// A photometric band centred on `center_nm` with a percent bandpass
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    /// Central wavelength in nanometers
    pub center_nm: f64,

    /// Full bandpass as a percentage of the central wavelength
    pub bandpass_percent: f64,

    /// Lower wavelength bound in micrometers
    pub lower_um: f64,

    /// Upper wavelength bound in micrometers
    pub upper_um: f64,

    /// Evenly spaced sample wavelengths in micrometers, endpoints included
    pub samples_um: Vec<f64>,

    /// Spacing between samples in micrometers
    pub step_um: f64,
}

impl Band {
    /// Create a band from its central wavelength and percent bandpass.
    pub fn new(center_nm: f64, bandpass_percent: f64) -> Self {
        // Programming errors rather than data errors
        if !center_nm.is_finite() || center_nm <= 0.0 {
            panic!("Band centre must be positive, got {center_nm}");
        }
        if !bandpass_percent.is_finite() || bandpass_percent <= 0.0 {
            panic!("Bandpass must be positive, got {bandpass_percent}");
        }

        let center_um = center_nm / 1000.0;
        let half_width = center_um * bandpass_percent / 200.0;
        let lower_um = center_um - half_width;
        let upper_um = center_um + half_width;

        let step_um = (upper_um - lower_um) / (SAMPLES_PER_BAND - 1) as f64;
        let samples_um = (0..SAMPLES_PER_BAND)
            .map(|i| {
                if i == SAMPLES_PER_BAND - 1 {
                    upper_um
                } else {
                    lower_um + i as f64 * step_um
                }
            })
            .collect();

        Self {
            center_nm,
            bandpass_percent,
            lower_um,
            upper_um,
            samples_um,
            step_um,
        }
    }

    pub fn center(&self) -> Length {
        Length::from_nanometers(self.center_nm)
    }

    /// Band width in micrometers
    pub fn width_um(&self) -> f64 {
        self.upper_um - self.lower_um
    }

    /// Per-sample weights `step / width` used for band averages
    pub fn weights(&self) -> Vec<f64> {
        vec![self.step_um / self.width_um(); self.samples_um.len()]
    }

    /// Band average of a wavelength-dependent quantity
    pub fn average(&self, f: impl Fn(f64) -> f64) -> f64 {
        let sum: f64 = self.samples_um.iter().map(|&w| f(w)).sum();
        sum * self.step_um / self.width_um()
    }

    /// Column label such as `575NM`
    pub fn label(&self) -> String {
        format!("{}NM", self.center_nm.round() as i64)
    }
}

/// The five coronagraph bands: 575, 660, 730, 760 and 825 nm
pub static STANDARD_BANDS: Lazy<Vec<Band>> = Lazy::new(|| {
    [
        (575.0, 10.0),
        (660.0, 18.0),
        (730.0, 18.0),
        (760.0, 18.0),
        (825.0, 10.0),
    ]
    .iter()
    .map(|&(center, bandpass)| Band::new(center, bandpass))
    .collect()
});

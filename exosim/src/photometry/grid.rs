//! Interpolated geometric-albedo grid
//!
//! The grid holds geometric albedo over five axes, in order: metallicity
//! [Fe/H], star-planet distance (AU, luminosity scaled), cloud sedimentation
//! level fsed, phase angle (degrees) and wavelength (micrometers).
//!
//! Each (metallicity, distance, cloud) combination is a *cell*. A cell owns a
//! bicubic surface over (phase angle, wavelength) built from its complete
//! phase rows; rows with any missing wavelength sample after gap filling are
//! left out of the fit, and cells with fewer than two complete rows have no
//! surface. Arbitrary (metallicity, distance, cloud) queries are snapped to
//! the nearest axis values first, clamping out-of-range queries to the axis
//! endpoints.
//!
//! Grids are stored as JSON with the albedo array flattened row-major and
//! `null` for missing samples.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;

use ndarray::{s, Array2, Array5, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bands::Band;
use crate::algo::interp::{Interp1dError, LinearInterpolator, NearestSnap};
use crate::algo::spline::{fill_missing_cubic, BicubicSpline, CubicSpline};

/// Phase angle of the row used for quadrature photometry (degrees)
pub const QUADRATURE_PHASE_DEG: f64 = 90.0;

/// Errors loading or building a photometry grid
#[derive(Debug, Error)]
pub enum GridError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{axis} axis: {source}")]
    Axis {
        axis: &'static str,
        source: Interp1dError,
    },

    #[error("Albedo array has {got} values, axes require {expected}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Expected {expected} cloud labels, got {got}")]
    LabelMismatch { expected: usize, got: usize },

    #[error("Wavelength axis needs at least two samples, got {0}")]
    TooFewWavelengths(usize),
}

/// Axis values of a grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridAxes {
    pub metallicities: Vec<f64>,
    pub distances: Vec<f64>,
    pub clouds: Vec<f64>,
    pub cloud_labels: Vec<String>,
    pub phase_angles: Vec<f64>,
    pub wavelengths: Vec<f64>,
}

impl GridAxes {
    pub fn shape(&self) -> (usize, usize, usize, usize, usize) {
        (
            self.metallicities.len(),
            self.distances.len(),
            self.clouds.len(),
            self.phase_angles.len(),
            self.wavelengths.len(),
        )
    }

    fn len(&self) -> usize {
        let (a, b, c, d, e) = self.shape();
        a * b * c * d * e
    }
}

/// Display label of a cloud level: `NC` for cloud-free, else `f<value>`
pub fn cloud_label(fsed: f64) -> String {
    if fsed == 0.0 {
        "NC".to_string()
    } else {
        format!("f{fsed}")
    }
}

/// Column tag of a cloud level, fsed·100 zero padded (`300C` for fsed 3)
pub fn cloud_tag(fsed: f64) -> String {
    format!("{:03}C", (fsed * 100.0).round() as i64)
}

/// On-disk layout
#[derive(Debug, Serialize, Deserialize)]
struct GridFile {
    #[serde(flatten)]
    axes: GridAxes,
    albedo: Vec<Option<f64>>,
}

/// Raw grid values before interpolants are built
#[derive(Debug, Clone)]
pub struct GridData {
    pub axes: GridAxes,
    pub albedo: Array5<f64>,
}

impl GridData {
    pub fn new(axes: GridAxes, albedo: Array5<f64>) -> Result<Self, GridError> {
        if albedo.dim() != axes.shape() {
            return Err(GridError::ShapeMismatch {
                expected: axes.len(),
                got: albedo.len(),
            });
        }
        if axes.cloud_labels.len() != axes.clouds.len() {
            return Err(GridError::LabelMismatch {
                expected: axes.clouds.len(),
                got: axes.cloud_labels.len(),
            });
        }
        Ok(Self { axes, albedo })
    }

    /// Build from a long table with columns
    /// `metallicity,distance,cloud,phase,wavelength,albedo`.
    ///
    /// Axis values are the distinct values present. Combinations absent from
    /// the table are missing (NaN).
    pub fn from_long_table<R: Read>(reader: R) -> Result<Self, GridError> {
        #[derive(Deserialize)]
        struct Row {
            metallicity: f64,
            distance: f64,
            cloud: f64,
            phase: f64,
            wavelength: f64,
            albedo: Option<f64>,
        }

        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);
        let rows: Vec<Row> = csv_reader.deserialize().collect::<Result<_, _>>()?;

        fn distinct(values: impl Iterator<Item = f64>) -> Vec<f64> {
            let mut v: Vec<f64> = values.filter(|x| x.is_finite()).collect();
            v.sort_by(f64::total_cmp);
            v.dedup();
            v
        }

        let metallicities = distinct(rows.iter().map(|r| r.metallicity));
        let distances = distinct(rows.iter().map(|r| r.distance));
        let clouds = distinct(rows.iter().map(|r| r.cloud));
        let phase_angles = distinct(rows.iter().map(|r| r.phase));
        let wavelengths = distinct(rows.iter().map(|r| r.wavelength));
        let cloud_labels = clouds.iter().map(|&c| cloud_label(c)).collect();

        let axes = GridAxes {
            metallicities,
            distances,
            clouds,
            cloud_labels,
            phase_angles,
            wavelengths,
        };

        let mut albedo = Array5::from_elem(axes.shape(), f64::NAN);
        let position = |axis: &[f64], v: f64| axis.partition_point(|&a| a < v);
        for row in &rows {
            let index = [
                position(&axes.metallicities, row.metallicity),
                position(&axes.distances, row.distance),
                position(&axes.clouds, row.cloud),
                position(&axes.phase_angles, row.phase),
                position(&axes.wavelengths, row.wavelength),
            ];
            if let Some(cell) = albedo.get_mut(index) {
                *cell = row.albedo.unwrap_or(f64::NAN);
            }
        }

        log::info!(
            "Packaged {} albedo samples into a {:?} grid",
            rows.len(),
            axes.shape()
        );
        Self::new(axes, albedo)
    }

    /// Fill partially missing wavelength rows by cubic interpolation.
    ///
    /// Rows with no finite sample stay missing. Returns the number of values
    /// filled.
    pub fn fill_missing_wavelengths(&mut self) -> usize {
        let wavelengths = &self.axes.wavelengths;
        let mut filled = 0;
        for mut lane in self.albedo.lanes_mut(Axis(4)) {
            if lane.iter().all(|v| v.is_finite()) {
                continue;
            }
            let mut row = lane.to_vec();
            let n = fill_missing_cubic(wavelengths, &mut row);
            if n > 0 {
                for (dst, src) in lane.iter_mut().zip(row) {
                    *dst = src;
                }
                filled += n;
            }
        }
        if filled > 0 {
            log::debug!("Filled {filled} missing albedo samples along wavelength");
        }
        filled
    }

    pub fn load_json(path: &Path) -> Result<Self, GridError> {
        let file: GridFile = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        let expected = file.axes.len();
        if file.albedo.len() != expected {
            return Err(GridError::ShapeMismatch {
                expected,
                got: file.albedo.len(),
            });
        }
        let values: Vec<f64> = file
            .albedo
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        let albedo =
            Array5::from_shape_vec(file.axes.shape(), values).map_err(|_| GridError::ShapeMismatch {
                expected,
                got: expected,
            })?;
        Self::new(file.axes, albedo)
    }

    pub fn save_json(&self, path: &Path) -> Result<(), GridError> {
        let file = GridFile {
            axes: self.axes.clone(),
            albedo: self
                .albedo
                .iter()
                .map(|&v| v.is_finite().then_some(v))
                .collect(),
        };
        serde_json::to_writer(BufWriter::new(File::create(path)?), &file)?;
        Ok(())
    }
}

/// Snapped (metallicity, distance, cloud) indices of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub metallicity: usize,
    pub distance: usize,
    pub cloud: usize,
}

/// Read-only albedo grid with per-cell interpolants.
#[derive(Debug)]
pub struct PhotometryGrid {
    axes: GridAxes,
    albedo: Array5<f64>,
    metallicity_snap: NearestSnap,
    distance_snap: NearestSnap,
    cloud_snap: NearestSnap,
    phase_snap: NearestSnap,
    surfaces: HashMap<CellKey, BicubicSpline>,
    quadrature_rows: HashMap<CellKey, LinearInterpolator>,
}

impl PhotometryGrid {
    /// Build interpolants, filling partially missing wavelength rows first.
    pub fn new(mut data: GridData) -> Result<Self, GridError> {
        data.fill_missing_wavelengths();
        let GridData { axes, albedo } = data;

        let snap = |axis: &'static str, values: &[f64]| {
            NearestSnap::new(values.to_vec()).map_err(|source| GridError::Axis { axis, source })
        };
        let metallicity_snap = snap("metallicity", &axes.metallicities)?;
        let distance_snap = snap("distance", &axes.distances)?;
        let cloud_snap = snap("cloud", &axes.clouds)?;
        let phase_snap = snap("phase angle", &axes.phase_angles)?;
        snap("wavelength", &axes.wavelengths)?;
        if axes.wavelengths.len() < 2 {
            return Err(GridError::TooFewWavelengths(axes.wavelengths.len()));
        }

        let quadrature_index = phase_snap.index(QUADRATURE_PHASE_DEG).unwrap_or(0);
        let (n_fe, n_d, n_c, n_phase, _) = axes.shape();
        let mut surfaces = HashMap::new();
        let mut quadrature_rows = HashMap::new();
        let mut sparse_cells = 0;

        for i in 0..n_fe {
            for j in 0..n_d {
                for k in 0..n_c {
                    let key = CellKey {
                        metallicity: i,
                        distance: j,
                        cloud: k,
                    };
                    let block = albedo.slice(s![i, j, k, .., ..]);

                    let complete: Vec<usize> = (0..n_phase)
                        .filter(|&l| block.row(l).iter().all(|v| v.is_finite()))
                        .collect();
                    if complete.len() >= 2 {
                        let phases = complete.iter().map(|&l| axes.phase_angles[l]).collect();
                        let rows: Array2<f64> = block.select(Axis(0), &complete);
                        surfaces.insert(
                            key,
                            BicubicSpline::new(phases, axes.wavelengths.clone(), rows.view()),
                        );
                    } else {
                        sparse_cells += 1;
                    }

                    let quad_row = block.row(quadrature_index).to_vec();
                    let interp = LinearInterpolator::new(axes.wavelengths.clone(), quad_row)
                        .map_err(|source| GridError::Axis {
                            axis: "wavelength",
                            source,
                        })?;
                    quadrature_rows.insert(key, interp);
                }
            }
        }

        if sparse_cells > 0 {
            log::warn!("{sparse_cells} grid cells have fewer than two complete phase rows");
        }
        log::info!(
            "Photometry grid {:?} with {} phase surfaces",
            axes.shape(),
            surfaces.len()
        );

        Ok(Self {
            axes,
            albedo,
            metallicity_snap,
            distance_snap,
            cloud_snap,
            phase_snap,
            surfaces,
            quadrature_rows,
        })
    }

    pub fn load_json(path: &Path) -> Result<Self, GridError> {
        Self::new(GridData::load_json(path)?)
    }

    pub fn axes(&self) -> &GridAxes {
        &self.axes
    }

    pub fn clouds(&self) -> &[f64] {
        &self.axes.clouds
    }

    /// Raw (gap-filled) albedo array
    pub fn albedo(&self) -> &Array5<f64> {
        &self.albedo
    }

    pub fn snap_metallicity(&self, fe: f64) -> f64 {
        self.metallicity_snap.snap(fe)
    }

    pub fn snap_distance(&self, au: f64) -> f64 {
        self.distance_snap.snap(au)
    }

    pub fn snap_cloud(&self, fsed: f64) -> f64 {
        self.cloud_snap.snap(fsed)
    }

    pub fn snap_phase(&self, deg: f64) -> f64 {
        self.phase_snap.snap(deg)
    }

    /// Cell for a metallicity, scaled distance and cloud level, snapping each
    /// to the nearest axis value. `None` when any input is NaN.
    pub fn cell(&self, metallicity: f64, distance: f64, cloud: f64) -> Option<CellKey> {
        Some(CellKey {
            metallicity: self.metallicity_snap.index(metallicity)?,
            distance: self.distance_snap.index(distance)?,
            cloud: self.cloud_snap.index(cloud)?,
        })
    }

    /// Cell for a cloud-axis index directly
    pub fn cell_with_cloud_index(
        &self,
        metallicity: f64,
        distance: f64,
        cloud: usize,
    ) -> Option<CellKey> {
        Some(CellKey {
            metallicity: self.metallicity_snap.index(metallicity)?,
            distance: self.distance_snap.index(distance)?,
            cloud,
        })
    }

    pub fn surface(&self, key: CellKey) -> Option<&BicubicSpline> {
        self.surfaces.get(&key)
    }

    /// Geometric albedo at one phase angle (deg) and wavelength (µm)
    pub fn albedo_at(&self, key: CellKey, phase_deg: f64, wavelength_um: f64) -> f64 {
        self.surface(key)
            .map_or(f64::NAN, |s| s.evaluate(phase_deg, wavelength_um))
    }

    /// Band-averaged albedo at one phase angle
    pub fn band_albedo(&self, key: CellKey, phase_deg: f64, band: &Band) -> f64 {
        match self.surface(key) {
            Some(surface) => band.average(|w| surface.evaluate(phase_deg, w)),
            None => f64::NAN,
        }
    }

    /// Band-averaged albedo as a function of phase angle for one cell.
    ///
    /// Evaluating the returned curve equals [`band_albedo`](Self::band_albedo)
    /// at every phase angle.
    pub fn band_phase_curve(&self, key: CellKey, band: &Band) -> Option<CubicSpline> {
        self.surface(key)
            .map(|surface| surface.collapse_columns(&band.samples_um, &band.weights()))
    }

    /// Band-averaged albedo of the quadrature phase row, linear in wavelength.
    ///
    /// NaN when the row is missing or the band leaves the wavelength axis.
    pub fn quadrature_band_albedo(&self, key: CellKey, band: &Band) -> f64 {
        match self.quadrature_rows.get(&key) {
            Some(row) => band.average(|w| row.evaluate(w)),
            None => f64::NAN,
        }
    }
}

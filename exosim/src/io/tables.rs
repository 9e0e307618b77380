//! CSV export of targets and generator results
//!
//! Every table is long-format with one header row, so any tabular store can
//! ingest it directly. NaN is written as `NaN` and absent values as empty
//! cells.

use std::path::Path;

use exocatalog::TargetRecord;
use serde::Serialize;
use thiserror::Error;

use crate::sims::{AltOrbitTrack, CompletenessResult, HistogramRow, OrbitTrack, QuadratureResult};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error writing table: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error writing table: {0}")]
    Csv(#[from] csv::Error),
}

/// Serialize rows to a CSV file, returning how many were written
pub fn write_rows<T, I>(path: &Path, rows: I) -> Result<usize, TableError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::Writer::from_path(path)?;
    let mut count = 0;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;
    log::info!("Wrote {count} rows to {}", path.display());
    Ok(count)
}

#[derive(Debug, Serialize)]
struct TargetRow<'a> {
    name: &'a str,
    host: &'a str,
    sma_au: Option<f64>,
    sma_calculated: bool,
    eccentricity: Option<f64>,
    inclination_deg: Option<f64>,
    periapsis_arg_deg: Option<f64>,
    period_days: Option<f64>,
    mass_mjup: Option<f64>,
    mass_provenance: String,
    radius_rjup: Option<f64>,
    radius_calculated: bool,
    radius_forecaster_rjup: Option<f64>,
    radius_forecaster_err: Option<f64>,
    radius_fortney_rjup: Option<f64>,
    radius_fortney_err: Option<f64>,
    distance_pc: Option<f64>,
    metallicity: Option<f64>,
    luminosity_log: Option<f64>,
    angular_separation_mas: Option<f64>,
    angular_separation_err: Option<f64>,
    min_angular_separation_mas: Option<f64>,
    max_angular_separation_mas: Option<f64>,
}

impl<'a> From<&'a TargetRecord> for TargetRow<'a> {
    fn from(r: &'a TargetRecord) -> Self {
        let d = &r.derived;
        Self {
            name: &r.name,
            host: &r.host,
            sma_au: r.sma_au.value,
            sma_calculated: d.sma_calculated,
            eccentricity: r.eccentricity.value,
            inclination_deg: r.inclination_deg.value,
            periapsis_arg_deg: r.periapsis_arg_deg.value,
            period_days: r.period_days.value,
            mass_mjup: r.mass_mjup.value,
            mass_provenance: format!("{:?}", r.mass_provenance),
            radius_rjup: r.radius_rjup.value,
            radius_calculated: r.radius_calculated,
            radius_forecaster_rjup: d.radius_forecaster_rjup.value,
            radius_forecaster_err: d.radius_forecaster_rjup.err_upper,
            radius_fortney_rjup: d.radius_fortney_rjup.value,
            radius_fortney_err: d.radius_fortney_rjup.err_upper,
            distance_pc: r.distance_pc.value,
            metallicity: r.metallicity.value,
            luminosity_log: r.luminosity_log.value,
            angular_separation_mas: d.angular_separation_mas.value,
            angular_separation_err: d.angular_separation_mas.err_upper,
            min_angular_separation_mas: d.min_angular_separation_mas,
            max_angular_separation_mas: d.max_angular_separation_mas,
        }
    }
}

/// Target table with gap-filled columns
pub fn write_targets(path: &Path, records: &[TargetRecord]) -> Result<usize, TableError> {
    write_rows(path, records.iter().map(TargetRow::from))
}

#[derive(Debug, Serialize)]
struct QuadratureRow<'a> {
    name: &'a str,
    band: &'a str,
    cloud: f64,
    p_phi: f64,
    dmag: f64,
    scaled_radius_au: f64,
    dmag_min: f64,
    dmag_max: f64,
    dmag_median: f64,
}

pub fn write_quadrature(path: &Path, results: &[QuadratureResult]) -> Result<usize, TableError> {
    let rows = results.iter().flat_map(|res| {
        res.bands.iter().flat_map(move |band| {
            band.per_cloud
                .iter()
                .zip(&res.clouds)
                .map(move |(point, &cloud)| QuadratureRow {
                    name: &res.name,
                    band: &band.label,
                    cloud,
                    p_phi: point.p_phi,
                    dmag: point.dmag,
                    scaled_radius_au: point.scaled_radius_au,
                    dmag_min: band.dmag_min,
                    dmag_max: band.dmag_max,
                    dmag_median: band.dmag_median,
                })
        })
    });
    write_rows(path, rows)
}

#[derive(Debug, Serialize)]
struct OrbitRow<'a> {
    name: &'a str,
    point: usize,
    band: &'a str,
    mean_anomaly: f64,
    time_offset_days: f64,
    radius_au: f64,
    separation_au: f64,
    working_angle_mas: f64,
    phase_angle_deg: f64,
    p_phi_min: f64,
    p_phi_max: f64,
    p_phi_median: f64,
    dmag_min: f64,
    dmag_max: f64,
    dmag_median: f64,
}

/// One row per target, band and orbit point with the cross-cloud summaries
pub fn write_orbits(path: &Path, tracks: &[OrbitTrack]) -> Result<usize, TableError> {
    let rows = tracks.iter().flat_map(|track| {
        track.band_labels.iter().enumerate().flat_map(move |(b, label)| {
            track
                .cloud_summary(b)
                .into_iter()
                .zip(&track.points)
                .enumerate()
                .map(move |(i, (summary, p))| OrbitRow {
                    name: &track.name,
                    point: i,
                    band: label,
                    mean_anomaly: p.mean_anomaly,
                    time_offset_days: p.time_offset_days,
                    radius_au: p.radius_au,
                    separation_au: p.separation_au,
                    working_angle_mas: p.working_angle_mas,
                    phase_angle_deg: p.phase_angle_deg,
                    p_phi_min: summary.p_phi.0,
                    p_phi_max: summary.p_phi.1,
                    p_phi_median: summary.p_phi.2,
                    dmag_min: summary.dmag.0,
                    dmag_max: summary.dmag.1,
                    dmag_median: summary.dmag.2,
                })
        })
    });
    write_rows(path, rows)
}

#[derive(Debug, Serialize)]
struct OrbitCloudRow<'a> {
    name: &'a str,
    point: usize,
    band: &'a str,
    cloud: f64,
    p_phi: f64,
    dmag: f64,
}

/// pΦ and Δmag for every cloud level, band and orbit point
pub fn write_orbit_clouds(path: &Path, tracks: &[OrbitTrack]) -> Result<usize, TableError> {
    let rows = tracks.iter().flat_map(|track| {
        track.p_phi.indexed_iter().map(move |((c, b, i), &p_phi)| OrbitCloudRow {
            name: &track.name,
            point: i,
            band: &track.band_labels[b],
            cloud: track.clouds[c],
            p_phi,
            dmag: track.dmag[[c, b, i]],
        })
    });
    write_rows(path, rows)
}

#[derive(Debug, Serialize)]
struct AltOrbitRow<'a> {
    name: &'a str,
    inclination: &'a str,
    inclination_deg: f64,
    point: usize,
    mean_anomaly: f64,
    time_offset_days: f64,
    radius_au: f64,
    separation_au: f64,
    working_angle_mas: f64,
    phase_angle_deg: f64,
    p_phi: f64,
    dmag: f64,
}

pub fn write_alt_orbits(path: &Path, tracks: &[AltOrbitTrack]) -> Result<usize, TableError> {
    let rows = tracks.iter().flat_map(|track| {
        track.cases.iter().flat_map(move |case| {
            (0..track.mean_anomalies.len()).map(move |i| AltOrbitRow {
                name: &track.name,
                inclination: &case.tag,
                inclination_deg: case.inclination.to_degrees(),
                point: i,
                mean_anomaly: track.mean_anomalies[i],
                time_offset_days: track.time_offsets_days[i],
                radius_au: track.radius_au[i],
                separation_au: case.separation_au[i],
                working_angle_mas: case.working_angle_mas[i],
                phase_angle_deg: case.phase_angle_deg[i],
                p_phi: case.p_phi[i],
                dmag: case.dmag[i],
            })
        })
    });
    write_rows(path, rows)
}

/// Nonzero histogram cells of every target
pub fn write_histograms(path: &Path, results: &[CompletenessResult]) -> Result<usize, TableError> {
    write_rows::<HistogramRow, _>(path, results.iter().flat_map(CompletenessResult::rows))
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    name: &'a str,
    completeness: f64,
    iterations: usize,
    termination: String,
    min_working_angle_mas: Option<f64>,
    max_working_angle_mas: Option<f64>,
    min_dmag: Option<f64>,
    max_dmag: Option<f64>,
    elapsed_secs: f64,
}

/// One row per target with completeness and histogram bounds
pub fn write_completeness_summary(
    path: &Path,
    results: &[CompletenessResult],
) -> Result<usize, TableError> {
    let rows = results.iter().map(|r| {
        let bounds = r.bounds();
        SummaryRow {
            name: &r.name,
            completeness: r.completeness,
            iterations: r.iterations,
            termination: r.termination.to_string(),
            min_working_angle_mas: bounds.map(|b| b.min_working_angle_mas),
            max_working_angle_mas: bounds.map(|b| b.max_working_angle_mas),
            min_dmag: bounds.map(|b| b.min_dmag),
            max_dmag: bounds.map(|b| b.max_dmag),
            elapsed_secs: r.elapsed.as_secs_f64(),
        }
    });
    write_rows(path, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::histogram::UniformAxis;
    use crate::context::tests::synthetic_context;
    use crate::sims::{orbit_track, quadrature_photometry, TerminationReason, DEFAULT_EPOCH_JD};
    use exocatalog::Measurement;
    use ndarray::Array2;
    use std::time::Duration;
    use tempfile::tempdir;

    fn target() -> TargetRecord {
        let mut r = TargetRecord::named("Test b", "Test");
        r.sma_au = Measurement::new(2.0);
        r.distance_pc = Measurement::new(10.0);
        r.radius_rjup = Measurement::new(1.0);
        r
    }

    fn read(path: &Path) -> (csv::StringRecord, Vec<csv::StringRecord>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers = reader.headers().unwrap().clone();
        let rows = reader.records().map(|r| r.unwrap()).collect();
        (headers, rows)
    }

    #[test]
    fn test_targets_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("targets.csv");
        let mut r = target();
        r.derived.max_angular_separation_mas = Some(200.0);
        assert_eq!(write_targets(&path, &[r]).unwrap(), 1);
        let (headers, rows) = read(&path);
        let col = headers.iter().position(|h| h == "max_angular_separation_mas").unwrap();
        assert_eq!(&rows[0][col], "200.0");
        let col = headers.iter().position(|h| h == "eccentricity").unwrap();
        assert_eq!(&rows[0][col], "");
    }

    #[test]
    fn test_quadrature_and_orbit_tables() {
        let ctx = synthetic_context();
        let dir = tempdir().unwrap();
        let quad = quadrature_photometry(&target(), &ctx).unwrap();
        let n = write_quadrature(&dir.path().join("quad.csv"), &[quad]).unwrap();
        assert_eq!(n, 5 * 4);

        let track = orbit_track(&target(), &ctx, DEFAULT_EPOCH_JD).unwrap();
        let n = write_orbits(&dir.path().join("orbit.csv"), &[track.clone()]).unwrap();
        assert_eq!(n, 5 * 100);
        let n = write_orbit_clouds(&dir.path().join("clouds.csv"), &[track]).unwrap();
        assert_eq!(n, 4 * 5 * 100);
    }

    #[test]
    fn test_completeness_tables() {
        let dir = tempdir().unwrap();
        let mut h = Array2::zeros((3, 2));
        h[[1, 0]] = 0.25;
        h[[2, 1]] = 0.5;
        let result = CompletenessResult {
            name: "Test b".into(),
            completeness: 0.75,
            iterations: 4,
            termination: TerminationReason::Converged,
            working_angle_axis: UniformAxis::spanning(150.0, 153.0, 1.0),
            dmag_axis: UniformAxis::spanning(0.0, 0.2, 0.1),
            histogram: Some(h),
            elapsed: Duration::from_millis(10),
        };

        let path = dir.path().join("hist.csv");
        assert_eq!(write_histograms(&path, &[result.clone()]).unwrap(), 2);
        let (headers, rows) = read(&path);
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            ["name", "alpha", "dmag", "log_h", "iind", "jind"]
        );
        assert_eq!(&rows[0][1], "151.5");
        assert_eq!(&rows[1][5], "1");

        let path = dir.path().join("summary.csv");
        write_completeness_summary(&path, &[result]).unwrap();
        let (headers, rows) = read(&path);
        let col = headers.iter().position(|h| h == "termination").unwrap();
        assert_eq!(&rows[0][col], "converged");
        let col = headers.iter().position(|h| h == "max_working_angle_mas").unwrap();
        assert_eq!(&rows[0][col], "153.0");
    }
}

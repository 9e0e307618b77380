//! Orbit-resolved photometry tracks
//!
//! [`orbit_track`] follows one full orbit per target at 100 points and
//! evaluates every cloud level and band along it. When the time of periapsis
//! and a period are available the points are one period of real time from
//! the epoch; otherwise they are evenly spaced in mean anomaly.
//!
//! [`alternate_inclination_track`] covers planets with unconstrained
//! inclination: it samples up to ten years every 30 days and repeats the
//! geometry at 90°, 60°, 30° and a critical inclination.

use std::f64::consts::{FRAC_PI_2, TAU};

use exocatalog::TargetRecord;
use ndarray::Array3;

use super::{linspace, period_or_derived, SimulationError};
use crate::algo::stats::FiniteSummary;
use crate::context::{ObservatoryContext, PhaseCurveCache};
use crate::orbit::{phase_angle, projected_separation, working_angle_mas, OrbitSample, OrbitalElements};
use crate::photometry::dmag::{delta_mag_rjup_au, finite_or_nan};
use crate::units::{mjup_to_mearth, M_SUN_IN_EARTH};

/// Points per full-orbit track
pub const ORBIT_POINTS: usize = 100;

/// Time step of alternate-inclination tracks (days)
pub const ALT_STEP_DAYS: f64 = 30.0;

/// Longest alternate-inclination track (days)
pub const ALT_MAX_SPAN_DAYS: f64 = 10.0 * 365.25;

/// Fixed inclinations of the alternate tracks (degrees)
pub const ALT_INCLINATIONS_DEG: [f64; 3] = [90.0, 60.0, 30.0];

/// Cloud level of the alternate tracks
pub const ALT_CLOUD: f64 = 3.0;

/// Fallback critical inclination for true masses (degrees)
const DEFAULT_CRITICAL_INCLINATION_DEG: f64 = 10.0;

/// Mass (solar masses) above which a companion is no longer a planet
const BROWN_DWARF_LIMIT_MSUN: f64 = 0.08;

/// Geometry at one track point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub mean_anomaly: f64,
    /// Days since the epoch, NaN when the track is not time-resolved
    pub time_offset_days: f64,
    pub radius_au: f64,
    pub separation_au: f64,
    pub working_angle_mas: f64,
    pub phase_angle_deg: f64,
}

/// Cross-cloud summary at one point for one band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudSummary {
    pub p_phi: (f64, f64, f64),
    pub dmag: (f64, f64, f64),
}

#[derive(Debug, Clone)]
pub struct OrbitTrack {
    pub name: String,
    pub points: Vec<TrackPoint>,
    pub clouds: Vec<f64>,
    pub band_labels: Vec<String>,
    /// pΦ indexed [cloud, band, point]
    pub p_phi: Array3<f64>,
    /// Δmag indexed [cloud, band, point]
    pub dmag: Array3<f64>,
}

impl OrbitTrack {
    /// (min, max, median) of pΦ and Δmag across cloud levels at each point
    pub fn cloud_summary(&self, band: usize) -> Vec<CloudSummary> {
        (0..self.points.len())
            .map(|i| {
                let p: Vec<f64> = self.p_phi.slice(ndarray::s![.., band, i]).to_vec();
                let d: Vec<f64> = self.dmag.slice(ndarray::s![.., band, i]).to_vec();
                CloudSummary {
                    p_phi: FiniteSummary::new(&p).or_nan(),
                    dmag: FiniteSummary::new(&d).or_nan(),
                }
            })
            .collect()
    }
}

/// Mean anomalies and time offsets of a full-orbit track
fn track_anomalies(record: &TargetRecord, epoch_jd: f64) -> (Vec<f64>, Vec<f64>) {
    let untimed = || {
        (
            linspace(0.0, TAU, ORBIT_POINTS),
            vec![f64::NAN; ORBIT_POINTS],
        )
    };
    let Some(tau) = record.periapsis_time_jd.known() else {
        return untimed();
    };
    let Some(period) = period_or_derived(record) else {
        return untimed();
    };
    let n = TAU / period;
    let times = linspace(epoch_jd, epoch_jd + period, ORBIT_POINTS);
    let anomalies = times.iter().map(|t| ((t - tau) * n).rem_euclid(TAU)).collect();
    let offsets = times.iter().map(|t| t - epoch_jd).collect();
    (anomalies, offsets)
}

/// Elements with unknown values replaced by e = 0, I = 90°, ω = 0
fn nominal_elements(record: &TargetRecord, a: f64) -> OrbitalElements {
    OrbitalElements {
        sma_au: a,
        eccentricity: record.eccentricity.known().unwrap_or(0.0),
        inclination: record
            .inclination_deg
            .known()
            .map_or(FRAC_PI_2, f64::to_radians),
        periapsis_arg: record.periapsis_arg_deg.known().map_or(0.0, f64::to_radians),
    }
}

pub fn orbit_track(
    record: &TargetRecord,
    ctx: &ObservatoryContext,
    epoch_jd: f64,
) -> Result<OrbitTrack, SimulationError> {
    let a = record
        .sma_au
        .known()
        .ok_or_else(|| SimulationError::missing(record, "semi-major axis"))?;
    let distance = record
        .distance_pc
        .known()
        .ok_or_else(|| SimulationError::missing(record, "distance"))?;
    let radius = record.photometric_radius_rjup().unwrap_or(f64::NAN);
    let fe = record.metallicity_or_solar();
    let scaled_sma = a / record.luminosity_scale();

    let elements = nominal_elements(record, a);
    let (anomalies, offsets) = track_anomalies(record, epoch_jd);
    let samples: Vec<OrbitSample> = elements.sample_many(&anomalies, &ctx.kepler);

    let points: Vec<TrackPoint> = samples
        .iter()
        .zip(&offsets)
        .map(|(s, &dt)| TrackPoint {
            mean_anomaly: s.mean_anomaly,
            time_offset_days: dt,
            radius_au: s.radius_au,
            separation_au: s.separation_au,
            working_angle_mas: working_angle_mas(s.separation_au, distance),
            phase_angle_deg: s.phase_angle.to_degrees(),
        })
        .collect();

    if let (Some(lo), Some(hi)) = (
        record.derived.min_angular_separation_mas,
        record.derived.max_angular_separation_mas,
    ) {
        let was = FiniteSummary::new(&points.iter().map(|p| p.working_angle_mas).collect::<Vec<_>>());
        let (min_wa, max_wa, _) = was.or_nan();
        log::debug!(
            "{}: track WA range differs from bounds by {:.3} / {:.3} mas",
            record.name,
            min_wa - lo,
            max_wa - hi
        );
    }

    let clouds = ctx.grid.clouds().to_vec();
    let shape = (clouds.len(), ctx.bands.len(), points.len());
    let mut p_phi = Array3::from_elem(shape, f64::NAN);
    let mut dmag = Array3::from_elem(shape, f64::NAN);
    let mut cache = PhaseCurveCache::new();
    for cloud in 0..clouds.len() {
        let Some(key) = ctx.grid.cell_with_cloud_index(fe, scaled_sma, cloud) else {
            continue;
        };
        for band in 0..ctx.bands.len() {
            for (i, point) in points.iter().enumerate() {
                let pp = finite_or_nan(cache.evaluate(ctx, key, band, point.phase_angle_deg));
                p_phi[[cloud, band, i]] = pp;
                dmag[[cloud, band, i]] = delta_mag_rjup_au(radius, point.radius_au, pp);
            }
        }
    }

    Ok(OrbitTrack {
        name: record.name.clone(),
        points,
        clouds,
        band_labels: ctx.bands.iter().map(|b| b.label()).collect(),
        p_phi,
        dmag,
    })
}

/// Lowest inclination consistent with a planetary mass.
///
/// For minimum masses this is arcsin(M sin i / 0.08 M☉); otherwise 10°.
pub fn critical_inclination(record: &TargetRecord) -> f64 {
    if record.mass_provenance.is_minimum_mass() {
        if let Some(m) = record.mass_mjup.known() {
            return (mjup_to_mearth(m) / (BROWN_DWARF_LIMIT_MSUN * M_SUN_IN_EARTH))
                .min(1.0)
                .asin();
        }
    }
    DEFAULT_CRITICAL_INCLINATION_DEG.to_radians()
}

/// One inclination of an alternate track
#[derive(Debug, Clone)]
pub struct InclinationCase {
    /// `90`, `60`, `30` or `crit`
    pub tag: String,
    pub inclination: f64,
    pub separation_au: Vec<f64>,
    pub working_angle_mas: Vec<f64>,
    pub phase_angle_deg: Vec<f64>,
    pub p_phi: Vec<f64>,
    pub dmag: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct AltOrbitTrack {
    pub name: String,
    pub critical_inclination: f64,
    pub band_label: String,
    pub mean_anomalies: Vec<f64>,
    pub time_offsets_days: Vec<f64>,
    pub radius_au: Vec<f64>,
    pub cases: Vec<InclinationCase>,
}

/// Times `epoch, epoch + 30, ...` strictly before `epoch + span`
fn alt_times(epoch_jd: f64, span_days: f64) -> Vec<f64> {
    let n = (span_days / ALT_STEP_DAYS).ceil().max(0.0) as usize;
    (0..n).map(|i| epoch_jd + i as f64 * ALT_STEP_DAYS).collect()
}

pub fn alternate_inclination_track(
    record: &TargetRecord,
    ctx: &ObservatoryContext,
    epoch_jd: f64,
) -> Result<AltOrbitTrack, SimulationError> {
    if record
        .inclination_deg
        .err_upper
        .is_some_and(|e| e.is_finite())
    {
        return Err(SimulationError::InclinationKnown {
            name: record.name.clone(),
        });
    }
    let a = record
        .sma_au
        .known()
        .ok_or_else(|| SimulationError::missing(record, "semi-major axis"))?;
    let distance = record
        .distance_pc
        .known()
        .ok_or_else(|| SimulationError::missing(record, "distance"))?;
    let period = period_or_derived(record).ok_or_else(|| SimulationError::NoPeriod {
        name: record.name.clone(),
    })?;

    let e = record.eccentricity.known().unwrap_or(0.0);
    let w = record.periapsis_arg_deg.known().map_or(0.0, f64::to_radians);
    let tau = record.periapsis_time_jd.known().unwrap_or(0.0);
    let radius = record.photometric_radius_rjup().unwrap_or(f64::NAN);
    let fe = record.metallicity_or_solar();
    let scaled_sma = a / record.luminosity_scale();
    let icrit = critical_inclination(record);

    let n = TAU / period;
    let times = alt_times(epoch_jd, period.min(ALT_MAX_SPAN_DAYS));
    let anomalies: Vec<f64> = times.iter().map(|t| ((t - tau) * n).rem_euclid(TAU)).collect();
    let elements = OrbitalElements {
        sma_au: a,
        eccentricity: e,
        inclination: FRAC_PI_2,
        periapsis_arg: w,
    };
    let samples = elements.sample_many(&anomalies, &ctx.kepler);

    let mut cache = PhaseCurveCache::new();
    let key = ctx.grid.cell(fe, scaled_sma, ALT_CLOUD);
    let mut inclinations: Vec<(String, f64)> = ALT_INCLINATIONS_DEG
        .iter()
        .map(|deg| (format!("{deg:.0}"), deg.to_radians()))
        .collect();
    inclinations.push(("crit".to_string(), icrit));

    let cases = inclinations
        .into_iter()
        .map(|(tag, inc)| {
            let separation_au: Vec<f64> = samples
                .iter()
                .map(|s| projected_separation(s.radius_au, s.true_anomaly, inc, w))
                .collect();
            let phase_angle_deg: Vec<f64> = samples
                .iter()
                .map(|s| phase_angle(s.true_anomaly, inc, w).to_degrees())
                .collect();
            let p_phi: Vec<f64> = phase_angle_deg
                .iter()
                .map(|&beta| match key {
                    Some(key) => finite_or_nan(cache.evaluate(ctx, key, 0, beta)),
                    None => f64::NAN,
                })
                .collect();
            let dmag = samples
                .iter()
                .zip(&p_phi)
                .map(|(s, &pp)| delta_mag_rjup_au(radius, s.radius_au, pp))
                .collect();
            InclinationCase {
                tag,
                inclination: inc,
                working_angle_mas: separation_au
                    .iter()
                    .map(|&sep| working_angle_mas(sep, distance))
                    .collect(),
                separation_au,
                phase_angle_deg,
                p_phi,
                dmag,
            }
        })
        .collect();

    Ok(AltOrbitTrack {
        name: record.name.clone(),
        critical_inclination: icrit,
        band_label: ctx.primary_band().label(),
        mean_anomalies: anomalies,
        time_offsets_days: times.iter().map(|t| t - epoch_jd).collect(),
        radius_au: samples.iter().map(|s| s.radius_au).collect(),
        cases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::synthetic_context;
    use crate::sims::DEFAULT_EPOCH_JD;
    use approx::assert_relative_eq;
    use exocatalog::{MassProvenance, Measurement};

    fn target() -> TargetRecord {
        let mut r = TargetRecord::named("Test b", "Test");
        r.sma_au = Measurement::new(2.0);
        r.distance_pc = Measurement::new(10.0);
        r.radius_rjup = Measurement::new(1.0);
        r.stellar_mass_msun = Measurement::new(1.0);
        r
    }

    #[test]
    fn test_untimed_track() {
        let ctx = synthetic_context();
        let track = orbit_track(&target(), &ctx, DEFAULT_EPOCH_JD).unwrap();
        assert_eq!(track.points.len(), ORBIT_POINTS);
        assert!(track.points.iter().all(|p| p.time_offset_days.is_nan()));
        assert_eq!(track.points[0].mean_anomaly, 0.0);
        assert_relative_eq!(track.points[99].mean_anomaly, TAU, epsilon = 1e-12);
        // Circular edge-on orbit: constant radius, separation |cos ν|
        for p in &track.points {
            assert_relative_eq!(p.radius_au, 2.0, epsilon = 1e-9);
            assert!(p.separation_au <= 2.0 + 1e-9);
        }
        assert_eq!(track.p_phi.dim(), (4, 5, ORBIT_POINTS));
        assert!(track.dmag.iter().all(|d| d.is_finite()));
    }

    #[test]
    fn test_timed_track() {
        let ctx = synthetic_context();
        let mut r = target();
        r.periapsis_time_jd = Measurement::new(DEFAULT_EPOCH_JD);
        r.period_days = Measurement::new(1000.0);
        let track = orbit_track(&r, &ctx, DEFAULT_EPOCH_JD).unwrap();
        assert_eq!(track.points[0].time_offset_days, 0.0);
        assert_relative_eq!(track.points[99].time_offset_days, 1000.0, epsilon = 1e-6);
        assert_eq!(track.points[0].mean_anomaly, 0.0);
    }

    #[test]
    fn test_cloud_summary_ordering() {
        let ctx = synthetic_context();
        let track = orbit_track(&target(), &ctx, DEFAULT_EPOCH_JD).unwrap();
        for s in track.cloud_summary(0) {
            assert!(s.dmag.0 <= s.dmag.2 && s.dmag.2 <= s.dmag.1);
            assert!(s.p_phi.0 <= s.p_phi.1);
        }
    }

    #[test]
    fn test_critical_inclination() {
        let mut r = target();
        assert_relative_eq!(critical_inclination(&r), 10f64.to_radians(), epsilon = 1e-12);
        r.mass_provenance = MassProvenance::Msini;
        r.mass_mjup = Measurement::new(10.0);
        let expected = (mjup_to_mearth(10.0) / (0.08 * M_SUN_IN_EARTH)).asin();
        assert_relative_eq!(critical_inclination(&r), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_alternate_track() {
        let ctx = synthetic_context();
        let track = alternate_inclination_track(&target(), &ctx, DEFAULT_EPOCH_JD).unwrap();
        // About 1033 days at 30-day steps
        assert_eq!(track.mean_anomalies.len(), 35);
        assert_eq!(track.cases.len(), 4);
        let tags: Vec<&str> = track.cases.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, ["90", "60", "30", "crit"]);
        // Lower inclination never shrinks the projected separation
        for (s90, s30) in track.cases[0].separation_au.iter().zip(&track.cases[2].separation_au) {
            assert!(s30 + 1e-12 >= *s90);
        }
    }

    #[test]
    fn test_alternate_track_skips() {
        let ctx = synthetic_context();
        let mut r = target();
        r.inclination_deg = Measurement::with_errors(80.0, 2.0, -2.0);
        assert!(matches!(
            alternate_inclination_track(&r, &ctx, DEFAULT_EPOCH_JD),
            Err(SimulationError::InclinationKnown { .. })
        ));

        let mut r = target();
        r.stellar_mass_msun = Measurement::missing();
        assert!(matches!(
            alternate_inclination_track(&r, &ctx, DEFAULT_EPOCH_JD),
            Err(SimulationError::NoPeriod { .. })
        ));
    }
}

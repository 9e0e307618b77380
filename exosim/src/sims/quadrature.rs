//! Quadrature photometry
//!
//! Brightness of each target at quadrature (phase angle 90°) for every cloud
//! level and band of the grid. When eccentricity and argument of periapsis
//! are known and the orbit is not face-on, both quadrature points
//! (ν = -ω and ν = π - ω) are evaluated and the brighter one kept; otherwise
//! the planet is placed at the semi-major axis.

use std::f64::consts::PI;

use exocatalog::TargetRecord;

use super::SimulationError;
use crate::algo::stats::FiniteSummary;
use crate::context::ObservatoryContext;
use crate::orbit::orbital_radius;
use crate::photometry::dmag::{delta_mag_rjup_au, finite_or_nan};

/// Photometry at one quadrature point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraturePoint {
    /// Band-averaged albedo times phase function
    pub p_phi: f64,
    pub dmag: f64,
    /// Star-planet distance divided by √L (AU), the grid's distance coordinate
    pub scaled_radius_au: f64,
}

/// Quadrature values for one band across all cloud levels
#[derive(Debug, Clone, PartialEq)]
pub struct BandQuadrature {
    pub label: String,
    /// One entry per grid cloud level
    pub per_cloud: Vec<QuadraturePoint>,
    pub dmag_min: f64,
    pub dmag_max: f64,
    pub dmag_median: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureResult {
    pub name: String,
    pub clouds: Vec<f64>,
    pub bands: Vec<BandQuadrature>,
}

/// Eccentricity and both quadrature true anomalies, when the orbit geometry
/// allows choosing between them
fn quadrature_anomalies(record: &TargetRecord) -> Option<(f64, [f64; 2])> {
    let e = record.eccentricity.known()?;
    let w = record.periapsis_arg_deg.known()?.to_radians();
    if record.inclination_deg.value == Some(0.0) {
        return None;
    }
    Some((e, [-w, PI - w]))
}

/// Quadrature pΦ and Δmag for every band and cloud level.
///
/// The grid's distance axis is looked up at r/√L, but Δmag uses the physical
/// star-planet distance r. The scaled value is kept as `scaled_radius_au`.
pub fn quadrature_photometry(
    record: &TargetRecord,
    ctx: &ObservatoryContext,
) -> Result<QuadratureResult, SimulationError> {
    let a = record
        .sma_au
        .known()
        .ok_or_else(|| SimulationError::missing(record, "semi-major axis"))?;
    let radius = record.photometric_radius_rjup().unwrap_or(f64::NAN);
    let fe = record.metallicity_or_solar();
    let lum_fix = record.luminosity_scale();

    // Physical star-planet distances to evaluate
    let distances: Vec<f64> = match quadrature_anomalies(record) {
        Some((e, nus)) => nus.iter().map(|&nu| orbital_radius(a, e, nu)).collect(),
        None => vec![a],
    };

    let clouds = ctx.grid.clouds().to_vec();
    let mut bands = Vec::with_capacity(ctx.bands.len());
    for band in &ctx.bands {
        let mut per_cloud = Vec::with_capacity(clouds.len());
        for cloud in 0..clouds.len() {
            let mut best: Option<QuadraturePoint> = None;
            for &r in &distances {
                let scaled = r / lum_fix;
                let p_phi = ctx
                    .grid
                    .cell_with_cloud_index(fe, scaled, cloud)
                    .map_or(f64::NAN, |key| ctx.grid.quadrature_band_albedo(key, band));
                let p_phi = finite_or_nan(p_phi);
                let point = QuadraturePoint {
                    p_phi,
                    dmag: delta_mag_rjup_au(radius, r, p_phi),
                    scaled_radius_au: scaled,
                };
                // The first point wins unless the second is strictly brighter
                best = match best {
                    Some(first) if first.dmag < point.dmag || point.dmag.is_nan() => Some(first),
                    _ => Some(point),
                };
            }
            if let Some(point) = best {
                per_cloud.push(point);
            }
        }

        let dmags: Vec<f64> = per_cloud.iter().map(|p| p.dmag).collect();
        let (dmag_min, dmag_max, dmag_median) = FiniteSummary::new(&dmags).or_nan();
        bands.push(BandQuadrature {
            label: band.label(),
            per_cloud,
            dmag_min,
            dmag_max,
            dmag_median,
        });
    }

    Ok(QuadratureResult {
        name: record.name.clone(),
        clouds,
        bands,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::synthetic_context;
    use crate::units::rjup_to_au;
    use approx::assert_relative_eq;
    use exocatalog::Measurement;

    fn target() -> TargetRecord {
        let mut r = TargetRecord::named("Test b", "Test");
        r.sma_au = Measurement::new(2.0);
        r.distance_pc = Measurement::new(10.0);
        r.radius_rjup = Measurement::new(1.0);
        r
    }

    #[test]
    fn test_circular_fallback() {
        let ctx = synthetic_context();
        let result = quadrature_photometry(&target(), &ctx).unwrap();
        assert_eq!(result.bands.len(), 5);
        assert_eq!(result.clouds.len(), 4);

        let band = &result.bands[0];
        let point = band.per_cloud[0];
        assert_eq!(point.scaled_radius_au, 2.0);
        let ratio = rjup_to_au(1.0) / 2.0;
        assert_relative_eq!(
            point.dmag,
            -2.5 * (ratio * ratio * point.p_phi).log10(),
            max_relative = 1e-12
        );
        assert!(band.dmag_min <= band.dmag_median && band.dmag_median <= band.dmag_max);
    }

    #[test]
    fn test_picks_brighter_quadrature() {
        let ctx = synthetic_context();
        let mut r = target();
        r.eccentricity = Measurement::new(0.5);
        r.periapsis_arg_deg = Measurement::new(0.0);
        let result = quadrature_photometry(&r, &ctx).unwrap();
        // ν = 0 puts the planet at periapsis, 1 AU, instead of 3 AU
        for band in &result.bands {
            for point in &band.per_cloud {
                assert_relative_eq!(point.scaled_radius_au, 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_face_on_uses_sma() {
        let ctx = synthetic_context();
        let mut r = target();
        r.eccentricity = Measurement::new(0.5);
        r.periapsis_arg_deg = Measurement::new(0.0);
        r.inclination_deg = Measurement::new(0.0);
        let result = quadrature_photometry(&r, &ctx).unwrap();
        assert_eq!(result.bands[0].per_cloud[0].scaled_radius_au, 2.0);
    }

    #[test]
    fn test_luminosity_scaling() {
        let ctx = synthetic_context();
        let mut r = target();
        r.luminosity_log = Measurement::new(2.0);
        let result = quadrature_photometry(&r, &ctx).unwrap();
        assert_relative_eq!(result.bands[0].per_cloud[0].scaled_radius_au, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_dmag_uses_physical_distance() {
        let ctx = synthetic_context();
        let mut r = target();
        r.eccentricity = Measurement::new(0.5);
        r.periapsis_arg_deg = Measurement::new(0.0);
        r.luminosity_log = Measurement::new(2.0);
        let result = quadrature_photometry(&r, &ctx).unwrap();

        // Periapsis at 1 AU, looked up at 0.1 AU on the grid
        let point = result.bands[0].per_cloud[0];
        assert_relative_eq!(point.scaled_radius_au, 0.1, epsilon = 1e-12);
        let ratio = rjup_to_au(1.0) / 1.0;
        assert_relative_eq!(
            point.dmag,
            -2.5 * (ratio * ratio * point.p_phi).log10(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_missing_radius_gives_nan() {
        let ctx = synthetic_context();
        let mut r = target();
        r.radius_rjup = Measurement::missing();
        let result = quadrature_photometry(&r, &ctx).unwrap();
        assert!(result.bands[0].dmag_min.is_nan());
        assert!(result.bands[0].per_cloud[0].p_phi.is_finite());
    }

    #[test]
    fn test_missing_sma_is_error() {
        let ctx = synthetic_context();
        let mut r = target();
        r.sma_au = Measurement::missing();
        assert!(matches!(
            quadrature_photometry(&r, &ctx),
            Err(SimulationError::MissingParameter { .. })
        ));
    }
}

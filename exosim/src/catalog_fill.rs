//! Derived catalog columns
//!
//! Fills the gaps a composite catalog leaves before any photometry runs:
//! semi-major axes from periods, angular separations and their bounds, model
//! radii for planets whose catalog radius is itself a calculated value, and
//! host luminosities from the stellar sequence. Records are updated in place.

use exocatalog::{Measurement, TargetRecord};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::algo::stats::finite_std_dev;
use crate::orbit::{sma_from_period, working_angle_mas};
use crate::photometry::StellarSequence;
use crate::planet::{radius_from_mass, StructureModel};
use crate::units::{mjup_to_mearth, rearth_to_rjup, AU_PER_PARSEC, MAS_PER_RAD};

/// Monte-Carlo draws used for model-radius uncertainties
pub const RADIUS_ERROR_DRAWS: usize = 10_000;

/// Semi-major axis and 1σ error from period (days) and stellar mass (M☉),
/// propagating both uncertainties to first order. The error is `None`
/// unless both input uncertainties are known.
pub fn sma_with_error(
    period_days: f64,
    period_sigma: Option<f64>,
    stellar_mass: f64,
    stellar_mass_sigma: Option<f64>,
) -> (f64, Option<f64>) {
    let a = sma_from_period(period_days, stellar_mass);
    let sigma = match (period_sigma, stellar_mass_sigma) {
        (Some(st), Some(sm)) => {
            let dt = 2.0 * st / (3.0 * period_days);
            let dm = sm / (3.0 * stellar_mass);
            Some(a * (dt * dt + dm * dm).sqrt())
        }
        _ => None,
    };
    (a, sigma)
}

/// 1σ error of atan(a/d) in mas for `a` in AU and `d` in pc
pub fn working_angle_sigma(sma_au: f64, sma_sigma: f64, distance_pc: f64, distance_sigma: f64) -> f64 {
    let a = sma_au;
    let d = distance_pc * AU_PER_PARSEC;
    let sd = distance_sigma * AU_PER_PARSEC;
    let num = a * a * sd * sd + d * d * sma_sigma * sma_sigma;
    let den = (a * a + d * d).powi(2);
    (num / den).sqrt() * MAS_PER_RAD
}

fn normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    mean + std * z
}

/// Gap filler with its optional model inputs
#[derive(Debug)]
pub struct CatalogFiller {
    structure: Option<StructureModel>,
    stellar: Option<StellarSequence>,
    error_draws: usize,
}

impl CatalogFiller {
    pub fn new(structure: Option<StructureModel>, stellar: Option<StellarSequence>) -> Self {
        Self {
            structure,
            stellar,
            error_draws: RADIUS_ERROR_DRAWS,
        }
    }

    pub fn with_error_draws(mut self, draws: usize) -> Self {
        self.error_draws = draws;
        self
    }

    /// Fill every derived column of one record
    pub fn fill<R: Rng + ?Sized>(&self, record: &mut TargetRecord, rng: &mut R) {
        fill_sma(record);
        fill_angular_separation(record);
        self.fill_forecaster_radius(record, rng);
        self.fill_structure_radius(record, rng);
        fill_separation_bounds(record);
        if let Some(stellar) = &self.stellar {
            fill_luminosity(stellar, record);
        }
    }

    pub fn fill_all<R: Rng + ?Sized>(&self, records: &mut [TargetRecord], rng: &mut R) {
        for record in records.iter_mut() {
            self.fill(record, rng);
        }
        let calculated = records.iter().filter(|r| r.radius_calculated).count();
        let sma = records.iter().filter(|r| r.derived.sma_calculated).count();
        log::info!(
            "Filled {} records ({} model radii, {} semi-major axes from period)",
            records.len(),
            calculated,
            sma
        );
    }

    /// Power-law forecaster radius. Measured radii are copied through.
    pub fn fill_forecaster_radius<R: Rng + ?Sized>(&self, record: &mut TargetRecord, rng: &mut R) {
        if !record.radius_calculated {
            record.derived.radius_forecaster_rjup = record.radius_rjup;
            return;
        }
        let Some(mass) = record.mass_mjup.known().map(mjup_to_mearth) else {
            record.derived.radius_forecaster_rjup = Measurement::missing();
            return;
        };
        let radius = rearth_to_rjup(radius_from_mass(mass));
        let sigma = record.mass_mjup.sigma().map(|s| {
            let s = mjup_to_mearth(s);
            let draws: Vec<f64> = (0..self.error_draws)
                .map(|_| radius_from_mass(normal(rng, mass, s)))
                .collect();
            rearth_to_rjup(finite_std_dev(&draws))
        });

        let mut m = Measurement::missing();
        m.set(radius, sigma);
        record.derived.radius_forecaster_rjup = m;
    }

    /// Rock/iron or giant-grid radius. Measured radii are copied through.
    ///
    /// The error comes from joint (mass, sma) draws, treating missing
    /// uncertainties as zero and redrawing non-positive masses.
    pub fn fill_structure_radius<R: Rng + ?Sized>(&self, record: &mut TargetRecord, rng: &mut R) {
        if !record.radius_calculated {
            record.derived.radius_fortney_rjup = record.radius_rjup;
            return;
        }
        record.derived.radius_fortney_rjup = Measurement::missing();
        let Some(model) = &self.structure else {
            return;
        };
        let (Some(mass), Some(sma)) = (
            record.mass_mjup.known().map(mjup_to_mearth).filter(|m| *m > 0.0),
            record.sma_au.known(),
        ) else {
            return;
        };

        let mass_sigma = record.mass_mjup.sigma().map_or(0.0, mjup_to_mearth);
        let sma_sigma = record.sma_au.sigma().unwrap_or(0.0);
        let draws: Vec<f64> = (0..self.error_draws)
            .map(|_| {
                let a = normal(rng, sma, sma_sigma);
                let mut m = normal(rng, mass, mass_sigma);
                while m <= 0.0 {
                    m = normal(rng, mass, mass_sigma);
                }
                model.radius(m, a)
            })
            .collect();

        let radius = rearth_to_rjup(model.radius(mass, sma));
        let mut m = Measurement::missing();
        m.set(radius, Some(rearth_to_rjup(finite_std_dev(&draws))));
        record.derived.radius_fortney_rjup = m;
    }
}

/// Semi-major axis from period and stellar mass when the catalog has none
pub fn fill_sma(record: &mut TargetRecord) -> bool {
    if record.sma_au.is_known() {
        return false;
    }
    let (Some(period), Some(mstar)) = (record.period_days.known(), record.stellar_mass_msun.known())
    else {
        return false;
    };
    let (a, sigma) = sma_with_error(
        period,
        record.period_days.sigma(),
        mstar,
        record.stellar_mass_msun.sigma(),
    );
    record.sma_au.set(a, sigma);
    record.derived.sma_calculated = true;
    true
}

/// Angular separation of the semi-major axis and its error
pub fn fill_angular_separation(record: &mut TargetRecord) {
    let (Some(a), Some(d)) = (record.sma_au.known(), record.distance_pc.known()) else {
        record.derived.angular_separation_mas = Measurement::missing();
        return;
    };
    let sigma = match (record.sma_au.sigma(), record.distance_pc.sigma()) {
        (Some(sa), Some(sd)) => Some(working_angle_sigma(a, sa, d, sd)),
        _ => None,
    };
    let mut wa = Measurement::missing();
    wa.set(working_angle_mas(a, d), sigma);
    record.derived.angular_separation_mas = wa;
}

/// Smallest and largest possible angular separations (mas).
///
/// The maximum is the apoapsis separation when e is known, otherwise the
/// semi-major axis separation. The minimum scales the periapsis distance by
/// |cos I| and is zero when I is unknown.
pub fn separation_bounds_mas(record: &TargetRecord) -> Option<(f64, f64)> {
    let a = record.sma_au.known()?;
    let d = record.distance_pc.known()?;
    let e = record.eccentricity.known();
    let max_sep = a * (1.0 + e.unwrap_or(0.0));
    let min_sep = match record.inclination_deg.known() {
        Some(inc) => a * (1.0 - e.unwrap_or(0.0)) * inc.to_radians().cos().abs(),
        None => 0.0,
    };
    Some((working_angle_mas(min_sep, d), working_angle_mas(max_sep, d)))
}

pub fn fill_separation_bounds(record: &mut TargetRecord) {
    let bounds = separation_bounds_mas(record);
    record.derived.min_angular_separation_mas = bounds.map(|b| b.0);
    record.derived.max_angular_separation_mas = bounds.map(|b| b.1);
}

/// Host luminosity from temperature or spectral type when absent
pub fn fill_luminosity(stellar: &StellarSequence, record: &mut TargetRecord) -> bool {
    if record.luminosity_log.is_known() {
        return false;
    }
    let teff = record.effective_temperature_k.known();
    match stellar.log_luminosity(teff, record.spectral_type.as_deref()) {
        Some(log_l) => {
            record.luminosity_log = Measurement::new(log_l);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photometry::stellar::tests::SEQUENCE_CSV;
    use crate::planet::fortney::tests::GIANT_GRID_CSV;
    use crate::planet::rock_iron_radius;
    use approx::assert_relative_eq;
    use exocatalog::MassProvenance;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn filler() -> CatalogFiller {
        CatalogFiller::new(
            Some(StructureModel::from_reader(GIANT_GRID_CSV.as_bytes()).unwrap()),
            Some(StellarSequence::from_reader(SEQUENCE_CSV.as_bytes()).unwrap()),
        )
        .with_error_draws(2_000)
    }

    fn giant() -> TargetRecord {
        let mut r = TargetRecord::named("HD 1 b", "HD 1");
        r.distance_pc = Measurement::with_errors(10.0, 0.1, -0.1);
        r.sma_au = Measurement::with_errors(3.0, 0.1, -0.1);
        r.mass_mjup = Measurement::with_errors(1.0, 0.1, -0.1);
        r.mass_provenance = MassProvenance::Msini;
        r.radius_calculated = true;
        r
    }

    #[test]
    fn test_sma_from_period() {
        let mut r = TargetRecord::named("b", "a");
        r.period_days = Measurement::with_errors(365.25, 1.0, -1.0);
        r.stellar_mass_msun = Measurement::with_errors(1.0, 0.03, -0.03);
        assert!(fill_sma(&mut r));
        assert!(r.derived.sma_calculated);
        assert_relative_eq!(r.sma_au.known().unwrap(), 1.0, max_relative = 1e-3);
        // 2/3 of the 0.27% period error and 1/3 of the 3% mass error
        let expected = (2.0 / 3.0 / 365.25f64).hypot(0.01);
        assert_relative_eq!(r.sma_au.sigma().unwrap(), expected, max_relative = 1e-2);
        assert!(!fill_sma(&mut r), "known sma is left alone");
    }

    #[test]
    fn test_sma_error_needs_both_sigmas() {
        let (_, sigma) = sma_with_error(100.0, Some(1.0), 1.0, None);
        assert!(sigma.is_none());
    }

    #[test]
    fn test_angular_separation() {
        let mut r = giant();
        fill_angular_separation(&mut r);
        let wa = r.derived.angular_separation_mas;
        assert_relative_eq!(wa.known().unwrap(), 300.0, max_relative = 1e-6);
        // Distance error dominates: σ ≈ WA·σ_d/d ⊕ WA·σ_a/a
        let expected = 300.0 * (0.01f64).hypot(0.1 / 3.0);
        assert_relative_eq!(wa.sigma().unwrap(), expected, max_relative = 1e-4);
    }

    #[test]
    fn test_separation_bounds() {
        let mut r = giant();
        fill_separation_bounds(&mut r);
        assert_eq!(r.derived.min_angular_separation_mas, Some(0.0));
        assert_relative_eq!(
            r.derived.max_angular_separation_mas.unwrap(),
            300.0,
            max_relative = 1e-6
        );

        r.eccentricity = Measurement::new(0.5);
        r.inclination_deg = Measurement::new(120.0);
        fill_separation_bounds(&mut r);
        assert_relative_eq!(
            r.derived.max_angular_separation_mas.unwrap(),
            450.0,
            max_relative = 1e-6
        );
        assert_relative_eq!(
            r.derived.min_angular_separation_mas.unwrap(),
            75.0,
            max_relative = 1e-6
        );
    }

    #[test]
    fn test_forecaster_radius() {
        let mut r = giant();
        let mut rng = StdRng::seed_from_u64(3);
        filler().fill_forecaster_radius(&mut r, &mut rng);
        let radius = r.derived.radius_forecaster_rjup;
        assert_relative_eq!(
            radius.known().unwrap(),
            rearth_to_rjup(radius_from_mass(mjup_to_mearth(1.0))),
            epsilon = 1e-12
        );
        assert!(radius.sigma().unwrap() >= 0.0);
    }

    #[test]
    fn test_measured_radius_copied() {
        let mut r = giant();
        r.radius_calculated = false;
        r.radius_rjup = Measurement::with_errors(1.2, 0.1, -0.05);
        let mut rng = StdRng::seed_from_u64(3);
        let f = filler();
        f.fill_forecaster_radius(&mut r, &mut rng);
        f.fill_structure_radius(&mut r, &mut rng);
        assert_eq!(r.derived.radius_forecaster_rjup, r.radius_rjup);
        assert_eq!(r.derived.radius_fortney_rjup, r.radius_rjup);
        assert_eq!(r.photometric_radius_rjup(), Some(1.2));
    }

    #[test]
    fn test_structure_radius_branches() {
        let mut rng = StdRng::seed_from_u64(5);
        let f = filler();

        let mut rocky = giant();
        rocky.mass_mjup = Measurement::new(10.0 / mjup_to_mearth(1.0));
        f.fill_structure_radius(&mut rocky, &mut rng);
        let radius = rocky.derived.radius_fortney_rjup;
        assert_relative_eq!(
            radius.known().unwrap(),
            rearth_to_rjup(rock_iron_radius(0.67, 10.0)),
            max_relative = 1e-9
        );
        assert_relative_eq!(radius.sigma().unwrap(), 0.0, epsilon = 1e-12);

        let mut gas = giant();
        f.fill_structure_radius(&mut gas, &mut rng);
        let r = gas.derived.radius_fortney_rjup.known().unwrap();
        assert!(r > 0.5 && r < 1.5, "giant radius {r}");
        assert!(gas.derived.radius_fortney_rjup.sigma().unwrap() > 0.0);
    }

    #[test]
    fn test_luminosity_fill() {
        let stellar = StellarSequence::from_reader(SEQUENCE_CSV.as_bytes()).unwrap();
        let mut r = giant();
        r.spectral_type = Some("K0V".into());
        assert!(fill_luminosity(&stellar, &mut r));
        assert_relative_eq!(r.luminosity_log.known().unwrap(), -0.34, epsilon = 1e-12);

        let mut unknown = giant();
        unknown.spectral_type = Some("WD".into());
        assert!(!fill_luminosity(&stellar, &mut unknown));
        assert!(!unknown.luminosity_log.is_known());
    }

    #[test]
    fn test_fill_is_seeded() {
        let f = filler();
        let mut a = vec![giant(), giant()];
        let mut b = a.clone();
        f.fill_all(&mut a, &mut StdRng::seed_from_u64(9));
        f.fill_all(&mut b, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}

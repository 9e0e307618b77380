//! Monte-Carlo detection completeness
//!
//! For each target the engine repeatedly draws `samples_per_iteration`
//! planets from the target's parameter uncertainties, propagates them to
//! (working angle, Δmag) and accumulates:
//!
//! - a 2D histogram over the configured working-angle and Δmag bins
//! - the fraction of samples inside the working-angle window and brighter
//!   than the contrast curve's limit at their working angle
//!
//! Completeness is the running mean of that fraction. Iteration stops when
//! the mean settles, when it is stuck at zero or negligibly small, or when
//! an optional iteration or time budget runs out.

use std::f64::consts::PI;
use std::time::{Duration, Instant};

use exocatalog::TargetRecord;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use super::orbit_data::critical_inclination;
use super::SimulationError;
use crate::algo::histogram::{Histogram2d, UniformAxis};
use crate::algo::kepler::true_anomaly;
use crate::algo::sampling::{Marginal, Sampler};
use crate::catalog_fill::separation_bounds_mas;
use crate::config::CompletenessConfig;
use crate::context::{ObservatoryContext, PhaseCurveCache};
use crate::orbit::{orbital_radius, phase_angle, projected_separation, working_angle_mas};
use crate::photometry::dmag::{delta_mag_rjup_au, sampled_phase_albedo};
use crate::photometry::CellKey;
use crate::planet::radius_from_mass;
use crate::units::{mjup_to_mearth, rearth_to_rjup};

/// Fractional spread used when a catalog value has no usable error bars
const FALLBACK_RELATIVE_STD: f64 = 0.01;

/// Fractional spread for planet size without error bars
const FALLBACK_SIZE_STD: f64 = 0.1;

/// Largest eccentricity a draw may take
const MAX_ECCENTRICITY: f64 = 0.99;

/// Largest radius (Jupiter radii) a mass-derived draw may take
const MAX_RADIUS_RJUP: f64 = 1.0;

/// How each sample's planet radius is obtained
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeModel {
    /// Radius drawn directly, in Jupiter radii
    Radius(Marginal),
    /// Mass drawn in Earth masses and converted with the power-law forecaster.
    /// Minimum masses are divided by sin(I) of the same sample.
    Mass { mass: Marginal, minimum_mass: bool },
}

impl SizeModel {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R, inclination: f64) -> f64 {
        match *self {
            SizeModel::Radius(radius) => radius.sample(rng),
            SizeModel::Mass { mass, minimum_mass } => {
                let mut m = mass.sample(rng);
                if minimum_mass {
                    m /= inclination.sin();
                }
                let r = rearth_to_rjup(radius_from_mass(m));
                if r > MAX_RADIUS_RJUP {
                    MAX_RADIUS_RJUP
                } else {
                    r
                }
            }
        }
    }
}

/// Sampling configuration for one target
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPriors {
    /// Semi-major axis (AU)
    pub sma: Marginal,
    pub eccentricity: Marginal,
    /// Inclination (rad)
    pub inclination: Marginal,
    /// Argument of periapsis (rad)
    pub periapsis_arg: Marginal,
    pub size: SizeModel,
    pub distance_pc: f64,
    /// [Fe/H] used for the grid lookup
    pub metallicity: f64,
    /// √L, dividing orbital radii before the grid's distance lookup
    pub luminosity_scale: f64,
}

/// Standard deviation from the catalog error bars, or a fraction of the value
/// when the bars are missing (or zero, if `zero_is_missing`)
fn sigma_or_fraction(sigma: Option<f64>, value: f64, fraction: f64, zero_is_missing: bool) -> f64 {
    match sigma {
        Some(s) if !(zero_is_missing && s == 0.0) => s,
        _ => value * fraction,
    }
}

impl TargetPriors {
    pub fn from_record(record: &TargetRecord) -> Result<Self, SimulationError> {
        let a = record
            .sma_au
            .known()
            .ok_or_else(|| SimulationError::missing(record, "semi-major axis"))?;
        let distance_pc = record
            .distance_pc
            .known()
            .ok_or_else(|| SimulationError::missing(record, "distance"))?;

        let sma = Marginal::clipped(
            Sampler::Normal {
                mean: a,
                std: sigma_or_fraction(record.sma_au.sigma(), a, FALLBACK_RELATIVE_STD, false),
            },
            0.0,
            f64::INFINITY,
        );

        let eccentricity = match record.eccentricity.known() {
            None => Marginal::new(Sampler::unknown_eccentricity()),
            Some(e) => Marginal::clipped(
                Sampler::Normal {
                    mean: e,
                    std: sigma_or_fraction(record.eccentricity.sigma(), e, FALLBACK_RELATIVE_STD, true),
                },
                0.0,
                MAX_ECCENTRICITY,
            ),
        };

        let inc = &record.inclination_deg;
        let unconstrained_edge_on =
            inc.value == Some(90.0) && inc.err_upper == Some(0.0) && inc.err_lower == Some(0.0);
        let inclination = match inc.known() {
            Some(i) if !unconstrained_edge_on => {
                let mean = i.to_radians();
                let std = inc.sigma().map(f64::to_radians);
                Marginal::new(Sampler::Normal {
                    mean,
                    std: sigma_or_fraction(std, mean, FALLBACK_RELATIVE_STD, true),
                })
            }
            _ if record.mass_provenance.is_minimum_mass() && record.mass_mjup.is_known() => {
                let icrit = critical_inclination(record);
                Marginal::new(Sampler::SineRestricted {
                    lo: icrit,
                    hi: PI - icrit,
                })
            }
            _ => Marginal::new(Sampler::isotropic_inclination()),
        };

        let periapsis_arg = match record.periapsis_arg_deg.known() {
            None => Marginal::new(Sampler::uniform_angle()),
            Some(w) => {
                let mean = w.to_radians();
                let std = record.periapsis_arg_deg.sigma().map(f64::to_radians);
                Marginal::new(Sampler::Normal {
                    mean,
                    std: sigma_or_fraction(std, mean, FALLBACK_RELATIVE_STD, true),
                })
            }
        };

        let size = if record.radius_calculated {
            let m = record
                .mass_mjup
                .known()
                .map(mjup_to_mearth)
                .ok_or_else(|| SimulationError::missing(record, "mass"))?;
            let std = record.mass_mjup.sigma().map(mjup_to_mearth);
            SizeModel::Mass {
                mass: Marginal::new(Sampler::Normal {
                    mean: m,
                    std: sigma_or_fraction(std, m, FALLBACK_SIZE_STD, false),
                }),
                minimum_mass: record.mass_provenance.is_minimum_mass(),
            }
        } else {
            let r = record
                .radius_rjup
                .known()
                .ok_or_else(|| SimulationError::missing(record, "radius"))?;
            SizeModel::Radius(Marginal::new(Sampler::Normal {
                mean: r,
                std: sigma_or_fraction(record.radius_rjup.sigma(), r, FALLBACK_SIZE_STD, false),
            }))
        };

        Ok(Self {
            sma,
            eccentricity,
            inclination,
            periapsis_arg,
            size,
            distance_pc,
            metallicity: record.metallicity_or_solar(),
            luminosity_scale: record.luminosity_scale(),
        })
    }
}

/// Why a target's iteration stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Relative change of the running mean fell below tolerance
    Converged,
    /// Completeness was exactly zero, or the target never enters the window
    Undetectable,
    /// Completeness stayed below the diminishing-returns threshold
    DiminishingReturns,
    IterationBudget,
    TimeBudget,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TerminationReason::Converged => "converged",
            TerminationReason::Undetectable => "undetectable",
            TerminationReason::DiminishingReturns => "diminishing_returns",
            TerminationReason::IterationBudget => "iteration_budget",
            TerminationReason::TimeBudget => "time_budget",
        };
        f.write_str(s)
    }
}

/// Populated extent of a completeness histogram
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBounds {
    pub min_working_angle_mas: f64,
    pub max_working_angle_mas: f64,
    pub min_dmag: f64,
    pub max_dmag: f64,
}

/// One nonzero histogram cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramRow {
    pub name: String,
    /// Bin-centre working angle (mas)
    pub alpha: f64,
    /// Bin-centre Δmag
    pub dmag: f64,
    /// log10 of the normalized bin probability
    pub log_h: f64,
    pub iind: usize,
    pub jind: usize,
}

#[derive(Debug, Clone)]
pub struct CompletenessResult {
    pub name: String,
    pub completeness: f64,
    pub iterations: usize,
    pub termination: TerminationReason,
    pub working_angle_axis: UniformAxis,
    pub dmag_axis: UniformAxis,
    /// Bin probabilities indexed `[working angle, Δmag]`, kept only when
    /// completeness is nonzero
    pub histogram: Option<Array2<f64>>,
    pub elapsed: Duration,
}

impl CompletenessResult {
    /// Floor/ceil of the smallest and largest populated bin centres
    pub fn bounds(&self) -> Option<HistogramBounds> {
        let h = self.histogram.as_ref()?;
        let mut wa = (f64::INFINITY, f64::NEG_INFINITY);
        let mut dm = (f64::INFINITY, f64::NEG_INFINITY);
        for ((i, j), &v) in h.indexed_iter() {
            if v == 0.0 {
                continue;
            }
            let x = self.working_angle_axis.center(i);
            let y = self.dmag_axis.center(j);
            wa = (wa.0.min(x), wa.1.max(x));
            dm = (dm.0.min(y), dm.1.max(y));
        }
        wa.0.is_finite().then(|| HistogramBounds {
            min_working_angle_mas: wa.0.floor(),
            max_working_angle_mas: wa.1.ceil(),
            min_dmag: dm.0.floor(),
            max_dmag: dm.1.ceil(),
        })
    }

    /// Nonzero cells in working-angle-major order
    pub fn rows(&self) -> Vec<HistogramRow> {
        let Some(h) = self.histogram.as_ref() else {
            return Vec::new();
        };
        h.indexed_iter()
            .filter(|(_, &v)| v != 0.0)
            .map(|((i, j), &v)| HistogramRow {
                name: self.name.clone(),
                alpha: self.working_angle_axis.center(i),
                dmag: self.dmag_axis.center(j),
                log_h: v.log10(),
                iind: i,
                jind: j,
            })
            .collect()
    }

    /// Sum of all bin probabilities, zero without a histogram
    pub fn histogram_mass(&self) -> f64 {
        self.histogram.as_ref().map_or(0.0, |h| h.sum())
    }
}

/// Per-sample scratch reused across iterations
#[derive(Debug, Default)]
struct SampleBuffers {
    radius_au: Vec<f64>,
    separation_au: Vec<f64>,
    phase_deg: Vec<f64>,
    planet_radius: Vec<f64>,
    cloud: Vec<usize>,
}

impl SampleBuffers {
    fn with_capacity(n: usize) -> Self {
        Self {
            radius_au: Vec::with_capacity(n),
            separation_au: Vec::with_capacity(n),
            phase_deg: Vec::with_capacity(n),
            planet_radius: Vec::with_capacity(n),
            cloud: Vec::with_capacity(n),
        }
    }

    fn clear(&mut self) {
        self.radius_au.clear();
        self.separation_au.clear();
        self.phase_deg.clear();
        self.planet_radius.clear();
        self.cloud.clear();
    }
}

/// Completeness estimator over a shared read-only context
pub struct CompletenessEngine<'a> {
    ctx: &'a ObservatoryContext,
    config: CompletenessConfig,
}

impl<'a> CompletenessEngine<'a> {
    pub fn new(ctx: &'a ObservatoryContext, config: CompletenessConfig) -> Self {
        Self { ctx, config }
    }

    pub fn config(&self) -> &CompletenessConfig {
        &self.config
    }

    /// Whether any part of the target's separation range falls inside the
    /// working-angle window. Targets without bounds are not candidates.
    pub fn is_candidate(&self, record: &TargetRecord) -> bool {
        let bounds = match (
            record.derived.min_angular_separation_mas,
            record.derived.max_angular_separation_mas,
        ) {
            (Some(lo), Some(hi)) => Some((lo, hi)),
            _ => separation_bounds_mas(record),
        };
        bounds.is_some_and(|(lo, hi)| {
            hi > self.config.min_working_angle_mas && lo < self.config.max_working_angle_mas
        })
    }

    fn empty_result(&self, record: &TargetRecord, elapsed: Duration) -> CompletenessResult {
        CompletenessResult {
            name: record.name.clone(),
            completeness: 0.0,
            iterations: 0,
            termination: TerminationReason::Undetectable,
            working_angle_axis: self.config.working_angle_axis(),
            dmag_axis: self.config.dmag_axis(),
            histogram: None,
            elapsed,
        }
    }

    /// Run one target to termination with its own seeded generator
    pub fn run(&self, record: &TargetRecord, seed: u64) -> Result<CompletenessResult, SimulationError> {
        let start = Instant::now();
        if !self.is_candidate(record) {
            log::debug!("{}: never inside the working-angle window", record.name);
            return Ok(self.empty_result(record, start.elapsed()));
        }
        let priors = TargetPriors::from_record(record)?;

        let cfg = &self.config;
        let n = cfg.samples_per_iteration.max(1);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut hist = Histogram2d::new(cfg.working_angle_axis(), cfg.dmag_axis());
        let mut buffers = SampleBuffers::with_capacity(n);
        let mut cache = PhaseCurveCache::new();
        let max_duration = cfg.max_duration();

        let mut c = 0.0;
        let mut k = 0usize;
        let termination = loop {
            let detected = self.iterate(&priors, n, &mut rng, &mut buffers, &mut cache, &mut hist);
            k += 1;
            let current = detected as f64 / n as f64;
            let previous = c;
            c = if k == 1 {
                current
            } else {
                ((k - 1) as f64 * c + current) / k as f64
            };
            let pdiff = if c == 0.0 {
                1.0
            } else {
                (c - previous).abs() / c
            };
            log::debug!("{} iteration {k}: pdiff {pdiff:.5e}, c {c:.5e}", record.name);

            if c == 0.0 && k > cfg.zero_exit_after {
                break TerminationReason::Undetectable;
            }
            if c < cfg.diminishing_threshold && k > cfg.diminishing_after {
                break TerminationReason::DiminishingReturns;
            }
            if pdiff <= cfg.relative_tolerance && k >= cfg.min_iterations {
                break TerminationReason::Converged;
            }
            if cfg.max_iterations.is_some_and(|max| k >= max) {
                log::warn!("{}: iteration budget of {k} reached at c = {c:.5e}", record.name);
                break TerminationReason::IterationBudget;
            }
            if max_duration.is_some_and(|d| start.elapsed() >= d) {
                log::warn!("{}: time budget reached after {k} iterations", record.name);
                break TerminationReason::TimeBudget;
            }
        };

        let histogram = (c != 0.0).then(|| hist.normalized((n * k) as f64));
        let result = CompletenessResult {
            name: record.name.clone(),
            completeness: c,
            iterations: k,
            termination,
            working_angle_axis: *hist.x_axis(),
            dmag_axis: *hist.y_axis(),
            histogram,
            elapsed: start.elapsed(),
        };
        log::info!(
            "{}: completeness {:.5e} after {} iterations ({})",
            result.name,
            result.completeness,
            result.iterations,
            result.termination
        );
        Ok(result)
    }

    /// Draw one batch of `n` planets, bin them and count detections
    fn iterate(
        &self,
        priors: &TargetPriors,
        n: usize,
        rng: &mut StdRng,
        buf: &mut SampleBuffers,
        cache: &mut PhaseCurveCache,
        hist: &mut Histogram2d,
    ) -> usize {
        let ctx = self.ctx;
        buf.clear();
        let mut unconverged = 0usize;

        for _ in 0..n {
            let a = priors.sma.sample(rng);
            let e = priors.eccentricity.sample(rng);
            let inc = priors.inclination.sample(rng);
            let w = priors.periapsis_arg.sample(rng);
            let cloud = ctx.clouds.sample_index(rng);
            let size = priors.size.sample(rng, inc);
            let m: f64 = rng.gen_range(0.0..std::f64::consts::TAU);

            let solution = ctx.kepler.solve(m, e);
            if !solution.converged {
                unconverged += 1;
            }
            let nu = true_anomaly(solution.eccentric_anomaly, e);
            let r = orbital_radius(a, e, nu);
            buf.radius_au.push(r);
            buf.separation_au.push(projected_separation(r, nu, inc, w));
            buf.phase_deg.push(phase_angle(nu, inc, w).to_degrees());
            buf.planet_radius.push(size);
            buf.cloud.push(cloud);
        }
        if unconverged > 0 {
            log::warn!("Kepler solver did not converge for {unconverged} of {n} samples");
        }

        // Grid distance is snapped once per batch at the mean orbital radius
        let mean_r = buf.radius_au.iter().sum::<f64>() / n as f64;
        let scaled = mean_r / priors.luminosity_scale;
        let keys: Vec<Option<CellKey>> = ctx
            .clouds
            .values()
            .iter()
            .map(|&fsed| ctx.grid.cell(priors.metallicity, scaled, fsed))
            .collect();

        let (wa_min, wa_max) = (
            self.config.min_working_angle_mas,
            self.config.max_working_angle_mas,
        );
        let mut detected = 0;
        let mut missing = 0usize;
        for i in 0..n {
            let p_phi = keys[buf.cloud[i]].map_or(f64::NAN, |key| {
                cache.evaluate(ctx, key, 0, buf.phase_deg[i])
            });
            let p_phi = sampled_phase_albedo(p_phi);
            if p_phi.is_nan() {
                missing += 1;
            }
            let dmag = delta_mag_rjup_au(buf.planet_radius[i], buf.radius_au[i], p_phi);
            let wa = working_angle_mas(buf.separation_au[i], priors.distance_pc);
            hist.add(wa, dmag);
            if wa >= wa_min && wa <= wa_max && dmag <= ctx.contrast.dmag_limit(wa) {
                detected += 1;
            }
        }
        if missing > 0 {
            log::warn!("No albedo for {missing} of {n} samples, treated as NaN");
        }
        detected
    }

    /// Run every record, each seeded from a master generator in record order.
    ///
    /// Targets that cannot be sampled are logged and left out. `on_done` is
    /// called once per finished target, successful or not.
    pub fn run_batch<F>(
        &self,
        records: &[TargetRecord],
        master_seed: u64,
        serial: bool,
        on_done: F,
    ) -> Vec<CompletenessResult>
    where
        F: Fn() + Sync,
    {
        let mut master = StdRng::seed_from_u64(master_seed);
        let jobs: Vec<(&TargetRecord, u64)> =
            records.iter().map(|r| (r, master.gen::<u64>())).collect();

        let run_one = |&(record, seed): &(&TargetRecord, u64)| {
            let outcome = self.run(record, seed);
            on_done();
            match outcome {
                Ok(result) => Some(result),
                Err(e) => {
                    log::warn!("Skipping target: {e}");
                    None
                }
            }
        };

        if serial {
            jobs.iter().filter_map(run_one).collect()
        } else {
            jobs.par_iter().filter_map(run_one).collect()
        }
    }
}

//! End-to-end run on a synthetic albedo table and a three-planet catalog

use std::fmt::Write as _;
use std::path::Path;

use clap::Parser;
use exosim::io::{write_completeness_summary, write_histograms, write_orbits, write_quadrature};
use exosim::photometry::GridData;
use exosim::shared_args::SharedSimulationArgs;
use exosim::sims::{orbit_track, quadrature_photometry, CompletenessEngine, TerminationReason, DEFAULT_EPOCH_JD};
use exosim::SimulationConfig;
use tempfile::tempdir;

fn albedo_table() -> String {
    let mut out = String::from("metallicity,distance,cloud,phase,wavelength,albedo\n");
    for fe in [0.0, 0.5] {
        for d in [0.5, 1.0, 5.0] {
            for cloud in [0.0, 1.0, 3.0, 6.0] {
                for phase in (0..=18).map(|i| i as f64 * 10.0) {
                    for j in 0..=12 {
                        let w = 0.45 + j as f64 * 0.05;
                        let albedo = 0.2 + 0.05 * fe + 0.02 * d + 0.01 * cloud
                            + 0.15 * (1.0 + phase.to_radians().cos())
                            - 0.05 * w;
                        // Leave one sample out to exercise the wavelength fill
                        if fe == 0.5 && d == 5.0 && cloud == 6.0 && phase == 40.0 && j == 3 {
                            writeln!(out, "{fe},{d},{cloud},{phase},{w},").unwrap();
                        } else {
                            writeln!(out, "{fe},{d},{cloud},{phase},{w},{albedo}").unwrap();
                        }
                    }
                }
            }
        }
    }
    out
}

const CATALOG: &str = "\
pl_name,pl_hostname,pl_orbsmax,pl_orbeccen,pl_orbincl,pl_orbinclerr1,pl_orbinclerr2,pl_bmassj,pl_bmassprov,pl_radj,st_dist,st_mass
Far b,Far,3.2,0.0,90.0,1.0,-1.0,,,1.0,10.0,1.0
Close b,Close,0.5,,,,,1.0,Msini,,10.0,1.0
Lost b,Lost,2.0,,,,,1.0,Mass,,,1.0
";

fn write_inputs(dir: &Path) {
    let mut grid = GridData::from_long_table(albedo_table().as_bytes()).unwrap();
    assert_eq!(grid.fill_missing_wavelengths(), 1);
    grid.save_json(&dir.join("grid.json")).unwrap();

    std::fs::write(dir.join("contrast.txt"), "# lambda/D contrast\n1.0 1e-9\n20.0 1e-9\n").unwrap();
    std::fs::write(dir.join("planets.csv"), CATALOG).unwrap();

    let mut config = SimulationConfig::default();
    config.completeness.samples_per_iteration = 20_000;
    config.completeness.max_iterations = Some(6);
    config.save_to_file(&dir.join("config.json")).unwrap();
}

fn shared_args(dir: &Path) -> SharedSimulationArgs {
    let path = |name: &str| dir.join(name).to_string_lossy().into_owned();
    SharedSimulationArgs::parse_from([
        "pipeline".to_string(),
        "--grid".into(),
        path("grid.json"),
        "--contrast".into(),
        path("contrast.txt"),
        "--catalog".into(),
        path("planets.csv"),
        "--config".into(),
        path("config.json"),
        "--seed".into(),
        "9".into(),
    ])
}

#[test]
fn test_catalog_to_completeness_tables() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    let args = shared_args(dir.path());

    let config = args.load_config().unwrap();
    assert_eq!(config.completeness.samples_per_iteration, 20_000);
    let ctx = args.load_context(&config).unwrap();
    let filler = args.load_filler().unwrap();
    let targets = args.load_targets(&filler).unwrap();

    // "Lost b" has no distance
    let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Close b", "Far b"]);
    assert!(targets[0].derived.radius_forecaster_rjup.is_known());

    let quadrature: Vec<_> = targets
        .iter()
        .map(|t| quadrature_photometry(t, &ctx).unwrap())
        .collect();
    assert!(quadrature
        .iter()
        .all(|q| q.bands.iter().all(|b| b.dmag_min.is_finite())));
    let orbits: Vec<_> = targets
        .iter()
        .map(|t| orbit_track(t, &ctx, DEFAULT_EPOCH_JD).unwrap())
        .collect();

    let engine = CompletenessEngine::new(&ctx, config.completeness.clone());
    let results = engine.run_batch(&targets, args.seed, args.serial, || {});
    assert_eq!(results.len(), 2);

    let close = &results[0];
    assert_eq!(close.iterations, 0);
    assert_eq!(close.termination, TerminationReason::Undetectable);

    let far = &results[1];
    assert!(far.completeness > 0.3 && far.completeness < 1.0);
    assert!(far.iterations <= 6);
    assert!(far.histogram_mass() <= 1.0);

    let out = dir.path();
    assert_eq!(write_quadrature(&out.join("quad.csv"), &quadrature).unwrap(), 2 * 5 * 4);
    assert_eq!(write_orbits(&out.join("orbits.csv"), &orbits).unwrap(), 2 * 5 * 100);
    assert_eq!(
        write_histograms(&out.join("hist.csv"), &results).unwrap(),
        far.rows().len()
    );
    assert_eq!(write_completeness_summary(&out.join("summary.csv"), &results).unwrap(), 2);
}

#[test]
fn test_runs_are_reproducible() {
    let dir = tempdir().unwrap();
    write_inputs(dir.path());
    let args = shared_args(dir.path());
    let config = args.load_config().unwrap();
    let ctx = args.load_context(&config).unwrap();
    let targets = args.load_targets(&args.load_filler().unwrap()).unwrap();

    let engine = CompletenessEngine::new(&ctx, config.completeness);
    let first = engine.run_batch(&targets, 3, false, || {});
    let second = engine.run_batch(&targets, 3, true, || {});
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.completeness, b.completeness);
        assert_eq!(a.histogram, b.histogram);
    }
}

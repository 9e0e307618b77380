//! Engine configuration
//!
//! Defaults reproduce the standard completeness run: a 150-450 mas working
//! angle window binned at 1 mas, Δmag 0-26 at 0.1 mag and one million samples
//! per iteration. A run can override any field from a JSON file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::algo::histogram::UniformAxis;
use crate::algo::kepler::KeplerSolver;

/// Kepler solver tolerance and iteration cap
pub type KeplerConfig = KeplerSolver;

/// Completeness Monte-Carlo parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletenessConfig {
    pub samples_per_iteration: usize,

    /// Inner working angle (mas)
    pub min_working_angle_mas: f64,
    /// Outer working angle (mas)
    pub max_working_angle_mas: f64,
    pub working_angle_step_mas: f64,

    pub max_dmag: f64,
    pub dmag_step: f64,

    /// Stop once the running mean changes by less than this fraction
    pub relative_tolerance: f64,
    pub min_iterations: usize,

    /// Give up on zero completeness after more than this many iterations
    pub zero_exit_after: usize,
    /// Give up when completeness stays below `diminishing_threshold`
    /// after more than `diminishing_after` iterations
    pub diminishing_threshold: f64,
    pub diminishing_after: usize,

    /// Optional hard cap on iterations per target
    pub max_iterations: Option<usize>,
    /// Optional wall-clock cap per target (seconds)
    pub max_duration_secs: Option<f64>,
}

impl Default for CompletenessConfig {
    fn default() -> Self {
        Self {
            samples_per_iteration: 1_000_000,
            min_working_angle_mas: 150.0,
            max_working_angle_mas: 450.0,
            working_angle_step_mas: 1.0,
            max_dmag: 26.0,
            dmag_step: 0.1,
            relative_tolerance: 1e-4,
            min_iterations: 3,
            zero_exit_after: 2,
            diminishing_threshold: 1e-5,
            diminishing_after: 25,
            max_iterations: None,
            max_duration_secs: None,
        }
    }
}

impl CompletenessConfig {
    pub fn working_angle_axis(&self) -> UniformAxis {
        UniformAxis::spanning(
            self.min_working_angle_mas,
            self.max_working_angle_mas,
            self.working_angle_step_mas,
        )
    }

    pub fn dmag_axis(&self) -> UniformAxis {
        UniformAxis::spanning(0.0, self.max_dmag, self.dmag_step)
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_secs
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(Duration::from_secs_f64)
    }
}

/// Everything a simulation run can be configured with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub completeness: CompletenessConfig,
    pub kepler: KeplerConfig,
}

impl SimulationConfig {
    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Load from JSON file; absent fields keep their defaults
    pub fn load_from_file(path: &Path) -> Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_axes() {
        let config = CompletenessConfig::default();
        let wa = config.working_angle_axis();
        assert_eq!(wa.bins, 300);
        assert_eq!(wa.edge(0), 150.0);
        let dmag = config.dmag_axis();
        assert_eq!(dmag.bins, 260);
        assert!(config.max_duration().is_none());
    }

    #[test]
    fn test_partial_json() {
        let config: SimulationConfig = serde_json::from_str(
            r#"{"completeness": {"samples_per_iteration": 5000, "max_iterations": 40},
                "kepler": {"tolerance": 1e-10}}"#,
        )
        .unwrap();
        assert_eq!(config.completeness.samples_per_iteration, 5000);
        assert_eq!(config.completeness.max_iterations, Some(40));
        assert_eq!(config.completeness.min_working_angle_mas, 150.0);
        assert_eq!(config.kepler.tolerance, 1e-10);
        assert_eq!(config.kepler.max_iterations, 100);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = SimulationConfig::default();
        config.completeness.max_duration_secs = Some(30.0);
        config.save_to_file(&path).unwrap();
        let loaded = SimulationConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.completeness.max_duration(), Some(Duration::from_secs(30)));
    }
}

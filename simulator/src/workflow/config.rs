use anyhow::Context;
use chronocore::{AnalysisConfig, UncertainValue};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Measurements and tuning for one analysis session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub distance: f64,
    pub distance_uncertainty: f64,
    pub temperature: f64,
    pub temperature_uncertainty: f64,
    pub sensitivity: f32,
    pub min_velocity: f64,
    pub max_velocity: f64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let analysis = AnalysisConfig::default();
        Self {
            distance: 50.0,
            distance_uncertainty: 0.5,
            temperature: 25.0,
            temperature_uncertainty: 2.0,
            sensitivity: analysis.sensitivity,
            min_velocity: analysis.min_velocity,
            max_velocity: analysis.max_velocity,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(distance: (f64, f64), temperature: (f64, f64)) -> Self {
        Self {
            distance: distance.0,
            distance_uncertainty: distance.1,
            temperature: temperature.0,
            temperature_uncertainty: temperature.1,
            ..Default::default()
        }
    }

    pub fn with_tuning(mut self, sensitivity: f32, min_velocity: f64, max_velocity: f64) -> Self {
        self.sensitivity = sensitivity;
        self.min_velocity = min_velocity;
        self.max_velocity = max_velocity;
        self
    }

    pub fn distance(&self) -> UncertainValue {
        UncertainValue::new(self.distance, self.distance_uncertainty)
    }

    pub fn temperature(&self) -> UncertainValue {
        UncertainValue::new(self.temperature, self.temperature_uncertainty)
    }

    pub fn to_analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig::default()
            .with_sensitivity(self.sensitivity)
            .with_velocity_range(self.min_velocity, self.max_velocity)
    }

    /// Rejects tuning the core would refuse, before any audio is touched.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.to_analysis_config()
            .validate()
            .context("validating analysis tuning")?;
        anyhow::ensure!(
            self.distance.is_finite() && self.distance > 0.0,
            "distance must be positive, got {} m",
            self.distance
        );
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

use crate::interface::ErrorKind;

/// Lowest sensitivity a caller may request.
pub const MIN_SENSITIVITY: f32 = 0.01;
/// Highest sensitivity a caller may request.
pub const MAX_SENSITIVITY: f32 = 0.5;

/// Tuning shared by the detection stages.
///
/// `sensitivity` is the fraction of the shot amplitude an impact candidate must
/// reach. The velocity bounds size the impact search window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sensitivity: f32,
    pub min_velocity: f64,
    pub max_velocity: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.1,
            min_velocity: 40.0,
            max_velocity: 1000.0,
        }
    }
}

impl AnalysisConfig {
    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY);
        self
    }

    pub fn with_velocity_range(mut self, min_velocity: f64, max_velocity: f64) -> Self {
        self.min_velocity = min_velocity;
        self.max_velocity = max_velocity;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sensitivity.is_finite()
            || !(MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&self.sensitivity)
        {
            return Err(ConfigError::Sensitivity(self.sensitivity));
        }
        if !self.min_velocity.is_finite() || self.min_velocity <= 0.0 {
            return Err(ConfigError::MinVelocity(self.min_velocity));
        }
        if !self.max_velocity.is_finite() || self.max_velocity <= self.min_velocity {
            return Err(ConfigError::VelocityRange {
                min: self.min_velocity,
                max: self.max_velocity,
            });
        }
        Ok(())
    }
}

/// Rejected analysis configuration or measurement.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("sensitivity {0} outside [0.01, 0.5]")]
    Sensitivity(f32),
    #[error("minimum velocity must be positive, got {0} m/s")]
    MinVelocity(f64),
    #[error("maximum velocity {max} m/s must exceed minimum velocity {min} m/s")]
    VelocityRange { min: f64, max: f64 },
    #[error("distance must be positive and finite, got {0} m")]
    Distance(f64),
    #[error("temperature {0} degC gives no positive speed of sound")]
    Temperature(f64),
    #[error("{0} uncertainty must be finite and non-negative")]
    Uncertainty(&'static str),
}

/// Failure raised by the audio decode boundary.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("unreadable wav container: {0}")]
    Wav(#[from] hound::Error),
    #[error("unsupported encoding: {format} at {bits} bits, expected 16-bit integer PCM")]
    UnsupportedEncoding { format: String, bits: u16 },
    #[error("recording contains no samples")]
    Empty,
    #[error("invalid sample rate {0} Hz")]
    InvalidSampleRate(u32),
    #[error("sample {index} is {value}, expected a finite amplitude in [-1, 1]")]
    InvalidSample { index: usize, value: f32 },
}

/// Terminal failure of one analysis stage.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("signal too quiet, no clear shot detected (peak {peak:.3})")]
    WeakSignal { peak: f32 },
    #[error(
        "recording too short or distance too large: earliest impact at sample {earliest}, recording ends at {len}"
    )]
    WindowOutOfRange { earliest: usize, len: usize },
    #[error("no impact peak above {threshold:.3} inside the search window")]
    NoImpactDetected { threshold: f32 },
    #[error("negative flight time ({millis:.1} ms), the detected impact is physically impossible")]
    NegativeFlightTime { millis: f64 },
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StageError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            StageError::WeakSignal { .. } => ErrorKind::WeakSignal,
            StageError::WindowOutOfRange { .. } => ErrorKind::WindowOutOfRange,
            StageError::NoImpactDetected { .. } => ErrorKind::NoImpactDetected,
            StageError::NegativeFlightTime { .. } => ErrorKind::NegativeFlightTime,
        }
    }
}

pub type StageResult<T> = Result<T, StageError>;

/// Value produced by a stage plus the notes it wants shown next to the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutput<T> {
    pub value: T,
    pub notes: Vec<String>,
}

impl<T> StageOutput<T> {
    pub fn new(value: T, notes: Vec<String>) -> Self {
        Self { value, notes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert_eq!(config.sensitivity, 0.1);
        assert_eq!(config.min_velocity, 40.0);
        assert_eq!(config.max_velocity, 1000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sensitivity_builder_clamps() {
        assert_eq!(
            AnalysisConfig::default().with_sensitivity(0.9).sensitivity,
            MAX_SENSITIVITY
        );
        assert_eq!(
            AnalysisConfig::default().with_sensitivity(0.0).sensitivity,
            MIN_SENSITIVITY
        );
    }

    #[test]
    fn validate_rejects_inverted_velocity_range() {
        let config = AnalysisConfig::default().with_velocity_range(500.0, 100.0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::VelocityRange {
                min: 500.0,
                max: 100.0
            })
        );
    }

    #[test]
    fn validate_rejects_raw_out_of_range_sensitivity() {
        let config = AnalysisConfig {
            sensitivity: 0.75,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Sensitivity(_))
        ));
    }

    #[test]
    fn stage_errors_map_to_kinds() {
        assert_eq!(
            StageError::WeakSignal { peak: 0.01 }.kind(),
            ErrorKind::WeakSignal
        );
        assert_eq!(
            StageError::from(ConfigError::MinVelocity(0.0)).kind(),
            ErrorKind::InvalidConfig
        );
    }
}

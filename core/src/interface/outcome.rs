use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

use crate::interface::events::{DetectionEvent, SearchWindow};
use crate::math::UncertainValue;
use crate::prelude::DecodeError;

/// Default padding around the markers when a renderer zooms the waveform.
pub const DEFAULT_ZOOM_PAD_SECONDS: f64 = 0.05;

/// Flat failure category carried by [`AnalysisOutcome::Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Format,
    InvalidConfig,
    WeakSignal,
    WindowOutOfRange,
    NoImpactDetected,
    NegativeFlightTime,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Format => "format error",
            ErrorKind::InvalidConfig => "invalid configuration",
            ErrorKind::WeakSignal => "weak signal",
            ErrorKind::WindowOutOfRange => "window out of range",
            ErrorKind::NoImpactDetected => "no impact detected",
            ErrorKind::NegativeFlightTime => "negative flight time",
        };
        f.write_str(label)
    }
}

/// Numeric coordinates a renderer needs to draw the waveform markers.
///
/// Fields stay `None` when the stage producing them never ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub shot: Option<DetectionEvent>,
    pub impact: Option<DetectionEvent>,
    pub window: Option<SearchWindow>,
    pub notes: Vec<String>,
}

impl Diagnostics {
    /// Sample range covering the markers plus `pad_seconds` on each side.
    ///
    /// The right edge follows the impact when known, then the window end.
    /// Returns `None` when no shot was located.
    pub fn zoom_range(
        &self,
        sample_count: usize,
        sample_rate: u32,
        pad_seconds: f64,
    ) -> Option<Range<usize>> {
        let shot = self.shot?;
        let pad = (pad_seconds.max(0.0) * f64::from(sample_rate)) as usize;
        let last_marker = match (self.impact, self.window) {
            (Some(impact), _) => impact.index,
            (None, Some(window)) => window.end().saturating_sub(1),
            (None, None) => shot.index,
        };
        let start = shot.index.saturating_sub(pad);
        let end = last_marker.saturating_add(pad).saturating_add(1).min(sample_count);
        (start < end).then_some(start..end)
    }
}

/// Result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Success {
        time_delta: UncertainValue,
        time_of_flight: UncertainValue,
        velocity: UncertainValue,
        shot: DetectionEvent,
        impact: DetectionEvent,
        window: SearchWindow,
        notes: Vec<String>,
    },
    Failure {
        reason: ErrorKind,
        message: String,
        diagnostics: Diagnostics,
    },
}

impl AnalysisOutcome {
    /// Failure for a recording that never reached the analysis stages.
    pub fn from_decode_error(error: &DecodeError) -> Self {
        AnalysisOutcome::Failure {
            reason: ErrorKind::Format,
            message: error.to_string(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Success { .. })
    }

    pub fn velocity(&self) -> Option<UncertainValue> {
        match self {
            AnalysisOutcome::Success { velocity, .. } => Some(*velocity),
            AnalysisOutcome::Failure { .. } => None,
        }
    }

    pub fn time_delta(&self) -> Option<UncertainValue> {
        match self {
            AnalysisOutcome::Success { time_delta, .. } => Some(*time_delta),
            AnalysisOutcome::Failure { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<ErrorKind> {
        match self {
            AnalysisOutcome::Success { .. } => None,
            AnalysisOutcome::Failure { reason, .. } => Some(*reason),
        }
    }

    /// Marker coordinates for rendering, whether or not the run succeeded.
    pub fn diagnostics(&self) -> Diagnostics {
        match self {
            AnalysisOutcome::Success {
                shot,
                impact,
                window,
                notes,
                ..
            } => Diagnostics {
                shot: Some(*shot),
                impact: Some(*impact),
                window: Some(*window),
                notes: notes.clone(),
            },
            AnalysisOutcome::Failure { diagnostics, .. } => diagnostics.clone(),
        }
    }

    /// One-line human readable result.
    pub fn summary(&self) -> String {
        match self {
            AnalysisOutcome::Success {
                time_delta,
                velocity,
                ..
            } => format!(
                "velocity {:.1} m/s, delta t {:.1} ms",
                velocity,
                time_delta.nominal() * 1000.0
            ),
            AnalysisOutcome::Failure {
                reason, message, ..
            } => format!("{reason}: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(index: usize) -> DetectionEvent {
        DetectionEvent {
            index,
            time: index as f64 / 1000.0,
            amplitude: 0.5,
        }
    }

    #[test]
    fn zoom_range_pads_around_markers() {
        let diagnostics = Diagnostics {
            shot: Some(event(100)),
            impact: Some(event(400)),
            window: Some(SearchWindow::new(200, 900)),
            notes: Vec::new(),
        };
        assert_eq!(diagnostics.zoom_range(1000, 1000, 0.05), Some(50..451));
    }

    #[test]
    fn zoom_range_falls_back_to_window_then_clamps() {
        let diagnostics = Diagnostics {
            shot: Some(event(10)),
            impact: None,
            window: Some(SearchWindow::new(200, 900)),
            notes: Vec::new(),
        };
        assert_eq!(diagnostics.zoom_range(920, 1000, 0.05), Some(0..920));
    }

    #[test]
    fn zoom_range_requires_a_shot() {
        assert_eq!(Diagnostics::default().zoom_range(100, 1000, 0.05), None);
    }

    #[test]
    fn failure_summary_includes_reason() {
        let outcome = AnalysisOutcome::Failure {
            reason: ErrorKind::WeakSignal,
            message: "too quiet".into(),
            diagnostics: Diagnostics::default(),
        };
        assert_eq!(outcome.summary(), "weak signal: too quiet");
        assert_eq!(outcome.reason(), Some(ErrorKind::WeakSignal));
        assert!(outcome.velocity().is_none());
    }

    #[test]
    fn decode_error_becomes_format_failure() {
        let outcome = AnalysisOutcome::from_decode_error(&DecodeError::Empty);
        assert_eq!(outcome.reason(), Some(ErrorKind::Format));
        assert_eq!(outcome.summary(), "format error: recording contains no samples");
    }

    #[test]
    fn success_serializes_with_status_tag() {
        let outcome = AnalysisOutcome::Success {
            time_delta: UncertainValue::new(0.35, 0.0001),
            time_of_flight: UncertainValue::new(0.2, 0.0003),
            velocity: UncertainValue::new(250.0, 2.5),
            shot: event(100),
            impact: event(450),
            window: SearchWindow::new(200, 900),
            notes: vec!["threshold 0.100".into()],
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["impact"]["index"], 450);
        assert_eq!(outcome.summary(), "velocity 250.0 +/- 2.5 m/s, delta t 350.0 ms");

        let diagnostics = outcome.diagnostics();
        assert_eq!(diagnostics.impact.map(|e| e.index), Some(450));
    }
}

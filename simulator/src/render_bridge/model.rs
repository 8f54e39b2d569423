use chronocore::interface::outcome::DEFAULT_ZOOM_PAD_SECONDS;
use chronocore::{AnalysisOutcome, Diagnostics, ErrorKind, SampleBuffer, UncertainValue};
use serde::{Deserialize, Serialize};

/// Upper bound on waveform points shipped to a renderer.
pub const MAX_WAVEFORM_POINTS: usize = 4_096;

/// Everything an external chart needs: a zoomed waveform and marker coordinates.
///
/// Point `i` of `waveform` sits at sample `excerpt_start + i * excerpt_step`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct VisualizationModel {
    pub status: String,
    pub success: bool,
    pub reason: Option<ErrorKind>,
    pub sample_rate: u32,
    pub excerpt_start: usize,
    pub excerpt_step: usize,
    pub waveform: Vec<f32>,
    pub diagnostics: Diagnostics,
    pub velocity: Option<UncertainValue>,
    pub time_delta: Option<UncertainValue>,
}

impl VisualizationModel {
    pub fn from_outcome(outcome: &AnalysisOutcome, buffer: Option<&SampleBuffer>) -> Self {
        let diagnostics = outcome.diagnostics();
        let (sample_rate, excerpt_start, excerpt_step, waveform) = match buffer {
            Some(buffer) => {
                let range = diagnostics
                    .zoom_range(buffer.len(), buffer.sample_rate(), DEFAULT_ZOOM_PAD_SECONDS)
                    .unwrap_or(0..buffer.len());
                let (step, points) = decimate(&buffer.samples()[range.clone()], MAX_WAVEFORM_POINTS);
                (buffer.sample_rate(), range.start, step, points)
            }
            None => (0, 0, 1, Vec::new()),
        };

        Self {
            status: outcome.summary(),
            success: outcome.is_success(),
            reason: outcome.reason(),
            sample_rate,
            excerpt_start,
            excerpt_step,
            waveform,
            diagnostics,
            velocity: outcome.velocity(),
            time_delta: outcome.time_delta(),
        }
    }
}

/// Keeps the loudest sample of every bucket so short transients stay visible.
fn decimate(samples: &[f32], max_points: usize) -> (usize, Vec<f32>) {
    let step = samples.len().div_ceil(max_points.max(1)).max(1);
    let points = samples
        .chunks(step)
        .map(|chunk| {
            chunk
                .iter()
                .copied()
                .fold(0.0f32, |best, v| if v.abs() > best.abs() { v } else { best })
        })
        .collect();
    (step, points)
}

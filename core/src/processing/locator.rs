use crate::audio::SampleBuffer;
use crate::interface::{DetectionEvent, SearchWindow};
use crate::math::PeakFinder;
use crate::prelude::{AnalysisConfig, StageError, StageOutput, StageResult};
use crate::telemetry::log::LogManager;

/// Minimum spacing between two candidate peaks, in seconds.
pub const PEAK_SEPARATION_SECONDS: f64 = 0.005;

/// Picks the impact among the magnitude peaks inside the search window.
///
/// Candidates must reach `sensitivity` times the shot amplitude. The earliest
/// surviving candidate is taken as the direct impact; anything later is
/// treated as an echo. An early low echo that clears the threshold will still
/// win over a louder true impact.
///
/// Samples on the window edges are candidates too: peak neighbours are read
/// from the whole recording, not from the window slice.
pub struct ImpactLocator {
    sensitivity: f32,
    logger: LogManager,
}

impl ImpactLocator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            sensitivity: config.sensitivity,
            logger: LogManager::new("impact locator"),
        }
    }

    pub fn separation(sample_rate: u32) -> usize {
        ((f64::from(sample_rate) * PEAK_SEPARATION_SECONDS) as usize).max(1)
    }

    /// `magnitudes` must be the absolute values of `buffer`.
    pub fn execute(
        &self,
        buffer: &SampleBuffer,
        magnitudes: &[f32],
        shot: &DetectionEvent,
        window: &SearchWindow,
    ) -> StageResult<StageOutput<DetectionEvent>> {
        debug_assert_eq!(magnitudes.len(), buffer.len());

        let threshold = shot.amplitude.abs() * self.sensitivity;
        let finder = PeakFinder::new(threshold, Self::separation(buffer.sample_rate()));
        let peaks = finder.find(magnitudes, window.range());
        self.logger.detail(&format!(
            "{} candidate(s) above {:.3}, separation {} samples",
            peaks.len(),
            finder.min_height(),
            finder.min_separation()
        ));

        let Some(&index) = peaks.first() else {
            let error = StageError::NoImpactDetected { threshold };
            self.logger.failure(&error);
            return Err(error);
        };

        let impact = DetectionEvent::at(buffer, index);
        self.logger.record(&format!(
            "impact at sample {} ({:.4} s), amplitude {:.3}",
            index, impact.time, impact.amplitude
        ));

        Ok(StageOutput::new(
            impact,
            vec![format!(
                "impact threshold {:.3}, {} candidate(s)",
                threshold,
                peaks.len()
            )],
        ))
    }
}

use crate::audio::SampleBuffer;
use crate::interface::DetectionEvent;
use crate::math::StatsHelper;
use crate::prelude::{StageError, StageOutput, StageResult};
use crate::telemetry::log::LogManager;

/// Quietest absolute peak still accepted as a shot.
pub const MIN_SHOT_AMPLITUDE: f32 = 0.05;

/// Locates the shot as the loudest sample of the whole recording.
pub struct EventDetector {
    threshold: f32,
    logger: LogManager,
}

impl EventDetector {
    pub fn new() -> Self {
        Self::with_threshold(MIN_SHOT_AMPLITUDE)
    }

    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            threshold,
            logger: LogManager::new("event detector"),
        }
    }

    pub fn execute(&self, buffer: &SampleBuffer) -> StageResult<StageOutput<DetectionEvent>> {
        let (index, peak) = StatsHelper::abs_peak(buffer.samples()).unwrap_or((0, 0.0));

        if peak < self.threshold {
            let error = StageError::WeakSignal { peak };
            self.logger.failure(&error);
            return Err(error);
        }

        let shot = DetectionEvent::at(buffer, index);
        let rms = StatsHelper::rms(buffer.samples());
        self.logger.record(&format!(
            "shot at sample {} ({:.4} s), peak {:.3}",
            index, shot.time, peak
        ));

        Ok(StageOutput::new(
            shot,
            vec![format!("shot peak {:.3}, signal rms {:.4}", peak, rms)],
        ))
    }
}

impl Default for EventDetector {
    fn default() -> Self {
        Self::new()
    }
}

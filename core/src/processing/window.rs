use crate::interface::SearchWindow;
use crate::math::UncertainValue;
use crate::prelude::{AnalysisConfig, StageError, StageOutput, StageResult};
use crate::processing::physics::speed_of_sound;
use crate::telemetry::log::LogManager;

/// Sizes the interval in which the impact sound can reach the microphone.
///
/// The earliest arrival assumes the fastest projectile, the latest the
/// slowest; both include the return leg of the sound. Only nominal distance
/// and temperature matter here.
pub struct WindowCalculator {
    min_velocity: f64,
    max_velocity: f64,
    logger: LogManager,
}

impl WindowCalculator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            min_velocity: config.min_velocity,
            max_velocity: config.max_velocity,
            logger: LogManager::new("window calculator"),
        }
    }

    pub fn execute(
        &self,
        shot_index: usize,
        sample_rate: u32,
        buffer_len: usize,
        distance: UncertainValue,
        temperature: UncertainValue,
    ) -> StageResult<StageOutput<SearchWindow>> {
        let rate = f64::from(sample_rate);
        let distance = distance.nominal();
        let sound = speed_of_sound(temperature.nominal());
        let return_leg = distance / sound;

        let dt_min = distance / self.max_velocity + return_leg;
        let dt_max = distance / self.min_velocity + return_leg;

        // Float to usize casts saturate, so huge delays cannot wrap.
        let start = shot_index.saturating_add((dt_min * rate).floor() as usize);
        if start >= buffer_len {
            let error = StageError::WindowOutOfRange {
                earliest: start,
                len: buffer_len,
            };
            self.logger.failure(&error);
            return Err(error);
        }

        let end = shot_index
            .saturating_add((dt_max * rate).floor() as usize)
            .min(buffer_len)
            .max(start + 1);

        let window = SearchWindow::new(start, end);
        self.logger.detail(&format!(
            "dt {:.4}..{:.4} s, c {:.1} m/s",
            dt_min, dt_max, sound
        ));
        self.logger.record(&format!("window {}..{}", start, end));

        let (start_time, end_time) = window.times(sample_rate);
        Ok(StageOutput::new(
            window,
            vec![format!(
                "search window {:.3}..{:.3} s ({} samples)",
                start_time,
                end_time,
                window.sample_count()
            )],
        ))
    }
}

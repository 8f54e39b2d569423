//! The `analyze` entry point chaining every detection stage.
//!
//! Stages run in order (detector, window, locator, physics) and the first
//! failure ends the run. Whatever was located before the failure stays in the
//! returned [`Diagnostics`] so a caller can still draw a partial chart.

use crate::audio::SampleBuffer;
use crate::interface::{AnalysisOutcome, Diagnostics};
use crate::math::{StatsHelper, UncertainValue};
use crate::prelude::{AnalysisConfig, ConfigError, StageError, StageResult};
use crate::processing::physics::speed_of_sound;
use crate::processing::{EventDetector, ImpactLocator, PhysicsResolver, WindowCalculator};
use crate::telemetry::log::LogManager;

/// Runs the whole analysis on a decoded buffer.
///
/// Never panics on physical or configuration problems; those come back as
/// [`AnalysisOutcome::Failure`].
pub fn analyze(
    buffer: &SampleBuffer,
    distance: UncertainValue,
    temperature: UncertainValue,
    config: &AnalysisConfig,
) -> AnalysisOutcome {
    let logger = LogManager::new("pipeline");
    let mut diagnostics = Diagnostics::default();

    match run(buffer, distance, temperature, config, &logger, &mut diagnostics) {
        Ok(outcome) => {
            logger.record(&outcome.summary());
            outcome
        }
        // Stages log their own failures.
        Err(error) => AnalysisOutcome::Failure {
            reason: error.kind(),
            message: error.to_string(),
            diagnostics,
        },
    }
}

/// [`analyze`] with the tuning passed as loose scalars.
///
/// Values are validated as given, not clamped.
pub fn analyze_with(
    buffer: &SampleBuffer,
    distance: UncertainValue,
    temperature: UncertainValue,
    sensitivity: f32,
    min_velocity: f64,
    max_velocity: f64,
) -> AnalysisOutcome {
    let config = AnalysisConfig {
        sensitivity,
        min_velocity,
        max_velocity,
    };
    analyze(buffer, distance, temperature, &config)
}

fn run(
    buffer: &SampleBuffer,
    distance: UncertainValue,
    temperature: UncertainValue,
    config: &AnalysisConfig,
    logger: &LogManager,
    diagnostics: &mut Diagnostics,
) -> StageResult<AnalysisOutcome> {
    let validated = validate_measurements(distance, temperature)
        .and_then(|()| config.validate().map_err(StageError::from));
    if let Err(error) = validated {
        logger.failure(&error);
        return Err(error);
    }

    let shot = EventDetector::new().execute(buffer)?;
    diagnostics.shot = Some(shot.value);
    diagnostics.notes.extend(shot.notes);
    let shot = shot.value;

    let window = WindowCalculator::new(config).execute(
        shot.index,
        buffer.sample_rate(),
        buffer.len(),
        distance,
        temperature,
    )?;
    diagnostics.window = Some(window.value);
    diagnostics.notes.extend(window.notes);
    let window = window.value;

    let magnitudes = StatsHelper::magnitudes(buffer.samples());
    let impact = ImpactLocator::new(config).execute(buffer, &magnitudes, &shot, &window)?;
    diagnostics.impact = Some(impact.value);
    diagnostics.notes.extend(impact.notes);
    let impact = impact.value;

    let solution = PhysicsResolver::new().execute(
        buffer.sample_rate(),
        &shot,
        &impact,
        distance,
        temperature,
    )?;
    diagnostics.notes.extend(solution.notes);
    let solution = solution.value;

    Ok(AnalysisOutcome::Success {
        time_delta: solution.time_delta,
        time_of_flight: solution.time_of_flight,
        velocity: solution.velocity,
        shot,
        impact,
        window,
        notes: std::mem::take(&mut diagnostics.notes),
    })
}

fn validate_measurements(
    distance: UncertainValue,
    temperature: UncertainValue,
) -> Result<(), StageError> {
    if !distance.nominal().is_finite() || distance.nominal() <= 0.0 {
        return Err(ConfigError::Distance(distance.nominal()).into());
    }
    if !distance.std_dev().is_finite() {
        return Err(ConfigError::Uncertainty("distance").into());
    }
    if !temperature.nominal().is_finite() || speed_of_sound(temperature.nominal()) <= 0.0 {
        return Err(ConfigError::Temperature(temperature.nominal()).into());
    }
    if !temperature.std_dev().is_finite() {
        return Err(ConfigError::Uncertainty("temperature").into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::ErrorKind;

    mod capture {
        use log::{Level, LevelFilter, Log, Metadata, Record};
        use std::cell::RefCell;
        use std::sync::Once;

        thread_local! {
            static RECORDS: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
        }

        struct ThreadCapture;

        impl Log for ThreadCapture {
            fn enabled(&self, _: &Metadata) -> bool {
                true
            }

            fn log(&self, record: &Record) {
                RECORDS.with(|records| {
                    records
                        .borrow_mut()
                        .push((record.level(), record.args().to_string()))
                });
            }

            fn flush(&self) {}
        }

        static LOGGER: ThreadCapture = ThreadCapture;
        static INSTALL: Once = Once::new();

        /// Routes records to a per-thread list and clears this thread's list.
        pub fn install() {
            INSTALL.call_once(|| {
                let _ = log::set_logger(&LOGGER);
                log::set_max_level(LevelFilter::Trace);
            });
            RECORDS.with(|records| records.borrow_mut().clear());
        }

        pub fn warnings() -> Vec<String> {
            RECORDS.with(|records| {
                records
                    .borrow()
                    .iter()
                    .filter(|(level, _)| *level == Level::Warn)
                    .map(|(_, message)| message.clone())
                    .collect()
            })
        }
    }

    const RATE: u32 = 44_100;

    fn buffer_with(len: usize, impulses: &[(usize, f32)]) -> SampleBuffer {
        let mut samples = vec![0.0; len];
        for &(index, amplitude) in impulses {
            samples[index] = amplitude;
        }
        SampleBuffer::new(samples, RATE).unwrap()
    }

    fn range_measurements() -> (UncertainValue, UncertainValue) {
        (UncertainValue::new(5.0, 0.05), UncertainValue::new(25.0, 2.0))
    }

    fn field_measurements() -> (UncertainValue, UncertainValue) {
        (UncertainValue::new(50.0, 0.5), UncertainValue::new(25.0, 2.0))
    }

    #[test]
    fn clean_shot_and_impact_pair_succeeds() {
        let buffer = buffer_with(RATE as usize, &[(1_000, 1.0), (5_000, 0.3)]);
        let (distance, temperature) = range_measurements();
        let outcome = analyze(&buffer, distance, temperature, &AnalysisConfig::default());

        match &outcome {
            AnalysisOutcome::Success {
                time_delta,
                velocity,
                shot,
                impact,
                window,
                notes,
                ..
            } => {
                let expected_delta = 4_000.0 / 44_100.0;
                assert!((time_delta.nominal() - expected_delta).abs() < 1e-12);
                assert!((time_delta.std_dev() - 1.0 / 44_100.0).abs() < 1e-15);

                let expected_velocity = 5.0 / (expected_delta - 5.0 / 346.4);
                assert!((velocity.nominal() - expected_velocity).abs() < 1e-6);
                assert!(velocity.nominal() > 0.0);
                assert!(velocity.std_dev() > 0.0);

                assert_eq!(shot.index, 1_000);
                assert_eq!(impact.index, 5_000);
                assert_eq!((window.start(), window.end()), (1_857, 7_149));
                assert!(!notes.is_empty());
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn fifty_metre_shot_resolves_velocity() {
        let buffer = buffer_with(RATE as usize, &[(1_000, 1.0), (16_435, 0.3)]);
        let (distance, temperature) = field_measurements();
        let outcome = analyze(&buffer, distance, temperature, &AnalysisConfig::default());

        let velocity = outcome.velocity().expect("velocity");
        let expected = 50.0 / (0.35 - 50.0 / 346.4);
        assert!((velocity.nominal() - expected).abs() < 1e-6);
        assert!(velocity.std_dev() > 0.0);
        assert!(outcome.summary().starts_with("velocity 243.1 +/- "));
    }

    #[test]
    fn impact_before_earliest_arrival_is_not_searched() {
        // At 50 m the return leg alone takes about 144 ms, far more than 4000 samples.
        let buffer = buffer_with(RATE as usize, &[(1_000, 1.0), (5_000, 0.3)]);
        let (distance, temperature) = field_measurements();
        let outcome = analyze(&buffer, distance, temperature, &AnalysisConfig::default());

        assert_eq!(outcome.reason(), Some(ErrorKind::NoImpactDetected));
        let diagnostics = outcome.diagnostics();
        assert_eq!(diagnostics.window.map(|w| w.start()), Some(9_570));
    }

    #[test]
    fn silent_buffer_is_weak_signal_without_diagnostics() {
        let buffer = buffer_with(RATE as usize, &[]);
        let (distance, temperature) = range_measurements();
        let outcome = analyze(&buffer, distance, temperature, &AnalysisConfig::default());

        assert_eq!(outcome.reason(), Some(ErrorKind::WeakSignal));
        assert_eq!(outcome.diagnostics(), Diagnostics::default());
    }

    #[test]
    fn quiet_impact_keeps_shot_and_window() {
        let buffer = buffer_with(RATE as usize, &[(1_000, 1.0), (5_000, 0.02)]);
        let (distance, temperature) = range_measurements();
        let outcome = analyze(&buffer, distance, temperature, &AnalysisConfig::default());

        assert_eq!(outcome.reason(), Some(ErrorKind::NoImpactDetected));
        let diagnostics = outcome.diagnostics();
        assert_eq!(diagnostics.shot.map(|e| e.index), Some(1_000));
        assert!(diagnostics.window.is_some());
        assert!(diagnostics.impact.is_none());
    }

    #[test]
    fn impact_faster_than_sound_return_is_negative_flight_time() {
        // With an effectively unbounded top speed the window opens on the
        // floored return leg, one sample before sound could arrive.
        let buffer = buffer_with(RATE as usize, &[(1_000, 1.0), (1_636, 0.5)]);
        let (distance, temperature) = range_measurements();
        let config = AnalysisConfig::default().with_velocity_range(40.0, 1.0e6);
        let outcome = analyze(&buffer, distance, temperature, &config);

        assert_eq!(outcome.reason(), Some(ErrorKind::NegativeFlightTime));
        let diagnostics = outcome.diagnostics();
        assert_eq!(diagnostics.shot.map(|e| e.index), Some(1_000));
        assert_eq!(diagnostics.impact.map(|e| e.index), Some(1_636));
        assert_eq!(diagnostics.window.map(|w| w.start()), Some(1_636));
    }

    #[test]
    fn short_recording_is_window_out_of_range() {
        let buffer = buffer_with(2_000, &[(1_000, 1.0)]);
        let (distance, temperature) = field_measurements();
        let outcome = analyze(&buffer, distance, temperature, &AnalysisConfig::default());

        assert_eq!(outcome.reason(), Some(ErrorKind::WindowOutOfRange));
        let diagnostics = outcome.diagnostics();
        assert!(diagnostics.shot.is_some());
        assert!(diagnostics.window.is_none());
    }

    #[test]
    fn invalid_inputs_fail_before_detection() {
        let buffer = buffer_with(RATE as usize, &[(1_000, 1.0), (5_000, 0.3)]);
        let temperature = UncertainValue::new(25.0, 2.0);

        let outcome = analyze(
            &buffer,
            UncertainValue::new(0.0, 0.1),
            temperature,
            &AnalysisConfig::default(),
        );
        assert_eq!(outcome.reason(), Some(ErrorKind::InvalidConfig));
        assert_eq!(outcome.diagnostics(), Diagnostics::default());

        let outcome = analyze_with(
            &buffer,
            UncertainValue::new(5.0, 0.05),
            temperature,
            0.1,
            300.0,
            200.0,
        );
        assert_eq!(outcome.reason(), Some(ErrorKind::InvalidConfig));

        let outcome = analyze(
            &buffer,
            UncertainValue::new(5.0, 0.05),
            UncertainValue::new(-600.0, 1.0),
            &AnalysisConfig::default(),
        );
        assert_eq!(outcome.reason(), Some(ErrorKind::InvalidConfig));
    }

    #[test]
    fn each_failure_is_warned_once() {
        capture::install();
        let buffer = buffer_with(RATE as usize, &[(1_000, 1.0), (5_000, 0.02)]);
        let (distance, temperature) = range_measurements();
        analyze(&buffer, distance, temperature, &AnalysisConfig::default());

        let warnings = capture::warnings();
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].starts_with("impact locator failed"));

        capture::install();
        analyze(
            &buffer,
            UncertainValue::new(-1.0, 0.1),
            temperature,
            &AnalysisConfig::default(),
        );
        let warnings = capture::warnings();
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].starts_with("pipeline failed"));
    }

    #[test]
    fn repeated_analysis_is_identical() {
        let buffer = buffer_with(RATE as usize, &[(1_000, 1.0), (3_200, -0.1), (5_000, 0.3)]);
        let (distance, temperature) = range_measurements();
        let config = AnalysisConfig::default();

        let first = analyze(&buffer, distance, temperature, &config);
        let second = analyze(&buffer, distance, temperature, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn loose_scalar_entry_point_matches_config() {
        let buffer = buffer_with(RATE as usize, &[(1_000, 1.0), (5_000, 0.3)]);
        let (distance, temperature) = range_measurements();

        let from_config = analyze(&buffer, distance, temperature, &AnalysisConfig::default());
        let from_scalars = analyze_with(&buffer, distance, temperature, 0.1, 40.0, 1000.0);
        assert_eq!(from_config, from_scalars);
    }
}

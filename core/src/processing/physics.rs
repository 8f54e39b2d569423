use serde::{Deserialize, Serialize};

use crate::interface::DetectionEvent;
use crate::math::UncertainValue;
use crate::prelude::{StageError, StageOutput, StageResult};
use crate::telemetry::log::LogManager;

/// Speed of sound in dry air at 0 degC, m/s.
pub const SPEED_OF_SOUND_AT_ZERO_C: f64 = 331.4;
/// Linear temperature coefficient of the speed of sound, m/s per degC.
pub const SPEED_OF_SOUND_SLOPE: f64 = 0.6;

pub fn speed_of_sound(temperature_c: f64) -> f64 {
    SPEED_OF_SOUND_AT_ZERO_C + SPEED_OF_SOUND_SLOPE * temperature_c
}

pub fn speed_of_sound_uncertain(temperature_c: UncertainValue) -> UncertainValue {
    SPEED_OF_SOUND_AT_ZERO_C + SPEED_OF_SOUND_SLOPE * temperature_c
}

/// Timing and velocity derived from one shot/impact pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightSolution {
    pub time_delta: UncertainValue,
    pub speed_of_sound: UncertainValue,
    pub time_of_flight: UncertainValue,
    pub velocity: UncertainValue,
}

/// Turns the microphone time delta into time of flight and velocity.
///
/// The impact sound still has to travel back to the microphone, so that
/// return leg is subtracted before dividing distance by time.
pub struct PhysicsResolver {
    logger: LogManager,
}

impl PhysicsResolver {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("physics resolver"),
        }
    }

    pub fn execute(
        &self,
        sample_rate: u32,
        shot: &DetectionEvent,
        impact: &DetectionEvent,
        distance: UncertainValue,
        temperature: UncertainValue,
    ) -> StageResult<StageOutput<FlightSolution>> {
        let resolution = 1.0 / f64::from(sample_rate);
        let time_delta = UncertainValue::new(impact.time - shot.time, resolution);
        let speed_of_sound = speed_of_sound_uncertain(temperature);
        let time_of_flight = time_delta - distance / speed_of_sound;

        if time_of_flight.nominal() <= 0.0 {
            let error = StageError::NegativeFlightTime {
                millis: time_of_flight.nominal() * 1000.0,
            };
            self.logger.failure(&error);
            return Err(error);
        }

        let velocity = distance / time_of_flight;
        self.logger.record(&format!(
            "time of flight {:.5} s, velocity {:.1} m/s",
            time_of_flight, velocity
        ));

        let notes = vec![
            format!("speed of sound {:.1} m/s", speed_of_sound),
            format!("time of flight {:.2} ms", time_of_flight.nominal() * 1000.0),
        ];
        Ok(StageOutput::new(
            FlightSolution {
                time_delta,
                speed_of_sound,
                time_of_flight,
                velocity,
            },
            notes,
        ))
    }
}

impl Default for PhysicsResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 44_100;

    fn event(index: usize) -> DetectionEvent {
        DetectionEvent {
            index,
            time: index as f64 / f64::from(RATE),
            amplitude: 0.5,
        }
    }

    #[test]
    fn speed_of_sound_is_linear_in_temperature() {
        assert_eq!(speed_of_sound(0.0), 331.4);
        assert!((speed_of_sound(25.0) - 346.4).abs() < 1e-9);

        let uncertain = speed_of_sound_uncertain(UncertainValue::new(25.0, 2.0));
        assert!((uncertain.std_dev() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn resolver_subtracts_return_leg() {
        let distance = UncertainValue::new(50.0, 0.5);
        let temperature = UncertainValue::new(25.0, 2.0);
        let output = PhysicsResolver::new()
            .execute(RATE, &event(1_000), &event(16_435), distance, temperature)
            .unwrap();
        let solution = output.value;

        assert!((solution.time_delta.nominal() - 0.35).abs() < 1e-12);
        assert!((solution.time_delta.std_dev() - 1.0 / 44_100.0).abs() < 1e-15);

        let expected_flight = 0.35 - 50.0 / 346.4;
        assert!((solution.time_of_flight.nominal() - expected_flight).abs() < 1e-9);
        assert!((solution.velocity.nominal() - 50.0 / expected_flight).abs() < 1e-6);
        assert!(solution.velocity.std_dev() > 0.0);
        assert_eq!(output.notes.len(), 2);
    }

    #[test]
    fn impact_inside_return_leg_is_negative_flight_time() {
        let distance = UncertainValue::new(50.0, 0.5);
        let temperature = UncertainValue::new(25.0, 2.0);
        let result = PhysicsResolver::new().execute(
            RATE,
            &event(1_000),
            &event(5_000),
            distance,
            temperature,
        );
        match result {
            Err(StageError::NegativeFlightTime { millis }) => assert!(millis < 0.0),
            other => panic!("expected negative flight time, got {other:?}"),
        }
    }

    #[test]
    fn zero_flight_time_is_rejected() {
        let distance = UncertainValue::exact(0.0);
        let temperature = UncertainValue::exact(20.0);
        assert!(matches!(
            PhysicsResolver::new().execute(RATE, &event(10), &event(10), distance, temperature),
            Err(StageError::NegativeFlightTime { .. })
        ));
    }
}

//! Per-field plausibility filtering.
//!
//! Each field is judged on its own. An absent field is never a rejection, and a
//! rejected field never drags the other fields of the same reading down with it.

use std::ops::RangeInclusive;

use log::debug;

use crate::models::{Field, SensorReading};

/// Temperature bounds used when the station type does not say otherwise.
pub const DEFAULT_TEMPERATURE: RangeInclusive<f64> = -30.0..=70.0;
/// Operating range of the BME280, used for single-sensor stations.
pub const SENSOR_RATED_TEMPERATURE: RangeInclusive<f64> = -40.0..=85.0;
pub const HUMIDITY: RangeInclusive<f64> = 0.0..=100.0;
pub const PRESSURE: RangeInclusive<f64> = 800.0..=1200.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
    temperature: RangeInclusive<f64>,
    humidity: RangeInclusive<f64>,
    pressure: RangeInclusive<f64>,
    min_illuminance: f64,
}

impl Default for Validator {
    fn default() -> Self {
        Self::with_temperature(DEFAULT_TEMPERATURE)
    }
}

impl Validator {
    pub fn with_temperature(temperature: RangeInclusive<f64>) -> Self {
        Self {
            temperature,
            humidity: HUMIDITY,
            pressure: PRESSURE,
            min_illuminance: 0.0,
        }
    }

    /// Whether `value` is physically plausible for `field`.
    pub fn accept(&self, field: Field, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match field {
            Field::Temperature => self.temperature.contains(&value),
            Field::Humidity => self.humidity.contains(&value),
            Field::Pressure => self.pressure.contains(&value),
            Field::Illuminance => value >= self.min_illuminance,
        }
    }

    /// Clear every implausible field of `reading`, returning the fields that were dropped.
    pub fn filter(&self, reading: &SensorReading) -> (SensorReading, Vec<Field>) {
        let mut accepted = *reading;
        let mut rejected = Vec::new();

        for field in Field::ALL {
            if let Some(value) = reading.get(field) {
                if !self.accept(field, value) {
                    debug!("Rejected implausible {}: {} {}", field, value, field.unit());
                    accepted.set(field, None);
                    rejected.push(field);
                }
            }
        }

        (accepted, rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        let validator = Validator::default();
        assert!(validator.accept(Field::Temperature, -30.0));
        assert!(validator.accept(Field::Temperature, 70.0));
        assert!(!validator.accept(Field::Temperature, 70.01));
        assert!(validator.accept(Field::Humidity, 0.0));
        assert!(validator.accept(Field::Humidity, 100.0));
        assert!(!validator.accept(Field::Humidity, -0.1));
        assert!(validator.accept(Field::Pressure, 800.0));
        assert!(!validator.accept(Field::Pressure, 1200.5));
        assert!(validator.accept(Field::Illuminance, 0.0));
        assert!(!validator.accept(Field::Illuminance, -1.0));
    }

    #[test]
    fn zero_is_a_value_not_a_rejection() {
        let validator = Validator::default();
        assert!(validator.accept(Field::Temperature, 0.0));
        assert!(validator.accept(Field::Illuminance, 0.0));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let validator = Validator::default();
        assert!(!validator.accept(Field::Temperature, f64::NAN));
        assert!(!validator.accept(Field::Illuminance, f64::INFINITY));
    }

    #[test]
    fn sensor_rated_bounds_widen_temperature_only() {
        let validator = Validator::with_temperature(SENSOR_RATED_TEMPERATURE);
        assert!(validator.accept(Field::Temperature, -39.0));
        assert!(validator.accept(Field::Temperature, 84.0));
        assert!(!validator.accept(Field::Humidity, 101.0));
    }

    #[test]
    fn filter_drops_only_the_bad_field() {
        let validator = Validator::default();
        let reading = SensorReading {
            temperature: Some(999.0),
            humidity: Some(50.0),
            pressure: None,
            illuminance: Some(120.0),
        };

        let (accepted, rejected) = validator.filter(&reading);

        assert_eq!(rejected, vec![Field::Temperature]);
        assert_eq!(accepted.temperature, None);
        assert_eq!(accepted.humidity, Some(50.0));
        assert_eq!(accepted.pressure, None);
        assert_eq!(accepted.illuminance, Some(120.0));
    }
}

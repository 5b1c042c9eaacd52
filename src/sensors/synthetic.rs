use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{CapabilitySet, SensorCapability};
use crate::models::ClimateSample;

/// Value ranges for generated readings.
#[derive(Debug, Clone)]
pub struct SyntheticRanges {
    pub temperature: RangeInclusive<f64>,
    pub humidity: RangeInclusive<f64>,
    pub pressure: RangeInclusive<f64>,
    pub illuminance: RangeInclusive<f64>,
}

impl Default for SyntheticRanges {
    fn default() -> Self {
        Self {
            temperature: -5.0..=40.0,
            humidity: 10.0..=95.0,
            pressure: 900.0..=1050.0,
            illuminance: 0.0..=1000.0,
        }
    }
}

/// Uniformly distributed readings for stations without hardware. Never fails.
pub struct SyntheticCapability {
    rng: StdRng,
    ranges: SyntheticRanges,
}

impl SyntheticCapability {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy(), SyntheticRanges::default())
    }

    #[cfg(test)]
    pub fn seeded(seed: u64, ranges: SyntheticRanges) -> Self {
        Self::new(StdRng::seed_from_u64(seed), ranges)
    }

    fn new(rng: StdRng, ranges: SyntheticRanges) -> Self {
        Self { rng, ranges }
    }
}

impl SensorCapability for SyntheticCapability {
    fn available(&self) -> CapabilitySet {
        CapabilitySet {
            climate: true,
            light: true,
        }
    }

    fn sample_climate(&mut self) -> Option<ClimateSample> {
        Some(ClimateSample {
            temperature: self.rng.gen_range(self.ranges.temperature.clone()),
            humidity: self.rng.gen_range(self.ranges.humidity.clone()),
            pressure: self.rng.gen_range(self.ranges.pressure.clone()),
        })
    }

    fn sample_light(&mut self) -> Option<f64> {
        Some(self.rng.gen_range(self.ranges.illuminance.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_stay_within_default_ranges() {
        let ranges = SyntheticRanges::default();
        let mut capability = SyntheticCapability::seeded(7, ranges.clone());

        for _ in 0..500 {
            let reading = capability.sample();
            assert!(ranges.temperature.contains(&reading.temperature.unwrap()));
            assert!(ranges.humidity.contains(&reading.humidity.unwrap()));
            assert!(ranges.pressure.contains(&reading.pressure.unwrap()));
            assert!(ranges.illuminance.contains(&reading.illuminance.unwrap()));
        }
    }

    #[test]
    fn degenerate_ranges_give_fixed_values() {
        let mut capability = SyntheticCapability::seeded(
            1,
            SyntheticRanges {
                temperature: 25.0..=25.0,
                humidity: 50.0..=50.0,
                pressure: 1000.0..=1000.0,
                illuminance: 0.0..=0.0,
            },
        );

        let reading = capability.sample();
        assert_eq!(reading.temperature, Some(25.0));
        assert_eq!(reading.humidity, Some(50.0));
        assert_eq!(reading.pressure, Some(1000.0));
        assert_eq!(reading.illuminance, Some(0.0));
    }
}

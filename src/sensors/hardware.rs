use log::{info, warn};

use super::{CapabilitySet, ClimateSensor, LightSensor, SensorCapability};
use crate::error::SensorError;
use crate::models::ClimateSample;

/// Capability backed by real devices, each probed once at construction.
///
/// A device that fails its probe is dropped for the rest of the process and its
/// group is reported absent without touching the bus again.
pub struct HardwareCapability<C, L> {
    climate: Option<C>,
    light: Option<L>,
}

impl<C: ClimateSensor, L: LightSensor> HardwareCapability<C, L> {
    /// Probe every supplied device and keep the ones that answer.
    ///
    /// Returns [`SensorError::NoSensorAvailable`] if none does.
    pub fn detect(climate: Option<C>, light: Option<L>) -> Result<Self, SensorError> {
        let climate = climate.and_then(|mut sensor| match sensor.probe() {
            Ok(()) => {
                info!("{} detected", C::NAME);
                Some(sensor)
            }
            Err(e) => {
                warn!("{} unavailable, its readings will be absent: {}", C::NAME, e);
                None
            }
        });

        let light = light.and_then(|mut sensor| match sensor.probe() {
            Ok(()) => {
                info!("{} detected", L::NAME);
                Some(sensor)
            }
            Err(e) => {
                warn!("{} unavailable, its readings will be absent: {}", L::NAME, e);
                None
            }
        });

        let capability = Self { climate, light };
        if capability.available().is_empty() {
            return Err(SensorError::NoSensorAvailable);
        }
        Ok(capability)
    }
}

impl<C: ClimateSensor, L: LightSensor> SensorCapability for HardwareCapability<C, L> {
    fn available(&self) -> CapabilitySet {
        CapabilitySet {
            climate: self.climate.is_some(),
            light: self.light.is_some(),
        }
    }

    fn sample_climate(&mut self) -> Option<ClimateSample> {
        let sensor = self.climate.as_mut()?;
        match sensor.read() {
            Ok(sample) => Some(sample),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    fn sample_light(&mut self) -> Option<f64> {
        let sensor = self.light.as_mut()?;
        match sensor.read() {
            Ok(lux) => Some(lux),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }
}

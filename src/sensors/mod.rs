//! Sensor capabilities: where raw readings come from.
//!
//! Readings are grouped the way the hardware delivers them: a climate group
//! (temperature, humidity, pressure) and a light group (illuminance). The groups
//! are sampled independently so a missing device never blocks the other one.

pub mod bh1750;
pub mod bme280;
pub mod hardware;
pub mod synthetic;

use linux_embedded_hal::{Delay, I2cdev};
use log::{info, warn};

use crate::config::{CollectorConfig, SensorMode};
use crate::error::SensorError;
use crate::models::{ClimateSample, SensorReading};

pub use self::bh1750::Bh1750Sensor;
pub use self::bme280::Bme280Sensor;
pub use self::hardware::HardwareCapability;
pub use self::synthetic::SyntheticCapability;

/// Which sensor groups a capability can actually deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilitySet {
    pub climate: bool,
    pub light: bool,
}

impl CapabilitySet {
    pub fn is_empty(&self) -> bool {
        !self.climate && !self.light
    }
}

/// A source of raw physical quantities.
///
/// Implementations never fail: a read error is logged and surfaces as an absent group.
pub trait SensorCapability {
    fn available(&self) -> CapabilitySet;

    fn sample_climate(&mut self) -> Option<ClimateSample>;

    fn sample_light(&mut self) -> Option<f64>;

    fn sample(&mut self) -> SensorReading {
        let climate = self.sample_climate();
        let illuminance = self.sample_light();
        SensorReading {
            illuminance,
            ..Default::default()
        }
        .with_climate(climate)
    }
}

impl<S: SensorCapability + ?Sized> SensorCapability for Box<S> {
    fn available(&self) -> CapabilitySet {
        (**self).available()
    }

    fn sample_climate(&mut self) -> Option<ClimateSample> {
        (**self).sample_climate()
    }

    fn sample_light(&mut self) -> Option<f64> {
        (**self).sample_light()
    }

    fn sample(&mut self) -> SensorReading {
        (**self).sample()
    }
}

/// A physical temperature/humidity/pressure device.
pub trait ClimateSensor {
    const NAME: &'static str;

    /// Check the device answers and prepare it for measurements.
    fn probe(&mut self) -> Result<(), SensorError>;

    fn read(&mut self) -> Result<ClimateSample, SensorError>;
}

/// A physical illuminance device.
pub trait LightSensor {
    const NAME: &'static str;

    fn probe(&mut self) -> Result<(), SensorError>;

    /// Illuminance in lux.
    fn read(&mut self) -> Result<f64, SensorError>;
}

fn open_bus(path: &str) -> Result<I2cdev, SensorError> {
    I2cdev::new(path).map_err(|e| SensorError::Bus {
        path: path.to_string(),
        details: e.to_string(),
    })
}

/// Construct the capability selected by configuration.
///
/// Fails only when no sensor at all can be used.
pub fn build_capability(
    config: &CollectorConfig,
) -> Result<Box<dyn SensorCapability>, SensorError> {
    match config.sensor_mode {
        SensorMode::Mock => {
            info!("Using synthetic sensor readings");
            Ok(Box::new(SyntheticCapability::from_entropy()))
        }
        SensorMode::Single => {
            let climate = Bme280Sensor::new(open_bus(&config.i2c_bus)?, Delay);
            let capability =
                HardwareCapability::detect(Some(climate), None::<Bh1750Sensor<I2cdev, Delay>>)?;
            Ok(Box::new(capability))
        }
        SensorMode::Multi => {
            // One bus failure should not hide the other device.
            let climate = match open_bus(&config.i2c_bus) {
                Ok(bus) => Some(Bme280Sensor::new(bus, Delay)),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            };
            let light = match open_bus(&config.i2c_bus) {
                Ok(bus) => Some(Bh1750Sensor::new(bus, Delay)),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            };
            let capability = HardwareCapability::detect(climate, light)?;
            Ok(Box::new(capability))
        }
    }
}

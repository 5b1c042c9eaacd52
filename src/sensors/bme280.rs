//! BME280 temperature, humidity and pressure sensor on the primary address (0x76)

use ::bme280::i2c::BME280;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::debug;

use super::ClimateSensor;
use crate::error::SensorError;
use crate::models::ClimateSample;

pub struct Bme280Sensor<I, D> {
    device: BME280<I>,
    delay: D,
}

impl<I: I2c, D: DelayNs> Bme280Sensor<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self {
            device: BME280::new_primary(i2c),
            delay,
        }
    }
}

impl<I: I2c, D: DelayNs> ClimateSensor for Bme280Sensor<I, D> {
    const NAME: &'static str = "BME280";

    /// Verifies the chip id and loads the calibration table.
    fn probe(&mut self) -> Result<(), SensorError> {
        self.device
            .init(&mut self.delay)
            .map_err(|e| SensorError::InitFailed {
                sensor: Self::NAME,
                details: format!("{:?}", e),
            })
    }

    fn read(&mut self) -> Result<ClimateSample, SensorError> {
        let measurements =
            self.device
                .measure(&mut self.delay)
                .map_err(|e| SensorError::ReadFailed {
                    sensor: Self::NAME,
                    details: format!("{:?}", e),
                })?;

        let sample = ClimateSample {
            temperature: f64::from(measurements.temperature),
            humidity: f64::from(measurements.humidity),
            // Driver reports Pa
            pressure: f64::from(measurements.pressure) / 100.0,
        };
        debug!(
            "BME280: temp={:.2}°C, humidity={:.2}%, pressure={:.2} hPa",
            sample.temperature, sample.humidity, sample.pressure
        );
        Ok(sample)
    }
}

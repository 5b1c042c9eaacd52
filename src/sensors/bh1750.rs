//! BH1750 ambient light sensor in continuous high-resolution mode

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::debug;

use super::LightSensor;
use crate::error::SensorError;

// BH1750 protocol constants
const ADDRESS: u8 = 0x23; // ADDR pin low
const POWER_ON: u8 = 0x01;
const CONTINUOUS_HIGH_RES: u8 = 0x10; // 1 lx resolution
const MEASUREMENT_TIME_MS: u32 = 180; // worst case for high-res mode
const COUNTS_PER_LUX: f64 = 1.2;

pub struct Bh1750Sensor<I, D> {
    i2c: I,
    delay: D,
}

impl<I: I2c, D: DelayNs> Bh1750Sensor<I, D> {
    pub fn new(i2c: I, delay: D) -> Self {
        Self { i2c, delay }
    }

    fn command(&mut self, opcode: u8) -> Result<(), I::Error> {
        self.i2c.write(ADDRESS, &[opcode])
    }
}

/// Convert the big-endian raw count to lux.
pub fn raw_to_lux(data: [u8; 2]) -> f64 {
    f64::from(u16::from_be_bytes(data)) / COUNTS_PER_LUX
}

impl<I: I2c, D: DelayNs> LightSensor for Bh1750Sensor<I, D> {
    const NAME: &'static str = "BH1750";

    fn probe(&mut self) -> Result<(), SensorError> {
        self.command(POWER_ON)
            .and_then(|_| self.command(CONTINUOUS_HIGH_RES))
            .map_err(|e| SensorError::InitFailed {
                sensor: Self::NAME,
                details: format!("{:?}", e),
            })?;
        // First conversion must finish before the register holds a value
        self.delay.delay_ms(MEASUREMENT_TIME_MS);
        Ok(())
    }

    fn read(&mut self) -> Result<f64, SensorError> {
        let mut data = [0u8; 2];
        self.i2c
            .read(ADDRESS, &mut data)
            .map_err(|e| SensorError::ReadFailed {
                sensor: Self::NAME,
                details: format!("{:?}", e),
            })?;

        let lux = raw_to_lux(data);
        debug!("BH1750: {:.2} lux (raw {:02x}{:02x})", lux, data[0], data[1]);
        Ok(lux)
    }
}

#[cfg(test)]
mod tests {
    use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

    use super::*;

    #[derive(Default)]
    struct FakeBus {
        present: bool,
        register: [u8; 2],
        commands: Vec<(u8, Vec<u8>)>,
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if !self.present || address != ADDRESS {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            for operation in operations {
                match operation {
                    Operation::Write(bytes) => self.commands.push((address, bytes.to_vec())),
                    Operation::Read(buffer) => buffer.copy_from_slice(&self.register),
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn converts_raw_counts_to_lux() {
        assert_eq!(raw_to_lux([0x00, 0x00]), 0.0);
        assert!((raw_to_lux([0x01, 0xE0]) - 400.0).abs() < 1e-9);
    }

    #[test]
    fn probe_powers_on_and_selects_mode() {
        let bus = FakeBus {
            present: true,
            ..Default::default()
        };
        let mut sensor = Bh1750Sensor::new(bus, NoDelay);

        sensor.probe().unwrap();

        assert_eq!(
            sensor.i2c.commands,
            vec![(ADDRESS, vec![POWER_ON]), (ADDRESS, vec![CONTINUOUS_HIGH_RES])]
        );
    }

    #[test]
    fn read_returns_lux() {
        let bus = FakeBus {
            present: true,
            register: [0x00, 0x78],
            ..Default::default()
        };
        let mut sensor = Bh1750Sensor::new(bus, NoDelay);

        let lux = sensor.read().unwrap();
        assert!((lux - 100.0).abs() < 1e-9);
    }

    #[test]
    fn missing_device_fails_probe_and_read() {
        let mut sensor = Bh1750Sensor::new(FakeBus::default(), NoDelay);

        assert!(matches!(
            sensor.probe(),
            Err(SensorError::InitFailed { sensor: "BH1750", .. })
        ));
        assert!(matches!(
            sensor.read(),
            Err(SensorError::ReadFailed { sensor: "BH1750", .. })
        ));
    }
}

use std::fmt;

use time::OffsetDateTime;

/// Durable identifier of this station in the shared backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StationId(i32);

impl StationId {
    /// Returns `None` unless `value` is positive; the backend column is a signed `INTEGER`.
    pub fn new(value: i32) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Physical quantities a station can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Temperature,
    Humidity,
    Pressure,
    Illuminance,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::Temperature,
        Field::Humidity,
        Field::Pressure,
        Field::Illuminance,
    ];

    pub fn index(self) -> usize {
        match self {
            Field::Temperature => 0,
            Field::Humidity => 1,
            Field::Pressure => 2,
            Field::Illuminance => 3,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Field::Temperature => "°C",
            Field::Humidity => "%",
            Field::Pressure => "hPa",
            Field::Illuminance => "lux",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Temperature => "temperature",
            Field::Humidity => "humidity",
            Field::Pressure => "pressure",
            Field::Illuminance => "illuminance",
        };
        f.write_str(name)
    }
}

/// One temperature/humidity/pressure measurement from a climate sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

/// Raw values pulled from the sensors in one tick.
///
/// Every field is independently optional; `None` means the sensor was unavailable
/// or its read failed this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorReading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub illuminance: Option<f64>,
}

impl SensorReading {
    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Temperature => self.temperature,
            Field::Humidity => self.humidity,
            Field::Pressure => self.pressure,
            Field::Illuminance => self.illuminance,
        }
    }

    pub fn set(&mut self, field: Field, value: Option<f64>) {
        match field {
            Field::Temperature => self.temperature = value,
            Field::Humidity => self.humidity = value,
            Field::Pressure => self.pressure = value,
            Field::Illuminance => self.illuminance = value,
        }
    }

    pub fn with_climate(mut self, climate: Option<ClimateSample>) -> Self {
        if let Some(sample) = climate {
            self.temperature = Some(sample.temperature);
            self.humidity = Some(sample.humidity);
            self.pressure = Some(sample.pressure);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|field| self.get(*field).is_none())
    }
}

/// Per-field averages of one completed window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAverage {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub illuminance: Option<f64>,
    /// Accepted sample count per field, indexed by [`Field::index`].
    pub samples: [usize; 4],
    pub time: OffsetDateTime,
}

impl WindowAverage {
    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Temperature => self.temperature,
            Field::Humidity => self.humidity,
            Field::Pressure => self.pressure,
            Field::Illuminance => self.illuminance,
        }
    }

    /// True when no field has an average worth persisting.
    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|field| self.get(*field).is_none())
    }
}

/// Backend registry row describing where a station lives on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationRecord {
    pub station_id: StationId,
    pub ip_address: String,
    pub mac_address: String,
}

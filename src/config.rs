use std::env;
use std::fs;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::info;

use crate::error::ConfigError;
use crate::models::StationId;
use crate::validation::{DEFAULT_TEMPERATURE, SENSOR_RATED_TEMPERATURE};

const DEFAULT_STATION_ID_FILE: &str = ".config/station/rcid.txt";
const DEFAULT_I2C_BUS: &str = "/dev/i2c-1";
// Never sent to; only used to pick the outbound route
const DEFAULT_PROBE_ADDRESS: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(8, 8, 8, 8), 80));
const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = 10;
const DEFAULT_WINDOW_SECS: u64 = 300; // 5 minutes
const DEFAULT_PERSISTENCE_TIMEOUT_SECS: u64 = 30;

/// Where readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorMode {
    /// Random values, no hardware.
    Mock,
    /// BME280 only.
    Single,
    /// BME280 and BH1750, each probed at startup.
    Multi,
}

impl FromStr for SensorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" | "synthetic" => Ok(SensorMode::Mock),
            "single" => Ok(SensorMode::Single),
            "multi" => Ok(SensorMode::Multi),
            other => Err(format!("unknown sensor mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub station_id: StationId,
    pub database_url: String,
    pub sensor_mode: SensorMode,
    pub i2c_bus: String,
    pub sample_interval: Duration,
    pub window_duration: Duration,
    pub persistence_timeout: Duration,
    pub temperature_bounds: RangeInclusive<f64>,
    pub network_interface: Option<String>,
    pub probe_address: SocketAddr,
}

impl CollectorConfig {
    pub fn new() -> Result<Self, ConfigError> {
        // Load environment variables
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let station_id_file = match lookup("STATION_ID_FILE") {
            Some(path) => PathBuf::from(path),
            None => {
                let home = lookup("HOME").ok_or(ConfigError::Missing("HOME"))?;
                Path::new(&home).join(DEFAULT_STATION_ID_FILE)
            }
        };
        let station_id = load_station_id(&station_id_file)?;

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let sensor_mode = parse_or("SENSOR_MODE", &lookup, SensorMode::Multi)?;

        let default_bounds = match sensor_mode {
            SensorMode::Single => SENSOR_RATED_TEMPERATURE,
            _ => DEFAULT_TEMPERATURE,
        };
        let temperature_min = parse_or("TEMPERATURE_MIN", &lookup, *default_bounds.start())?;
        let temperature_max = parse_or("TEMPERATURE_MAX", &lookup, *default_bounds.end())?;
        if temperature_min >= temperature_max {
            return Err(ConfigError::Invalid {
                name: "TEMPERATURE_MIN",
                value: temperature_min.to_string(),
                reason: format!("must be below TEMPERATURE_MAX ({})", temperature_max),
            });
        }

        let config = CollectorConfig {
            station_id,
            database_url,
            sensor_mode,
            i2c_bus: lookup("I2C_BUS").unwrap_or_else(|| DEFAULT_I2C_BUS.to_string()),
            sample_interval: seconds(
                "SAMPLE_INTERVAL_SECS",
                &lookup,
                DEFAULT_SAMPLE_INTERVAL_SECS,
            )?,
            window_duration: seconds("WINDOW_SECS", &lookup, DEFAULT_WINDOW_SECS)?,
            persistence_timeout: seconds(
                "PERSISTENCE_TIMEOUT_SECS",
                &lookup,
                DEFAULT_PERSISTENCE_TIMEOUT_SECS,
            )?,
            temperature_bounds: temperature_min..=temperature_max,
            network_interface: lookup("NETWORK_INTERFACE").filter(|name| !name.trim().is_empty()),
            probe_address: parse_or("PROBE_ADDRESS", &lookup, DEFAULT_PROBE_ADDRESS)?,
        };

        info!(
            "Configuration loaded: station {}, {:?} sensors, sampling every {}s, {}s windows",
            config.station_id,
            config.sensor_mode,
            config.sample_interval.as_secs(),
            config.window_duration.as_secs()
        );

        Ok(config)
    }
}

/// Read the station id file. Surrounding whitespace is ignored.
pub fn load_station_id(path: &Path) -> Result<StationId, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::StationIdUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let trimmed = contents.trim();

    trimmed
        .parse::<i32>()
        .ok()
        .and_then(StationId::new)
        .ok_or_else(|| ConfigError::StationIdInvalid(trimmed.to_string()))
}

fn parse_or<T, F>(name: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn seconds<F>(name: &'static str, lookup: &F, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_or(name, lookup, default)?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            name,
            value: secs.to_string(),
            reason: "must be at least one second".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

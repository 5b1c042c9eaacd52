//! Error types for each layer of the collector.
//!
//! Only [`ConfigError`] and [`SensorError::NoSensorAvailable`] are fatal; everything
//! else is logged and confined to the tick or window it happened in.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid or missing local configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("station id file {path:?} could not be read: {source}")]
    StationIdUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("station id {0:?} is not a positive integer")]
    StationIdInvalid(String),

    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Failures at the sensor boundary.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("failed to open I2C bus {path}: {details}")]
    Bus { path: String, details: String },

    #[error("{sensor} initialisation failed: {details}")]
    InitFailed {
        sensor: &'static str,
        details: String,
    },

    #[error("{sensor} read failed: {details}")]
    ReadFailed {
        sensor: &'static str,
        details: String,
    },

    #[error("no sensor responded to the startup probe")]
    NoSensorAvailable,
}

/// Failures talking to the backend database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid database url: {0}")]
    Url(#[from] url::ParseError),

    #[error("SSL setup failed: {0}")]
    Tls(String),

    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("database call did not complete within {0:?}")]
    Timeout(std::time::Duration),
}

/// Failures while reconciling the station's network identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("outbound address probe failed: {0}")]
    Probe(#[source] std::io::Error),

    #[error("probe returned a non-IPv4 local address {0}")]
    NotIpv4(std::net::IpAddr),

    #[error("no usable network interface found")]
    NoInterface,

    #[error("could not read hardware address of {interface}: {details}")]
    HardwareAddress { interface: String, details: String },

    #[error("station registry unavailable: {0}")]
    Registry(#[from] StorageError),
}

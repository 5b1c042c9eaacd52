mod aggregation;
mod collector;
mod config;
mod database;
mod error;
mod identity;
mod models;
mod sensors;
mod utils;
mod validation;

use log::{error, info};

use collector::{Cadence, Collector, MonotonicClock};
use config::CollectorConfig;
use database::PostgresStore;
use identity::{reconcile, SystemNetworkProbe};
use sensors::{build_capability, SensorCapability};
use validation::Validator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match CollectorConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let capability = match build_capability(&config) {
        Ok(capability) => capability,
        Err(e) => {
            error!("Failed to initialise sensors: {}", e);
            return Err(e.into());
        }
    };
    let available = capability.available();
    info!(
        "Sensors available: climate={}, light={}",
        available.climate, available.light
    );

    let store = PostgresStore::new(config.database_url.clone(), config.persistence_timeout);

    // Best effort; collection starts either way
    let probe = SystemNetworkProbe::new(config.probe_address, config.network_interface.clone());
    if let Err(e) = reconcile(config.station_id, &probe, &store).await {
        error!("Station identity synchronisation failed: {}", e);
    }

    let collector = Collector::new(
        config.station_id,
        capability,
        Validator::with_temperature(config.temperature_bounds.clone()),
        store,
        MonotonicClock,
        Cadence {
            sample_interval: config.sample_interval,
            window_duration: config.window_duration,
        },
    );

    // Stop on Ctrl+C; the partial window is dropped
    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Collector terminated by user. Exiting."),
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = collector.run() => {}
        _ = shutdown => {}
    }

    Ok(())
}

//! PostgreSQL implementation of the reading store and station registry

use std::time::Duration;

use crate::database::connection::execute_with_timeout;
use crate::database::{ReadingStore, StationRegistry};
use crate::error::StorageError;
use crate::models::{StationId, StationRecord, WindowAverage};

#[derive(Debug, Clone)]
pub struct PostgresStore {
    database_url: String,
    timeout: Duration,
}

impl PostgresStore {
    pub fn new(database_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            database_url: database_url.into(),
            timeout,
        }
    }
}

impl ReadingStore for PostgresStore {
    /// Insert one row of window averages; absent fields are stored as NULL.
    async fn insert_window(
        &self,
        station_id: StationId,
        averages: &WindowAverage,
    ) -> Result<(), StorageError> {
        let station_id = station_id.get();
        let averages = averages.clone();

        execute_with_timeout(&self.database_url, self.timeout, move |client| async move {
            client
                .execute(
                    "INSERT INTO readings(station_id, temperature, humidity, pressure,
                                          illuminance, inserted_at)
                     VALUES ($1, $2, $3, $4, $5, $6)",
                    &[
                        &station_id,
                        &averages.temperature,
                        &averages.humidity,
                        &averages.pressure,
                        &averages.illuminance,
                        &averages.time,
                    ],
                )
                .await
        })
        .await
        .map(|_| ())
    }
}

impl StationRegistry for PostgresStore {
    async fn get_station_record(
        &self,
        station_id: StationId,
    ) -> Result<Option<StationRecord>, StorageError> {
        let id = station_id.get();

        execute_with_timeout(&self.database_url, self.timeout, move |client| async move {
            let row = client
                .query_opt(
                    "SELECT ip_address, mac_address FROM stations WHERE station_id = $1",
                    &[&id],
                )
                .await?;

            Ok::<_, tokio_postgres::Error>(row.map(|row| StationRecord {
                station_id,
                ip_address: row.get::<_, Option<String>>(0).unwrap_or_default(),
                mac_address: row.get::<_, Option<String>>(1).unwrap_or_default(),
            }))
        })
        .await
    }

    async fn update_station_record(&self, record: &StationRecord) -> Result<u64, StorageError> {
        let id = record.station_id.get();
        let ip_address = record.ip_address.clone();
        let mac_address = record.mac_address.clone();

        execute_with_timeout(&self.database_url, self.timeout, move |client| async move {
            client
                .execute(
                    "UPDATE stations SET ip_address = $1, mac_address = $2 WHERE station_id = $3",
                    &[&ip_address, &mac_address, &id],
                )
                .await
        })
        .await
    }
}

//! Backend persistence: the readings table and the station registry.
#![allow(async_fn_in_trait)]

pub mod connection;
pub mod operations;

use crate::error::StorageError;
use crate::models::{StationId, StationRecord, WindowAverage};

pub use operations::PostgresStore;

/// Sink for completed window averages.
pub trait ReadingStore {
    async fn insert_window(
        &self,
        station_id: StationId,
        averages: &WindowAverage,
    ) -> Result<(), StorageError>;
}

/// Backend-side record of where each station lives on the network.
pub trait StationRegistry {
    async fn get_station_record(
        &self,
        station_id: StationId,
    ) -> Result<Option<StationRecord>, StorageError>;

    /// Returns the number of rows changed; zero means the station is not registered.
    async fn update_station_record(&self, record: &StationRecord) -> Result<u64, StorageError>;
}

//! Fixed-interval sampling, validation, windowing and flush dispatch

use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use tokio::time::sleep;

use crate::aggregation::AggregationWindow;
use crate::database::ReadingStore;
use crate::models::{Field, StationId, WindowAverage};
use crate::sensors::SensorCapability;
use crate::utils::{display_value, format_datetime};
use crate::validation::Validator;

/// Source of monotonic time for window boundaries.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    pub sample_interval: Duration,
    pub window_duration: Duration,
}

/// What happened at a window boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum FlushOutcome {
    Persisted(WindowAverage),
    /// No field had a single accepted sample; nothing was sent.
    NoData,
    /// The store rejected the window; its data is gone.
    Failed(WindowAverage),
}

pub struct Collector<S, R, C = MonotonicClock> {
    station_id: StationId,
    capability: S,
    validator: Validator,
    store: R,
    clock: C,
    cadence: Cadence,
    window: AggregationWindow,
}

impl<S, R, C> Collector<S, R, C>
where
    S: SensorCapability,
    R: ReadingStore,
    C: Clock,
{
    /// The first window starts now.
    pub fn new(
        station_id: StationId,
        capability: S,
        validator: Validator,
        store: R,
        clock: C,
        cadence: Cadence,
    ) -> Self {
        let window = AggregationWindow::new(clock.now(), cadence.window_duration);
        Self {
            station_id,
            capability,
            validator,
            store,
            clock,
            cadence,
            window,
        }
    }

    #[cfg(test)]
    pub fn window(&self) -> &AggregationWindow {
        &self.window
    }

    /// One iteration: sample, filter, buffer, then flush if the window has elapsed.
    pub async fn tick(&mut self) -> Option<FlushOutcome> {
        let raw = self.capability.sample();
        if raw.is_empty() {
            warn!("No sensor delivered a reading this tick");
        }
        let (accepted, rejected) = self.validator.filter(&raw);
        debug!(
            "Sample: T={} H={} P={} L={} ({} rejected)",
            display_value(raw.temperature, Field::Temperature.unit()),
            display_value(raw.humidity, Field::Humidity.unit()),
            display_value(raw.pressure, Field::Pressure.unit()),
            display_value(raw.illuminance, Field::Illuminance.unit()),
            rejected.len()
        );
        self.window.accept(&accepted);
        debug!(
            "Window holds {:?} samples",
            Field::ALL.map(|field| self.window.sample_count(field))
        );

        let now = self.clock.now();
        if self.window.is_expired(now) {
            Some(self.flush(now).await)
        } else {
            None
        }
    }

    async fn flush(&mut self, now: Instant) -> FlushOutcome {
        // Window is reset before the store is called, so a failure cannot leak samples
        let averages = self.window.flush(now);

        if averages.is_empty() {
            warn!(
                "No valid readings during the last {}s window!",
                self.cadence.window_duration.as_secs()
            );
            return FlushOutcome::NoData;
        }

        match self.store.insert_window(self.station_id, &averages).await {
            Ok(()) => {
                info!(
                    "Stored window for station {} at {}: T={} H={} P={} L={} (samples {:?})",
                    self.station_id,
                    format_datetime(&averages.time),
                    display_value(averages.temperature, Field::Temperature.unit()),
                    display_value(averages.humidity, Field::Humidity.unit()),
                    display_value(averages.pressure, Field::Pressure.unit()),
                    display_value(averages.illuminance, Field::Illuminance.unit()),
                    averages.samples
                );
                FlushOutcome::Persisted(averages)
            }
            Err(e) => {
                error!(
                    "Failed to store window for station {}, discarding it: {}",
                    self.station_id, e
                );
                FlushOutcome::Failed(averages)
            }
        }
    }

    /// Run until the process is stopped.
    ///
    /// The sleep is fixed, so each cycle drifts by the time spent sampling and storing.
    pub async fn run(mut self) {
        info!(
            "Collecting for station {}: sampling every {}s, flushing every {}s",
            self.station_id,
            self.cadence.sample_interval.as_secs(),
            self.cadence.window_duration.as_secs()
        );

        loop {
            self.tick().await;
            sleep(self.cadence.sample_interval).await;
        }
    }
}

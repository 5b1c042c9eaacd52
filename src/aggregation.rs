//! Fixed-duration accumulation of validated samples

use std::time::{Duration, Instant};

use time::OffsetDateTime;

use crate::models::{Field, SensorReading, WindowAverage};
use crate::utils::{mean, round_hundredths};

/// Buffers accepted samples per field until the window duration has elapsed.
///
/// Raw samples keep full precision; rounding happens only in [`flush`](Self::flush).
#[derive(Debug)]
pub struct AggregationWindow {
    samples: [Vec<f64>; 4],
    started_at: Instant,
    duration: Duration,
}

impl AggregationWindow {
    pub fn new(started_at: Instant, duration: Duration) -> Self {
        Self {
            samples: Default::default(),
            started_at,
            duration,
        }
    }

    /// Append every present field of an already validated reading.
    pub fn accept(&mut self, reading: &SensorReading) {
        for field in Field::ALL {
            if let Some(value) = reading.get(field) {
                self.samples[field.index()].push(value);
            }
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started_at) >= self.duration
    }

    #[cfg(test)]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn sample_count(&self, field: Field) -> usize {
        self.samples[field.index()].len()
    }

    /// Average every field, then start a fresh window at `now`.
    ///
    /// The reset happens whatever the caller later does with the averages, so no
    /// sample ever leaks into the next window.
    pub fn flush(&mut self, now: Instant) -> WindowAverage {
        let average = |field: Field| mean(&self.samples[field.index()]).map(round_hundredths);

        let result = WindowAverage {
            temperature: average(Field::Temperature),
            humidity: average(Field::Humidity),
            pressure: average(Field::Pressure),
            illuminance: average(Field::Illuminance),
            samples: Field::ALL.map(|field| self.samples[field.index()].len()),
            time: OffsetDateTime::now_utc(),
        };

        for buffer in &mut self.samples {
            buffer.clear();
        }
        self.started_at = now;

        result
    }
}

//! Windowed Averaging of Accepted Readings
//!
//! Accepted values accumulate into running per-channel sums over a fixed
//! wall-clock window (one minute by default). When the window elapses the
//! aggregator emits a single averaged record and starts the next window.
//!
//! Two rules keep the averages honest:
//!
//! - A window that accumulated nothing emits nothing. Zero samples must
//!   not become a record of zeros.
//! - Window boundaries are wall-clock based, not sample-count based. A
//!   quiet stretch neither stretches nor shrinks the windows after it;
//!   the next window simply starts when the previous one is flushed.
//!
//! The accumulator only ingests polls once every channel has an accepted
//! baseline, so a shared sample count stays aligned with all three sums
//! and a faulted channel is never averaged in as zero.

use crate::constants::DEFAULT_WINDOW_MS;
use crate::sample::{AcceptedReading, AveragedRecord};
use crate::time::Timestamp;

/// Running sums for the window in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowAccumulator {
    /// Sum of accepted temperatures.
    pub temp_sum: f32,
    /// Sum of accepted humidities.
    pub humid_sum: f32,
    /// Sum of accepted soil percentages.
    pub soil_sum: f32,
    /// Number of polls accumulated this window.
    pub count: u32,
    /// Wall-clock start of the current window; anchored by the first
    /// flush check after startup.
    pub window_start: Timestamp,
}

/// Accumulates accepted readings and emits one record per elapsed window.
#[derive(Debug, Clone)]
pub struct WindowAggregator {
    window_ms: u32,
    anchored: bool,
    acc: WindowAccumulator,
}

impl Default for WindowAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS)
    }
}

impl WindowAggregator {
    /// Aggregator with a custom window duration in milliseconds.
    pub fn new(window_ms: u32) -> Self {
        Self {
            window_ms,
            anchored: false,
            acc: WindowAccumulator::default(),
        }
    }

    /// Current accumulator state, for diagnostics.
    pub fn accumulator(&self) -> &WindowAccumulator {
        &self.acc
    }

    /// Fold the current accepted values into the window.
    ///
    /// Call on polls where at least one channel changed. Adds the full
    /// accepted values, not deltas, so the average reflects what the
    /// device actually reported across the window. Skipped until every
    /// channel has a baseline.
    pub fn accumulate(&mut self, accepted: &AcceptedReading) {
        let (Some(temp), Some(humid), Some(soil)) =
            (accepted.temperature, accepted.humidity, accepted.soil)
        else {
            return;
        };

        self.acc.temp_sum += temp;
        self.acc.humid_sum += humid;
        self.acc.soil_sum += soil;
        self.acc.count += 1;
    }

    /// Close the window if it has elapsed.
    ///
    /// Returns the averaged record when the window expired with at least
    /// one accumulated poll. Whether or not a record is emitted, an
    /// expired window resets the sums and restarts at `now`. The first
    /// call anchors the initial window and emits nothing.
    pub fn maybe_flush(&mut self, now: Timestamp) -> Option<AveragedRecord> {
        if !self.anchored {
            self.anchored = true;
            self.acc.window_start = now;
            return None;
        }

        if now.saturating_sub(self.acc.window_start) < u64::from(self.window_ms) {
            return None;
        }

        let emitted = (self.acc.count > 0).then(|| {
            let n = self.acc.count as f32;
            AveragedRecord {
                timestamp: now,
                temperature: self.acc.temp_sum / n,
                humidity: self.acc.humid_sum / n,
                soil: self.acc.soil_sum / n,
            }
        });

        self.acc = WindowAccumulator {
            window_start: now,
            ..WindowAccumulator::default()
        };

        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: u64 = 60_000;

    fn accepted(temp: f32, humid: f32, soil: f32) -> AcceptedReading {
        AcceptedReading {
            temperature: Some(temp),
            humidity: Some(humid),
            soil: Some(soil),
        }
    }

    #[test]
    fn averages_over_window() {
        // Two accepted temperatures, 21 and 23, average to 22.
        let mut agg = WindowAggregator::new(WINDOW as u32);
        assert!(agg.maybe_flush(1_000).is_none()); // anchors the window

        agg.accumulate(&accepted(21.0, 50.0, 40.0));
        agg.accumulate(&accepted(23.0, 54.0, 42.0));

        let record = agg.maybe_flush(1_000 + WINDOW).expect("window elapsed");
        assert_eq!(record.temperature, 22.0);
        assert_eq!(record.humidity, 52.0);
        assert_eq!(record.soil, 41.0);
        assert_eq!(record.timestamp, 1_000 + WINDOW);
    }

    #[test]
    fn no_emit_before_window_elapses() {
        let mut agg = WindowAggregator::new(WINDOW as u32);
        agg.maybe_flush(0);
        agg.accumulate(&accepted(21.0, 50.0, 40.0));

        assert!(agg.maybe_flush(WINDOW - 1).is_none());
        assert_eq!(agg.accumulator().count, 1);
    }

    #[test]
    fn empty_window_emits_nothing_but_restarts() {
        let mut agg = WindowAggregator::new(WINDOW as u32);
        agg.maybe_flush(5_000);

        // Quiet minute: no accumulation at all.
        assert!(agg.maybe_flush(5_000 + WINDOW).is_none());
        assert_eq!(agg.accumulator().window_start, 5_000 + WINDOW);

        // The next window is a full-length one, not stretched by the
        // quiet period before it.
        agg.accumulate(&accepted(20.0, 50.0, 40.0));
        assert!(agg.maybe_flush(5_000 + WINDOW + WINDOW / 2).is_none());
        assert!(agg.maybe_flush(5_000 + 2 * WINDOW).is_some());
    }

    #[test]
    fn flush_resets_sums() {
        let mut agg = WindowAggregator::new(WINDOW as u32);
        agg.maybe_flush(0);
        agg.accumulate(&accepted(21.0, 50.0, 40.0));
        agg.maybe_flush(WINDOW).expect("first record");

        agg.accumulate(&accepted(30.0, 60.0, 50.0));
        let record = agg.maybe_flush(2 * WINDOW).expect("second record");
        // Only the second window's sample contributes.
        assert_eq!(record.temperature, 30.0);
    }

    #[test]
    fn incomplete_baseline_is_not_accumulated() {
        let mut agg = WindowAggregator::new(WINDOW as u32);
        agg.maybe_flush(0);

        agg.accumulate(&AcceptedReading {
            temperature: Some(21.0),
            humidity: None,
            soil: Some(40.0),
        });

        assert_eq!(agg.accumulator().count, 0);
        assert!(agg.maybe_flush(WINDOW).is_none());
    }
}

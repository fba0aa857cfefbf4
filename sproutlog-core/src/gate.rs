//! Store-Change Gate for Averaged Records
//!
//! Second-stage filter in front of the flash log. Values that individually
//! cleared the live filter during a window can still average out to nearly
//! the same record as last time; writing those would burn flash cycles on
//! no information. The gate compares each candidate record against the
//! last record actually persisted and lets it through when ANY channel
//! moved by at least its threshold.
//!
//! Contract differences from the live filter, on purpose:
//! - channels are OR-combined here, evaluated independently there;
//! - a delta exactly equal to the threshold stores here, but does not
//!   fire there.

use crate::filter::ChangeThresholds;
use crate::sample::AveragedRecord;

/// The most recently persisted record's numeric fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastStored {
    /// Temperature of the last stored record (°C).
    pub temperature: f32,
    /// Humidity of the last stored record (%RH).
    pub humidity: f32,
    /// Soil moisture of the last stored record (%).
    pub soil: f32,
}

/// Decides whether an averaged record diverges enough to persist.
#[derive(Debug, Clone, Default)]
pub struct StoreGate {
    thresholds: ChangeThresholds,
    last_stored: Option<LastStored>,
}

impl StoreGate {
    /// Gate with the default deployment thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate with custom thresholds.
    pub fn with_thresholds(thresholds: ChangeThresholds) -> Self {
        Self {
            thresholds,
            last_stored: None,
        }
    }

    /// Baseline of the last committed record, if any.
    pub fn last_stored(&self) -> Option<&LastStored> {
        self.last_stored.as_ref()
    }

    /// Whether `record` should be persisted.
    ///
    /// True for the very first record, or when at least one channel's
    /// delta from the last stored record meets or exceeds its threshold.
    /// Does not mutate the baseline; call [`StoreGate::commit`] after the
    /// append succeeds.
    pub fn should_store(&self, record: &AveragedRecord) -> bool {
        let Some(last) = &self.last_stored else {
            return true;
        };

        libm::fabsf(record.temperature - last.temperature) >= self.thresholds.temperature
            || libm::fabsf(record.humidity - last.humidity) >= self.thresholds.humidity
            || libm::fabsf(record.soil - last.soil) >= self.thresholds.soil
    }

    /// Adopt `record` as the new comparison baseline.
    pub fn commit(&mut self, record: &AveragedRecord) {
        self.last_stored = Some(LastStored {
            temperature: record.temperature,
            humidity: record.humidity,
            soil: record.soil,
        });
    }
}

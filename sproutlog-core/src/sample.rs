//! Sample and Record Types for the Retention Pipeline
//!
//! ## Overview
//!
//! This module defines the values that flow through the pipeline:
//!
//! 1. **Acquisition**: drivers produce one [`RawSample`] per poll
//! 2. **Filtering**: significant changes update the [`AcceptedReading`]
//! 3. **Aggregation**: accepted values average into an [`AveragedRecord`]
//! 4. **Persistence**: records that pass the store gate become CSV lines
//!
//! ## Absence Is Not Zero
//!
//! A faulted sensor yields `None`, and `None` stays `None` through every
//! stage. The one place this matters most is averaging: a window that saw
//! no valid samples emits nothing rather than a record full of zeros.
//!
//! All types are plain `Copy` data, small enough to hand to consumers by
//! value; nothing here allocates.

use crate::constants::SOIL_ADC_MAX;
use crate::time::Timestamp;

/// Measurement channels produced by the sensor suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Channel {
    /// Air temperature.
    Temperature = 0,
    /// Relative humidity.
    Humidity = 1,
    /// Soil moisture (percent of probe range).
    Soil = 2,
}

impl Channel {
    /// Key used for this channel in push payloads and display handoffs.
    pub const fn name(&self) -> &'static str {
        match self {
            Channel::Temperature => "temperature",
            Channel::Humidity => "humidity",
            Channel::Soil => "soil",
        }
    }

    /// Unit of measurement.
    pub const fn unit(&self) -> &'static str {
        match self {
            Channel::Temperature => "°C",
            Channel::Humidity => "%",
            Channel::Soil => "%",
        }
    }
}

/// One poll's worth of raw sensor output.
///
/// `temperature` and `humidity` are `None` when the sensor faulted this
/// poll. The soil probe is an ADC channel and always reads *something*;
/// mapping to percent happens in the filter, not here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Air temperature in °C, if the sensor responded.
    pub temperature: Option<f32>,
    /// Relative humidity in %, if the sensor responded.
    pub humidity: Option<f32>,
    /// Raw soil ADC count, `0..=4095`.
    pub soil_raw: u16,
    /// When the poll happened.
    pub timestamp: Timestamp,
}

/// Last live value per channel that passed the change filter.
///
/// Channels start as `None` and stay that way until their first accepted
/// reading. Live consumers (push, display) read this; the filter is the
/// only writer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AcceptedReading {
    /// Last accepted temperature (°C).
    pub temperature: Option<f32>,
    /// Last accepted humidity (%RH).
    pub humidity: Option<f32>,
    /// Last accepted soil moisture (percent, already mapped from raw).
    pub soil: Option<f32>,
}

impl AcceptedReading {
    /// Value of one channel.
    pub fn get(&self, channel: Channel) -> Option<f32> {
        match channel {
            Channel::Temperature => self.temperature,
            Channel::Humidity => self.humidity,
            Channel::Soil => self.soil,
        }
    }

    /// Whether every channel has produced at least one accepted value.
    pub fn is_complete(&self) -> bool {
        self.temperature.is_some() && self.humidity.is_some() && self.soil.is_some()
    }
}

/// Which channels changed during one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeFlags {
    /// Temperature moved past its threshold.
    pub temperature: bool,
    /// Humidity moved past its threshold.
    pub humidity: bool,
    /// Soil moisture moved past its threshold.
    pub soil: bool,
}

impl ChangeFlags {
    /// True when at least one channel changed.
    pub fn any(&self) -> bool {
        self.temperature || self.humidity || self.soil
    }

    /// Whether one channel's flag is set.
    pub fn is_set(&self, channel: Channel) -> bool {
        match channel {
            Channel::Temperature => self.temperature,
            Channel::Humidity => self.humidity,
            Channel::Soil => self.soil,
        }
    }
}

/// One completed averaging window with at least one accepted sample.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AveragedRecord {
    /// Wall-clock time the window closed.
    pub timestamp: Timestamp,
    /// Mean temperature over the window (°C).
    pub temperature: f32,
    /// Mean humidity over the window (%RH).
    pub humidity: f32,
    /// Mean soil moisture over the window (%).
    pub soil: f32,
}

/// Map a raw soil ADC count to a moisture percentage.
///
/// The probe reads full scale when dry: `4095 → 0%`, `0 → 100%`. The
/// inversion matches the probe wiring and must not be "corrected".
/// Out-of-range counts clamp to full scale.
pub fn soil_percent(raw: u16) -> f32 {
    let raw = raw.min(SOIL_ADC_MAX);
    f32::from(SOIL_ADC_MAX - raw) * 100.0 / f32::from(SOIL_ADC_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names() {
        assert_eq!(Channel::Temperature.name(), "temperature");
        assert_eq!(Channel::Soil.unit(), "%");
    }

    #[test]
    fn soil_mapping_polarity() {
        // Dry probe pegs the ADC high.
        assert_eq!(soil_percent(4095), 0.0);
        assert_eq!(soil_percent(0), 100.0);

        let mid = soil_percent(2048);
        assert!((mid - 50.0).abs() < 0.1);
    }

    #[test]
    fn soil_mapping_clamps() {
        assert_eq!(soil_percent(u16::MAX), 0.0);
    }

    #[test]
    fn accepted_reading_completeness() {
        let mut reading = AcceptedReading::default();
        assert!(!reading.is_complete());

        reading.temperature = Some(21.0);
        reading.humidity = Some(55.0);
        assert!(!reading.is_complete());

        reading.soil = Some(40.0);
        assert!(reading.is_complete());
        assert_eq!(reading.get(Channel::Soil), Some(40.0));
    }

    #[test]
    fn change_flags_any() {
        let mut flags = ChangeFlags::default();
        assert!(!flags.any());

        flags.humidity = true;
        assert!(flags.any());
        assert!(flags.is_set(Channel::Humidity));
        assert!(!flags.is_set(Channel::Temperature));
    }
}

//! Per-Channel Change Filter for Live Readings
//!
//! ## Overview
//!
//! Raw sensor output is noisy: consumer temperature parts wander by a
//! tenth of a degree between polls, humidity sensors oscillate by a
//! percent or two, and capacitive soil probes bounce with supply voltage.
//! Forwarding every wiggle would spam the push channel and, worse, feed
//! noise into the averaging window.
//!
//! The filter keeps one baseline per channel (the last *accepted* value)
//! and only moves it when a new reading differs by more than the channel's
//! threshold. Crucially, a reading inside the threshold leaves the
//! baseline untouched rather than nudging it: if small drift updated the
//! baseline, a value oscillating around the threshold would fire on every
//! poll.
//!
//! Each channel is evaluated independently. This is deliberately a
//! different contract from the store gate, which ORs its channels
//! together; the two must not be merged.

use crate::constants::{
    HUMIDITY_CHANGE_THRESHOLD_PCT, SOIL_CHANGE_THRESHOLD_PCT, TEMP_CHANGE_THRESHOLD_C,
};
use crate::sample::{soil_percent, AcceptedReading, ChangeFlags, RawSample};

/// Per-channel significance thresholds, in each channel's own unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeThresholds {
    /// Temperature threshold (°C).
    pub temperature: f32,
    /// Humidity threshold (%RH).
    pub humidity: f32,
    /// Soil moisture threshold (% of range).
    pub soil: f32,
}

impl Default for ChangeThresholds {
    fn default() -> Self {
        Self {
            temperature: TEMP_CHANGE_THRESHOLD_C,
            humidity: HUMIDITY_CHANGE_THRESHOLD_PCT,
            soil: SOIL_CHANGE_THRESHOLD_PCT,
        }
    }
}

/// Hysteresis filter that owns the live accepted readings.
///
/// The filter is the only writer of [`AcceptedReading`]; everyone else
/// reads it through [`SampleFilter::accepted`].
#[derive(Debug, Clone, Default)]
pub struct SampleFilter {
    thresholds: ChangeThresholds,
    accepted: AcceptedReading,
}

impl SampleFilter {
    /// Filter with the default deployment thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter with custom thresholds.
    pub fn with_thresholds(thresholds: ChangeThresholds) -> Self {
        Self {
            thresholds,
            accepted: AcceptedReading::default(),
        }
    }

    /// Current live values.
    pub fn accepted(&self) -> &AcceptedReading {
        &self.accepted
    }

    /// Run one raw sample through the filter.
    ///
    /// Per channel: an absent or non-finite reading is skipped outright;
    /// otherwise the channel changes iff the reading differs from the
    /// baseline by strictly more than the threshold, and only then does
    /// the baseline move. A channel's first valid reading is always
    /// accepted. Soil is mapped from its raw ADC count to percent before
    /// comparison.
    pub fn apply(&mut self, raw: &RawSample) -> ChangeFlags {
        let mut flags = ChangeFlags::default();

        if let Some(value) = raw.temperature {
            flags.temperature =
                channel_update(&mut self.accepted.temperature, value, self.thresholds.temperature);
        }
        if let Some(value) = raw.humidity {
            flags.humidity =
                channel_update(&mut self.accepted.humidity, value, self.thresholds.humidity);
        }

        let soil = soil_percent(raw.soil_raw);
        flags.soil = channel_update(&mut self.accepted.soil, soil, self.thresholds.soil);

        flags
    }
}

/// Accept `value` into `baseline` if it moved far enough.
///
/// Returns whether the baseline changed. Non-finite values (NaN from a
/// misbehaving driver) are treated like an absent reading.
fn channel_update(baseline: &mut Option<f32>, value: f32, threshold: f32) -> bool {
    if !value.is_finite() {
        return false;
    }

    match *baseline {
        None => {
            *baseline = Some(value);
            true
        }
        Some(prev) if libm::fabsf(value - prev) > threshold => {
            *baseline = Some(value);
            true
        }
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SOIL_ADC_MAX;
    use proptest::prelude::*;

    fn sample(temperature: Option<f32>, humidity: Option<f32>, soil_raw: u16) -> RawSample {
        RawSample {
            temperature,
            humidity,
            soil_raw,
            timestamp: 0,
        }
    }

    #[test]
    fn first_reading_is_accepted() {
        let mut filter = SampleFilter::new();
        let flags = filter.apply(&sample(Some(20.0), Some(50.0), 2048));

        assert!(flags.temperature && flags.humidity && flags.soil);
        assert_eq!(filter.accepted().temperature, Some(20.0));
    }

    #[test]
    fn sub_threshold_drift_is_suppressed() {
        // 20.0, 20.05, 20.3 with a 0.2° threshold: the middle sample is
        // noise, the last is a real change.
        let mut filter = SampleFilter::new();

        filter.apply(&sample(Some(20.0), None, 0));
        assert_eq!(filter.accepted().temperature, Some(20.0));

        let flags = filter.apply(&sample(Some(20.05), None, 0));
        assert!(!flags.temperature);
        assert_eq!(filter.accepted().temperature, Some(20.0));

        let flags = filter.apply(&sample(Some(20.3), None, 0));
        assert!(flags.temperature);
        assert_eq!(filter.accepted().temperature, Some(20.3));
    }

    #[test]
    fn baseline_survives_oscillation() {
        // Drift that never clears the threshold must never creep the
        // baseline forward, no matter how long it goes on.
        let mut filter = SampleFilter::new();
        filter.apply(&sample(Some(20.0), None, 0));

        for value in [20.15, 19.85, 20.19, 19.81, 20.1] {
            let flags = filter.apply(&sample(Some(value), None, 0));
            assert!(!flags.temperature, "{value} should not fire");
        }
        assert_eq!(filter.accepted().temperature, Some(20.0));
    }

    #[test]
    fn absent_reading_keeps_baseline() {
        let mut filter = SampleFilter::new();
        filter.apply(&sample(Some(21.0), Some(60.0), 1000));

        let flags = filter.apply(&sample(None, None, 1000));
        assert!(!flags.temperature && !flags.humidity);
        assert_eq!(filter.accepted().temperature, Some(21.0));
        assert_eq!(filter.accepted().humidity, Some(60.0));
    }

    #[test]
    fn nan_reading_is_skipped() {
        let mut filter = SampleFilter::new();
        filter.apply(&sample(Some(21.0), None, 0));

        let flags = filter.apply(&sample(Some(f32::NAN), None, 0));
        assert!(!flags.temperature);
        assert_eq!(filter.accepted().temperature, Some(21.0));
    }

    #[test]
    fn soil_thresholds_apply_to_percent() {
        // 1% of a 12-bit range is about 41 counts; a 20-count wiggle must
        // not register.
        let mut filter = SampleFilter::new();
        filter.apply(&sample(None, None, 2048));

        let flags = filter.apply(&sample(None, None, 2068));
        assert!(!flags.soil);

        let flags = filter.apply(&sample(None, None, 2048 + 100));
        assert!(flags.soil);
    }

    #[test]
    fn equal_to_threshold_does_not_fire() {
        let mut filter = SampleFilter::with_thresholds(ChangeThresholds {
            temperature: 0.5,
            humidity: 2.0,
            soil: 1.0,
        });
        filter.apply(&sample(Some(20.0), None, 0));

        let flags = filter.apply(&sample(Some(20.5), None, 0));
        assert!(!flags.temperature);
    }

    proptest! {
        /// A channel with an established baseline changes iff the new
        /// value differs by strictly more than the threshold.
        #[test]
        fn changes_iff_delta_exceeds_threshold(
            prev in -40.0f32..85.0,
            value in -40.0f32..85.0,
            threshold in 0.05f32..5.0,
        ) {
            let mut filter = SampleFilter::with_thresholds(ChangeThresholds {
                temperature: threshold,
                humidity: 2.0,
                soil: 1.0,
            });
            filter.apply(&sample(Some(prev), None, 0));

            let flags = filter.apply(&sample(Some(value), None, 0));
            let expected = (value - prev).abs() > threshold;
            prop_assert_eq!(flags.temperature, expected);

            let baseline = filter.accepted().temperature.unwrap();
            prop_assert_eq!(baseline, if expected { value } else { prev });
        }
    }

    #[test]
    fn soil_full_range_maps_before_filtering() {
        let mut filter = SampleFilter::new();
        filter.apply(&sample(None, None, SOIL_ADC_MAX));
        assert_eq!(filter.accepted().soil, Some(0.0));

        filter.apply(&sample(None, None, 0));
        assert_eq!(filter.accepted().soil, Some(100.0));
    }
}

//! Reading Pipeline: One Poll Cycle, Start to Finish
//!
//! ## Overview
//!
//! The pipeline owns every piece of mutable retention state (the filter's
//! accepted readings, the window accumulator, the store gate's baseline,
//! and the log) in one context struct, created at startup and driven by
//! a single polling loop. There are no globals and no locks: exactly one
//! logical thread of control touches this state, in strict sequence.
//!
//! ```text
//! sensors → filter ──→ push / display (live, every significant change)
//!                 └──→ accumulate → window flush → gate → CSV log
//! ```
//!
//! The two arms are independent on purpose. Storage trouble (missing
//! mount, unsynced clock, failed rotation) never stops live reporting;
//! it surfaces in the [`PollOutcome`] and the cycle simply tries again
//! next time.
//!
//! A poll that triggers a rotation blocks for the duration; the loop must
//! not re-enter `poll` concurrently. That single-flight discipline is the
//! whole concurrency model.

use crate::aggregate::WindowAggregator;
use crate::errors::StoreError;
use crate::filter::{ChangeThresholds, SampleFilter};
use crate::gate::StoreGate;
use crate::sample::{AcceptedReading, Channel, ChangeFlags, RawSample};
use crate::store::SensorLog;
use crate::time::Clock;

use serde_json::{Map, Value};

/// Synchronous sensor drivers, as exposed by the hardware layer.
///
/// `None` from the climate sensors means a fault this poll; the soil
/// probe is an ADC channel and always produces a count.
pub trait SensorSuite {
    /// Air temperature in °C, if the sensor responded.
    fn read_temperature(&mut self) -> Option<f32>;
    /// Relative humidity in %, if the sensor responded.
    fn read_humidity(&mut self) -> Option<f32>;
    /// Raw soil ADC count, `0..=4095`.
    fn read_soil_raw(&mut self) -> u16;
}

/// Device health snapshot included in every push payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DeviceHealth {
    /// Free heap, KiB.
    pub free_heap_kb: u32,
    /// CPU clock, MHz.
    pub cpu_mhz: u32,
    /// Flash chip size, MiB.
    pub flash_mb: u32,
    /// Running firmware image size, KiB.
    pub firmware_kb: u32,
    /// Space left for OTA images, KiB.
    pub firmware_free_kb: u32,
}

/// Source of [`DeviceHealth`] snapshots.
pub trait HealthProbe {
    /// Sample current device health.
    fn sample(&self) -> DeviceHealth;
}

/// Consumer of live change notifications (push channel, display).
///
/// Receives a flat JSON object mapping each changed channel's name to its
/// new value as a 2-decimal string, plus the device-health fields. Never
/// called on polls where nothing changed.
pub trait LiveSink {
    /// Deliver one payload.
    fn push(&mut self, payload: &str);
}

/// What one poll cycle did.
#[derive(Debug, Default)]
pub struct PollOutcome {
    /// Channels whose live value changed.
    pub changed: ChangeFlags,
    /// An averaging window closed this cycle.
    pub flushed: bool,
    /// A record was appended to the log.
    pub stored: bool,
    /// Persistence problem, if any; never fatal.
    pub error: Option<StoreError>,
}

/// The retention pipeline context.
pub struct ReadingPipeline<C, S, H, L> {
    clock: C,
    sensors: S,
    health: H,
    sink: L,
    filter: SampleFilter,
    aggregator: WindowAggregator,
    gate: StoreGate,
    log: SensorLog,
}

impl<C, S, H, L> ReadingPipeline<C, S, H, L>
where
    C: Clock,
    S: SensorSuite,
    H: HealthProbe,
    L: LiveSink,
{
    /// Assemble a pipeline with default thresholds and window.
    pub fn new(clock: C, sensors: S, health: H, sink: L, log: SensorLog) -> Self {
        Self {
            clock,
            sensors,
            health,
            sink,
            filter: SampleFilter::new(),
            aggregator: WindowAggregator::default(),
            gate: StoreGate::new(),
            log,
        }
    }

    /// Override the live change thresholds.
    pub fn with_live_thresholds(mut self, thresholds: ChangeThresholds) -> Self {
        self.filter = SampleFilter::with_thresholds(thresholds);
        self
    }

    /// Override the store gate thresholds.
    pub fn with_store_thresholds(mut self, thresholds: ChangeThresholds) -> Self {
        self.gate = StoreGate::with_thresholds(thresholds);
        self
    }

    /// Override the averaging window duration (milliseconds).
    pub fn with_window(mut self, window_ms: u32) -> Self {
        self.aggregator = WindowAggregator::new(window_ms);
        self
    }

    /// Live values for display consumers.
    pub fn accepted(&self) -> &AcceptedReading {
        self.filter.accepted()
    }

    /// The underlying log (path, stats) for the serving layer.
    pub fn log(&self) -> &SensorLog {
        &self.log
    }

    /// Run one poll cycle.
    pub fn poll(&mut self) -> PollOutcome {
        let now = self.clock.now();
        let raw = RawSample {
            temperature: self.sensors.read_temperature(),
            humidity: self.sensors.read_humidity(),
            soil_raw: self.sensors.read_soil_raw(),
            timestamp: now,
        };

        let changed = self.filter.apply(&raw);
        let mut outcome = PollOutcome {
            changed,
            ..PollOutcome::default()
        };

        if changed.any() {
            let payload = self.render_push(&changed);
            self.sink.push(&payload);
            self.aggregator.accumulate(self.filter.accepted());
        }

        let Some(record) = self.aggregator.maybe_flush(now) else {
            return outcome;
        };
        outcome.flushed = true;

        if !self.clock.is_wall_clock() {
            // No real timestamp, no record; the live path above already ran.
            log::debug!("window closed before time sync; record dropped");
            outcome.error = Some(StoreError::TimeUnavailable);
            return outcome;
        }

        if self.gate.should_store(&record) {
            match self.log.append(&record) {
                Ok(()) => {
                    self.gate.commit(&record);
                    outcome.stored = true;
                }
                Err(err) => {
                    log::warn!("record append failed: {err}");
                    outcome.error = Some(err);
                }
            }
        }

        outcome
    }

    /// Build the push payload for this poll's changed channels.
    fn render_push(&self, changed: &ChangeFlags) -> String {
        let mut payload = Map::new();
        let accepted = self.filter.accepted();

        for channel in [Channel::Temperature, Channel::Humidity, Channel::Soil] {
            if !changed.is_set(channel) {
                continue;
            }
            if let Some(value) = accepted.get(channel) {
                payload.insert(channel.name().into(), Value::String(format!("{value:.2}")));
            }
        }

        if let Ok(Value::Object(health)) = serde_json::to_value(self.health.sample()) {
            payload.extend(health);
        }

        Value::Object(payload).to_string()
    }
}

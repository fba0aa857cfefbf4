//! Retention core for SproutLog
//!
//! Decides which raw sensor readings matter, averages them over fixed
//! wall-clock windows, and persists the averages into a size-bounded
//! CSV log on constrained flash storage.
//!
//! Key constraints:
//! - Bounded memory: fixed-capacity buffers everywhere, no growth over time
//! - Bounded storage: the log rotates itself, oldest records first
//! - Nothing fatal: every failure degrades to "skip this cycle, retry next"
//!
//! ```no_run
//! use sproutlog_core::{ReadingPipeline, SensorLog, SystemClock, constants};
//! # use sproutlog_core::{SensorSuite, HealthProbe, LiveSink, DeviceHealth};
//! # struct Drivers; struct Probe; struct Push;
//! # impl SensorSuite for Drivers {
//! #     fn read_temperature(&mut self) -> Option<f32> { None }
//! #     fn read_humidity(&mut self) -> Option<f32> { None }
//! #     fn read_soil_raw(&mut self) -> u16 { 0 }
//! # }
//! # impl HealthProbe for Probe {
//! #     fn sample(&self) -> DeviceHealth {
//! #         DeviceHealth { free_heap_kb: 0, cpu_mhz: 0, flash_mb: 0, firmware_kb: 0, firmware_free_kb: 0 }
//! #     }
//! # }
//! # impl LiveSink for Push { fn push(&mut self, _payload: &str) {} }
//!
//! let log = SensorLog::new(constants::LOG_PATH);
//! let mut pipeline = ReadingPipeline::new(SystemClock, Drivers, Probe, Push, log);
//!
//! loop {
//!     let outcome = pipeline.poll();
//!     // sleep for constants::DEFAULT_POLL_INTERVAL_MS ...
//!     # if outcome.flushed { break; }
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod constants;
pub mod errors;
pub mod filter;
pub mod gate;
pub mod sample;
pub mod time;

#[cfg(feature = "std")]
pub mod pipeline;
#[cfg(feature = "std")]
pub mod store;

// Public API
pub use aggregate::{WindowAccumulator, WindowAggregator};
pub use errors::{StoreError, StoreResult};
pub use filter::{ChangeThresholds, SampleFilter};
pub use gate::{LastStored, StoreGate};
pub use sample::{AcceptedReading, AveragedRecord, Channel, ChangeFlags, RawSample};
pub use time::{Clock, FixedClock, Timestamp};

#[cfg(feature = "std")]
pub use pipeline::{
    DeviceHealth, HealthProbe, LiveSink, PollOutcome, ReadingPipeline, SensorSuite,
};
#[cfg(feature = "std")]
pub use store::{SensorLog, StoreStats};
#[cfg(feature = "std")]
pub use time::SystemClock;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}

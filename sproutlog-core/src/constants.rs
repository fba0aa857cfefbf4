//! Constants for SproutLog Core
//!
//! Centralized numeric constants used throughout the retention subsystem.
//! All values are defined here with their purpose, units, and source so
//! that tuning a deployment never means hunting for magic numbers.

// ===== LIVE CHANGE THRESHOLDS =====

/// Minimum temperature change considered significant (°C).
///
/// Smaller deltas are sensor noise on consumer-grade parts (SHT3x class
/// accuracy is ±0.2°C) and must not update the live reading.
///
/// Source: Sensirion SHT3x datasheet
pub const TEMP_CHANGE_THRESHOLD_C: f32 = 0.2;

/// Minimum relative humidity change considered significant (%RH).
///
/// Humidity sensors drift and oscillate far more than temperature
/// sensors; ±2% RH is the typical repeatability band.
///
/// Source: Sensirion SHT3x datasheet
pub const HUMIDITY_CHANGE_THRESHOLD_PCT: f32 = 2.0;

/// Minimum soil moisture change considered significant (% of range).
///
/// Capacitive soil probes bounce with temperature and supply voltage;
/// one percent of full scale filters that out.
pub const SOIL_CHANGE_THRESHOLD_PCT: f32 = 1.0;

// ===== SOIL PROBE =====

/// Full-scale raw reading of the soil moisture ADC.
///
/// 12-bit converter, so 0..=4095. The probe reads HIGH when dry, so the
/// raw range is inverted when mapping to a percentage.
pub const SOIL_ADC_MAX: u16 = 4095;

// ===== AGGREGATION =====

/// Default averaging window (milliseconds).
///
/// One record per minute keeps a full day of data within the line cap of
/// the on-flash log (24h × 60 = 1440 records).
pub const DEFAULT_WINDOW_MS: u32 = 60_000;

/// Cadence firmware is expected to drive the polling loop at (ms).
///
/// Twelve samples per averaging window; fast enough for live display,
/// slow enough that the soil probe's self-heating stays negligible.
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 5_000;

// ===== BOUNDED LOG =====

/// Default location of the sensor log on the flash mount.
pub const LOG_PATH: &str = "/sensor_data.csv";

/// Byte cap for the sensor log (1 MiB).
///
/// Checked before each append; the append that finds the file at or past
/// this size triggers a rotation first. The file may exceed the cap by at
/// most one record between appends.
pub const MAX_FILE_SIZE: u64 = 1_048_576;

/// Record cap for the sensor log.
///
/// Rotation keeps only the newest `MAX_DATA_LINES` records. 1440 is one
/// day of one-minute averages.
pub const MAX_DATA_LINES: usize = 1440;

/// Header line written as the first line of the log file.
pub const CSV_HEADER: &str = "Timestamp,Temperature,Humidity,Soil";

/// Timestamp layout used for log records (UTC wall clock, minute precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Upper bound on a single record line, in bytes.
///
/// A record is `YYYY-MM-DD HH:MM` plus three 2-decimal floats and commas,
/// well under 48 bytes; 64 leaves slack without growing the rotation ring.
/// A line longer than this cannot be a valid record.
pub const RECORD_LINE_MAX: usize = 64;

/// Read-buffer size for streaming the log during rotation (bytes).
pub const READ_CHUNK: usize = 4096;

// ===== DOWNLOAD CONTRACT =====

/// MIME type the serving layer must expose the log file with.
pub const CSV_MIME: &str = "text/csv";

/// Content-Disposition header value for log downloads.
pub const CSV_DISPOSITION: &str = "attachment; filename=\"sensor_data.csv\"";

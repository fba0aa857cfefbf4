//! Bounded Append-Only Sensor Log
//!
//! ## Overview
//!
//! Averaged records persist as one CSV line each in a single file on the
//! flash mount, newest last, behind a header line. The file is capped two
//! ways: total bytes (`MAX_FILE_SIZE`) and record count
//! (`MAX_DATA_LINES`). When an append finds the file at or past the byte
//! cap it rotates first, so the record that tripped the check always
//! lands in the freshly rotated file.
//!
//! ## Rotation
//!
//! Rotation streams the existing records through a fixed-capacity ring
//! sized to the record cap (`ring` module), writes the survivors plus a
//! fresh header to a temporary file, then replaces the original (delete,
//! then rename). From the caller's perspective it is all-or-nothing: any
//! failure before the original is removed leaves it untouched, and the
//! append that wanted the rotation is dropped for that cycle rather than
//! risk the data already on flash.
//!
//! Because the size check happens *before* a write rather than after it,
//! the file can exceed the byte cap by at most one record between
//! appends. That slack is intentional; a strict pre-check would buy
//! nothing but an extra stat on every append.
//!
//! ## Failure behavior
//!
//! A missing mount fails every operation with
//! [`StoreError::Unavailable`]; nothing panics and nothing is retried
//! within a cycle. The caller polls again next cycle.

mod reader;
mod ring;

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::constants::{CSV_HEADER, MAX_DATA_LINES, MAX_FILE_SIZE, TIMESTAMP_FORMAT};
use crate::errors::{StoreError, StoreResult};
use crate::sample::AveragedRecord;

use reader::LineReader;
use ring::LineRing;

/// Fixed-capacity storage for one record line.
pub(crate) type RecordLine = heapless::String<{ crate::constants::RECORD_LINE_MAX }>;

/// Operational counters for the log.
#[derive(Debug, Default, Clone)]
pub struct StoreStats {
    /// Records appended successfully.
    pub appends: usize,
    /// Completed rotations.
    pub rotations: usize,
    /// Rotations aborted with the original left in place.
    pub failed_rotations: usize,
    /// Corrupt (over-long) lines discarded across all rotations.
    pub rotation_lines_dropped: usize,
}

/// Size-bounded, append-only CSV log of averaged sensor records.
pub struct SensorLog {
    path: PathBuf,
    max_bytes: u64,
    max_records: usize,
    stats: StoreStats,
}

impl SensorLog {
    /// Log at `path` with the default capacity limits.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_bytes: MAX_FILE_SIZE,
            max_records: MAX_DATA_LINES,
            stats: StoreStats::default(),
        }
    }

    /// Override the byte and record caps.
    pub fn with_capacity(mut self, max_bytes: u64, max_records: usize) -> Self {
        self.max_bytes = max_bytes;
        self.max_records = max_records;
        self
    }

    /// Location of the log file (what the download endpoint serves).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Operational counters.
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Current file size in bytes; zero when the file does not exist yet.
    pub fn size_bytes(&self) -> StoreResult<u64> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Number of records currently in the file (header excluded).
    pub fn record_count(&self) -> StoreResult<usize> {
        self.ensure_mount()?;

        if !self.path.exists() {
            return Ok(0);
        }

        let mut reader = LineReader::open(&self.path)?.with_skip_lines(1);
        let mut count = 0;
        while reader.next_line()?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    /// Append one averaged record, rotating first if the byte cap is hit.
    pub fn append(&mut self, record: &AveragedRecord) -> StoreResult<()> {
        self.ensure_mount()?;
        let line = format_line(record)?;

        match fs::metadata(&self.path) {
            Ok(meta) if meta.len() >= self.max_bytes => {
                self.rotate()?;
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.write_header()?;
            }
            Err(e) => return Err(e.into()),
        }

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        file.flush()?;

        self.stats.appends += 1;
        Ok(())
    }

    /// Drop everything but the newest `max_records` records.
    ///
    /// Streams the current file through a ring sized to the cap, writes
    /// header plus survivors to a temporary sibling, then deletes the
    /// original and renames the temporary into place. Survivors keep
    /// their original relative order. Calling this on a file already
    /// within the cap rewrites it without changing its records.
    pub fn rotate(&mut self) -> StoreResult<()> {
        self.ensure_mount()?;

        if !self.path.exists() {
            return Ok(());
        }

        let mut survivors = LineRing::with_capacity(self.max_records);
        let mut reader = LineReader::open(&self.path)?.with_skip_lines(1);
        while let Some(line) = reader.next_line()? {
            survivors.push(line);
        }
        let dropped = reader.stats().lines_dropped;

        let tmp_path = self.path.with_extension("tmp");
        if let Err(err) = write_rotated(&tmp_path, &survivors) {
            log::warn!("rotation: temp file write failed: {err}");
            let _ = fs::remove_file(&tmp_path);
            self.stats.failed_rotations += 1;
            return Err(StoreError::RotationFailed {
                reason: "temp file create/write failed",
            });
        }

        if let Err(err) = fs::remove_file(&self.path) {
            log::warn!("rotation: could not remove original: {err}");
            let _ = fs::remove_file(&tmp_path);
            self.stats.failed_rotations += 1;
            return Err(StoreError::RotationFailed {
                reason: "could not remove original",
            });
        }

        if let Err(err) = fs::rename(&tmp_path, &self.path) {
            log::warn!("rotation: could not rename temp into place: {err}");
            self.stats.failed_rotations += 1;
            return Err(StoreError::RotationFailed {
                reason: "could not rename temp file",
            });
        }

        self.stats.rotations += 1;
        self.stats.rotation_lines_dropped += dropped;
        Ok(())
    }

    /// Fail fast when the flash mount is gone.
    fn ensure_mount(&self) -> StoreResult<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("/"));
        if parent.as_os_str().is_empty() || parent.exists() {
            return Ok(());
        }

        log::warn!("sensor log mount missing: {}", parent.display());
        Err(StoreError::Unavailable {
            reason: "mount not present",
        })
    }

    /// Create the file containing only the header line.
    fn write_header(&self) -> StoreResult<()> {
        let mut file = File::create(&self.path)?;
        writeln!(file, "{CSV_HEADER}")?;
        Ok(())
    }
}

/// Render one record as a CSV line.
fn format_line(record: &AveragedRecord) -> StoreResult<String> {
    let datetime = chrono::DateTime::from_timestamp_millis(record.timestamp as i64)
        .ok_or(StoreError::TimeUnavailable)?;

    Ok(format!(
        "{},{:.2},{:.2},{:.2}",
        datetime.format(TIMESTAMP_FORMAT),
        record.temperature,
        record.humidity,
        record.soil,
    ))
}

/// Write header + survivors to the temporary file.
fn write_rotated(tmp_path: &Path, survivors: &LineRing) -> io::Result<()> {
    let mut file = File::create(tmp_path)?;
    writeln!(file, "{CSV_HEADER}")?;
    for line in survivors.iter() {
        writeln!(file, "{line}")?;
    }
    file.flush()
}

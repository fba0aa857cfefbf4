//! Error Types for the Persistence Path
//!
//! The retention subsystem treats every failure as recoverable: a failed
//! operation is skipped for the current poll cycle and retried on a later
//! one. Error values reflect that. They are small, carry inline
//! `&'static str` reasons rather than heap-allocated messages, and map
//! one-to-one onto the ways persistence can degrade:
//!
//! - `Unavailable`: the flash mount is missing; nothing can be read or
//!   written until it comes back.
//! - `RotationFailed`: the temporary file could not be created or written;
//!   the original log is left untouched and the pending append is dropped.
//! - `TimeUnavailable`: the wall clock has not synced yet; a record without
//!   a real timestamp is worthless, so it is refused rather than back-dated.
//! - `Io`: an underlying filesystem error on an otherwise-present mount.
//!
//! None of these abort the polling loop. The live reporting path never
//! touches storage and keeps running through all of them.

use thiserror_no_std::Error;

/// Result type for log persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Ways the persistence path can fail for one poll cycle.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Flash mount not present; all log operations refused.
    #[error("storage unavailable: {reason}")]
    Unavailable {
        /// What was found missing.
        reason: &'static str,
    },

    /// Rotation aborted before the original file was replaced.
    #[error("rotation aborted: {reason}")]
    RotationFailed {
        /// Which rotation step failed.
        reason: &'static str,
    },

    /// Wall clock not synced; record dropped instead of back-dated.
    #[error("wall clock not synced; record dropped")]
    TimeUnavailable,

    /// Filesystem error from the underlying mount.
    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether retrying on the next poll cycle can possibly succeed.
    ///
    /// Everything here is retryable; the method exists so callers can
    /// make that explicit instead of matching exhaustively.
    pub fn is_transient(&self) -> bool {
        true
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StoreError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Unavailable { reason } => defmt::write!(fmt, "storage unavailable: {}", reason),
            Self::RotationFailed { reason } => defmt::write!(fmt, "rotation aborted: {}", reason),
            Self::TimeUnavailable => defmt::write!(fmt, "wall clock not synced"),
            #[cfg(feature = "std")]
            Self::Io(_) => defmt::write!(fmt, "I/O error"),
        }
    }
}

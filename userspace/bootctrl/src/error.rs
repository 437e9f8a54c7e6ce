// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Error taxonomy for boot-control operations
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable (v1.0)
//! TEST_COVERAGE: Unit tests (errno mapping)

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::record::{DecodeError, RangeError};
use crate::validate::ValidationError;

/// POSIX errno values surfaced at the module boundary.
pub mod errno {
    pub const EIO: i32 = 5;
    pub const EINVAL: i32 = 22;
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors produced by boot-control operations.
///
/// Everything except [`Error::InvalidSlot`], [`Error::FieldOutOfRange`] and
/// [`Error::Config`] is a storage failure; callers should treat those alike
/// and use the variant only for diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    /// Slot index outside `{0, 1}`; raised before any I/O.
    #[error("invalid slot index {0}")]
    InvalidSlot(u32),
    /// Slot field value does not fit its encoded width.
    #[error(transparent)]
    FieldOutOfRange(#[from] RangeError),
    /// Backing device could not be opened.
    #[error("failed to open metadata device: {0}")]
    DeviceOpen(#[source] io::Error),
    /// Seek to the record offset failed.
    #[error("failed to seek to offset {offset}: {source}")]
    Seek {
        offset: u64,
        #[source]
        source: io::Error,
    },
    #[error("failed to read boot record: {0}")]
    Read(#[source] io::Error),
    #[error("failed to write boot record: {0}")]
    Write(#[source] io::Error),
    #[error("short read: {actual} of {expected} bytes")]
    ShortRead { expected: usize, actual: usize },
    #[error("short write: {actual} of {expected} bytes")]
    ShortWrite { expected: usize, actual: usize },
    /// Buffer too small to hold a record.
    #[error("malformed record: {0}")]
    Malformed(#[from] DecodeError),
    /// Record failed magic, version or checksum validation.
    #[error("invalid record: {0}")]
    Invalid(#[from] ValidationError),
    /// Configuration file could not be read or parsed.
    #[error("config error in {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl Error {
    /// True for failures that belong to the collapsed "load/write failed" class.
    pub fn is_storage(&self) -> bool {
        !matches!(self, Error::InvalidSlot(_) | Error::FieldOutOfRange(_) | Error::Config { .. })
    }

    /// Positive errno for the module boundary.
    pub fn errno(&self) -> i32 {
        match self {
            Error::InvalidSlot(_) | Error::FieldOutOfRange(_) => errno::EINVAL,
            Error::DeviceOpen(source)
            | Error::Seek { source, .. }
            | Error::Read(source)
            | Error::Write(source) => source.raw_os_error().unwrap_or(errno::EIO),
            _ => errno::EIO,
        }
    }
}

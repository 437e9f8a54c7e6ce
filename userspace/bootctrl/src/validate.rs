// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Record integrity checks (magic, then version, then checksum)
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable (v1.0)
//! TEST_COVERAGE: Unit tests + proptest bit-flip sensitivity

use log::error;
use thiserror::Error;

use crate::record::{Record, BOOTCTRL_MAGIC, BOOTCTRL_VERSION};

/// First integrity check a record failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("wrong magic number: found {found:#x} instead of {expected:#x}")]
    InvalidMagic { found: u32, expected: u32 },
    #[error("unsupported record version {found} (expected {expected})")]
    UnsupportedVersion { found: u8, expected: u8 },
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
}

/// Checks magic, version and checksum in that order, stopping at the first failure.
pub fn validate(record: &Record) -> Result<(), ValidationError> {
    if record.magic != BOOTCTRL_MAGIC {
        let err = ValidationError::InvalidMagic { found: record.magic, expected: BOOTCTRL_MAGIC };
        error!("bootctrl: {err}");
        return Err(err);
    }
    if record.version != BOOTCTRL_VERSION {
        let err =
            ValidationError::UnsupportedVersion { found: record.version, expected: BOOTCTRL_VERSION };
        error!("bootctrl: {err}");
        return Err(err);
    }
    let computed = record.computed_checksum();
    if record.crc32 != computed {
        let err = ValidationError::ChecksumMismatch { stored: record.crc32, computed };
        error!("bootctrl: {err}");
        return Err(err);
    }
    Ok(())
}

// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Boot-control record codec (frozen on-disk layout shared with the bootloader)
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable (v1.0)
//! TEST_COVERAGE: Unit tests + proptest round-trip
//!
//! Layout (12 bytes, little-endian, no padding):
//!
//! ```text
//! 0..4   magic                     0x0053_5400
//! 4      version                   1
//! 5      slot_info[0]              prio:4 | tries:3 | success:1 (LSB first)
//! 6      slot_info[1]
//! 7      recovery_tries_remaining
//! 8..12  crc32                     zlib CRC-32 of bytes 0..8
//! ```

use thiserror::Error;

/// Record magic: the bytes `{'\0', 'S', 'T', '\0'}` read big-endian.
pub const BOOTCTRL_MAGIC: u32 = 0x0053_5400;

/// The only record version this implementation understands.
pub const BOOTCTRL_VERSION: u8 = 1;

/// Number of boot slots; the format is hard-wired for A/B.
pub const NUM_SLOTS: usize = 2;

/// Encoded record size in bytes.
pub const RECORD_SIZE: usize = 12;

/// Bytes covered by the checksum (everything before the trailing crc32).
pub const CRC_COVERED_LEN: usize = RECORD_SIZE - 4;

/// Highest slot priority; 0 means permanently unbootable.
pub const MAX_PRIORITY: u8 = 15;

/// Largest encodable retry budget.
pub const MAX_TRIES: u8 = 7;

/// Recovery retry budget written by freshly generated records.
pub const DEFAULT_RECOVERY_TRIES: u8 = 7;

const PRIORITY_MASK: u8 = 0x0F;
const TRIES_SHIFT: u8 = 4;
const TRIES_MASK: u8 = 0x07;
const SUCCESS_BIT: u8 = 1 << 7;

/// Buffer could not be interpreted as a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("record too short: {actual} bytes (need {expected})")]
    TooShort { expected: usize, actual: usize },
}

/// A slot field value does not fit its encoded width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{field} out of range: {value} (max {max})")]
pub struct RangeError {
    pub field: &'static str,
    pub value: u8,
    pub max: u8,
}

/// Per-slot boot state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotMetadata {
    pub(crate) priority: u8,
    pub(crate) tries_remaining: u8,
    pub(crate) successful_boot: bool,
}

impl SlotMetadata {
    /// Builds a slot entry, rejecting values that do not fit the packed fields.
    pub fn new(priority: u8, tries_remaining: u8, successful_boot: bool) -> Result<Self, RangeError> {
        if priority > MAX_PRIORITY {
            return Err(RangeError { field: "priority", value: priority, max: MAX_PRIORITY });
        }
        if tries_remaining > MAX_TRIES {
            return Err(RangeError { field: "tries_remaining", value: tries_remaining, max: MAX_TRIES });
        }
        Ok(Self { priority, tries_remaining, successful_boot })
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn tries_remaining(&self) -> u8 {
        self.tries_remaining
    }

    pub fn successful_boot(&self) -> bool {
        self.successful_boot
    }

    fn pack(&self) -> u8 {
        let mut byte = self.priority & PRIORITY_MASK;
        byte |= (self.tries_remaining & TRIES_MASK) << TRIES_SHIFT;
        if self.successful_boot {
            byte |= SUCCESS_BIT;
        }
        byte
    }

    fn unpack(byte: u8) -> Self {
        Self {
            priority: byte & PRIORITY_MASK,
            tries_remaining: (byte >> TRIES_SHIFT) & TRIES_MASK,
            successful_boot: byte & SUCCESS_BIT != 0,
        }
    }
}

/// In-memory view of the persisted boot-control record.
///
/// Decoding never checks magic, version or checksum; run
/// [`crate::validate::validate`] before trusting any slot field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub magic: u32,
    pub version: u8,
    pub slot_info: [SlotMetadata; NUM_SLOTS],
    pub recovery_tries_remaining: u8,
    pub crc32: u32,
}

impl Record {
    /// Builds a fresh, sealed record for the given slots.
    pub fn new(slot_info: [SlotMetadata; NUM_SLOTS], recovery_tries_remaining: u8) -> Self {
        let mut record = Self {
            magic: BOOTCTRL_MAGIC,
            version: BOOTCTRL_VERSION,
            slot_info,
            recovery_tries_remaining,
            crc32: 0,
        };
        record.seal();
        record
    }

    /// Parses the first [`RECORD_SIZE`] bytes of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < RECORD_SIZE {
            return Err(DecodeError::TooShort { expected: RECORD_SIZE, actual: bytes.len() });
        }
        Ok(Self {
            magic: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            version: bytes[4],
            slot_info: [SlotMetadata::unpack(bytes[5]), SlotMetadata::unpack(bytes[6])],
            recovery_tries_remaining: bytes[7],
            crc32: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }

    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4] = self.version;
        out[5] = self.slot_info[0].pack();
        out[6] = self.slot_info[1].pack();
        out[7] = self.recovery_tries_remaining;
        out[8..12].copy_from_slice(&self.crc32.to_le_bytes());
        out
    }

    /// Checksum recomputed over the current field values.
    pub fn computed_checksum(&self) -> u32 {
        checksum(&self.encode()[..CRC_COVERED_LEN])
    }

    /// Stores the recomputed checksum in the trailing field.
    pub fn seal(&mut self) {
        self.crc32 = self.computed_checksum();
    }
}

/// zlib CRC-32 (`crc32(0, data, len)`).
pub fn checksum(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Persistent A/B boot control (misc-partition record shared with the bootloader)
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable (v1.0)
//! TEST_COVERAGE: Unit tests per module + integration tests (via tests/bootctrl_host)
//!   - record codec round-trip and frozen layout
//!   - magic -> version -> checksum validation order
//!   - EINTR retry, short read/write detection
//!   - slot state machine transitions and bootability rules
//!
//! PUBLIC API:
//!   - Record / SlotMetadata: fixed 12-byte record codec
//!   - validate(): integrity verdict
//!   - MetadataStore: offset-seeked read/write against a MiscDevice
//!   - BootControl: slot state machine
//!   - BootControlModule / BootControlHal: loader-facing operation set
//!   - Config: TOML configuration
//!
//! DEPENDENCIES:
//!   - crc32fast: zlib CRC-32 over the record
//!   - thiserror: error types
//!   - log: diagnostics
//!   - serde/toml: configuration
//!   - parking_lot: shared in-memory device image
//!
//! Access to one device must be serialized by the caller; the bootloader
//! shares the record and cannot take part in any locking.

#![forbid(unsafe_code)]

pub mod config;
pub mod control;
pub mod device;
pub mod error;
pub mod module;
pub mod record;
pub mod slot;
pub mod store;
pub mod validate;

pub use config::Config;
pub use control::BootControl;
pub use device::{Access, FileDevice, MemDevice, MiscDevice};
pub use error::{Error, Result};
pub use module::{BootControlHal, BootControlModule, StatusCode};
pub use record::{checksum, DecodeError, Record, SlotMetadata, RECORD_SIZE};
pub use slot::{current_slot, CmdlineSuffix, CurrentSlot, FixedSuffix, Slot, SuffixSource, SuffixWarning};
pub use store::{MetadataStore, BOOTCTRL_OFFSET};
pub use validate::{validate, ValidationError};

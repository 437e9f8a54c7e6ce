// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Offset-seeked read/write of the boot-control record
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable (v1.0)
//! TEST_COVERAGE: Unit tests (MemDevice + tempfile)
//!
//! Every call is one open, seek, single read or write, close sequence.
//! `Interrupted` is retried without bound; any other error aborts. No
//! flush is issued: durability past the handle is the device owner's job.

use std::io::{self, Read, Seek, SeekFrom, Write};

use log::{debug, error};

use crate::device::{Access, MiscDevice};
use crate::error::{Error, Result};
use crate::record::{Record, RECORD_SIZE};
use crate::validate::validate;

/// Byte offset of the record inside the misc partition: the `slot_suffix`
/// field of the A/B bootloader message, right after the 2 KiB legacy message.
pub const BOOTCTRL_OFFSET: u64 = 2048;

/// One boot-control record at a fixed offset inside a device.
#[derive(Debug, Clone)]
pub struct MetadataStore<D> {
    device: D,
    offset: u64,
}

impl<D: MiscDevice> MetadataStore<D> {
    pub fn new(device: D, offset: u64) -> Self {
        Self { device, offset }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads and validates the record. A record that fails validation is an error.
    pub fn read(&self) -> Result<Record> {
        let mut handle = self.open(Access::ReadOnly)?;
        self.seek(&mut handle)?;

        let mut buf = [0u8; RECORD_SIZE];
        let read = retry_interrupted(|| handle.read(&mut buf)).map_err(Error::Read)?;
        drop(handle);
        if read != RECORD_SIZE {
            error!("bootctrl: short read {read}/{RECORD_SIZE} at offset {}", self.offset);
            return Err(Error::ShortRead { expected: RECORD_SIZE, actual: read });
        }

        let record = Record::decode(&buf)?;
        debug!(
            "bootctrl: read magic={:#x} version={} crc={:#010x} recovery_tries={}",
            record.magic, record.version, record.crc32, record.recovery_tries_remaining
        );
        for (idx, slot) in record.slot_info.iter().enumerate() {
            debug!(
                "bootctrl: read slot {idx}: priority={} tries_remaining={} successful_boot={}",
                slot.priority(),
                slot.tries_remaining(),
                slot.successful_boot()
            );
        }
        validate(&record)?;
        Ok(record)
    }

    /// Seals `record` with a fresh checksum and writes it back.
    pub fn write(&self, record: &Record) -> Result<()> {
        let mut sealed = *record;
        sealed.seal();
        let bytes = sealed.encode();

        let mut handle = self.open(Access::ReadWrite)?;
        self.seek(&mut handle)?;
        let written = retry_interrupted(|| handle.write(&bytes)).map_err(Error::Write)?;
        drop(handle);
        if written != RECORD_SIZE {
            error!("bootctrl: short write {written}/{RECORD_SIZE} at offset {}", self.offset);
            return Err(Error::ShortWrite { expected: RECORD_SIZE, actual: written });
        }
        debug!("bootctrl: wrote record crc={:#010x}", sealed.crc32);
        Ok(())
    }

    fn open(&self, access: Access) -> Result<D::Handle> {
        self.device.open(access).map_err(|err| {
            error!("bootctrl: error opening metadata device: {err}");
            Error::DeviceOpen(err)
        })
    }

    fn seek(&self, handle: &mut D::Handle) -> Result<()> {
        match handle.seek(SeekFrom::Start(self.offset)) {
            Ok(pos) if pos == self.offset => Ok(()),
            Ok(pos) => {
                error!("bootctrl: seek to {} failed: landed at {pos}", self.offset);
                Err(Error::Seek {
                    offset: self.offset,
                    source: io::Error::new(io::ErrorKind::Other, format!("landed at {pos}")),
                })
            }
            Err(source) => {
                error!("bootctrl: seek to {} failed: {source}", self.offset);
                Err(Error::Seek { offset: self.offset, source })
            }
        }
    }
}

fn retry_interrupted<T>(mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    loop {
        match op() {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

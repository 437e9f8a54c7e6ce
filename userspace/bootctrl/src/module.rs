// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Boot-control module boundary consumed by the platform loader
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable (v1.0)
//! TEST_COVERAGE: Unit tests (slot bounds, status codes)
//!
//! Loaders that speak the signed-integer convention (0 = success,
//! negative errno on failure, 0/1 for predicates) wrap results with
//! [`StatusCode`].

use log::info;

use crate::config::Config;
use crate::control::BootControl;
use crate::device::{FileDevice, MiscDevice};
use crate::error::Result;
use crate::slot::{current_slot, suffix_for, CmdlineSuffix, Slot, SuffixSource};
use crate::store::MetadataStore;

/// Operation set exposed to the platform. Slot indices are validated before any I/O.
pub trait BootControlModule {
    fn init(&mut self) {}

    fn number_slots(&self) -> u32;

    /// Index of the running slot; never fails, falls back to 0.
    fn current_slot(&self) -> u32;

    /// Marks the running slot as successfully booted.
    fn mark_boot_successful(&self) -> Result<()>;

    fn set_active_boot_slot(&self, slot: u32) -> Result<()>;

    fn set_slot_as_unbootable(&self, slot: u32) -> Result<()>;

    fn is_slot_bootable(&self, slot: u32) -> Result<bool>;

    fn is_slot_marked_successful(&self, slot: u32) -> Result<bool>;

    fn suffix(&self, slot: u32) -> Option<&'static str>;
}

/// Signed status integer for the loader call convention.
pub trait StatusCode {
    fn status_code(self) -> i32;
}

impl StatusCode for Result<()> {
    fn status_code(self) -> i32 {
        match self {
            Ok(()) => 0,
            Err(err) => -err.errno(),
        }
    }
}

impl StatusCode for Result<bool> {
    fn status_code(self) -> i32 {
        match self {
            Ok(flag) => i32::from(flag),
            Err(err) => -err.errno(),
        }
    }
}

/// [`BootControlModule`] over a persistent store and a running-slot source.
#[derive(Debug, Clone)]
pub struct BootControlHal<D, S> {
    control: BootControl<D>,
    suffix_source: S,
}

impl BootControlHal<FileDevice, CmdlineSuffix> {
    pub fn from_config(config: &Config) -> Self {
        let store = MetadataStore::new(FileDevice::new(&config.device), config.offset);
        Self::new(BootControl::new(store), CmdlineSuffix::new(&config.cmdline))
    }
}

impl<D: MiscDevice, S: SuffixSource> BootControlHal<D, S> {
    pub fn new(control: BootControl<D>, suffix_source: S) -> Self {
        Self { control, suffix_source }
    }

    pub fn control(&self) -> &BootControl<D> {
        &self.control
    }

    fn running_slot(&self) -> Slot {
        current_slot(self.suffix_source.slot_suffix().as_deref()).slot
    }
}

impl<D: MiscDevice, S: SuffixSource> BootControlModule for BootControlHal<D, S> {
    fn init(&mut self) {
        info!("bootctrl: record at offset {}", self.control.store().offset());
    }

    fn number_slots(&self) -> u32 {
        self.control.number_slots() as u32
    }

    fn current_slot(&self) -> u32 {
        self.running_slot().index() as u32
    }

    fn mark_boot_successful(&self) -> Result<()> {
        self.control.mark_boot_successful(self.running_slot())
    }

    fn set_active_boot_slot(&self, slot: u32) -> Result<()> {
        self.control.set_active_boot_slot(Slot::from_index(slot)?)
    }

    fn set_slot_as_unbootable(&self, slot: u32) -> Result<()> {
        self.control.set_slot_as_unbootable(Slot::from_index(slot)?)
    }

    fn is_slot_bootable(&self, slot: u32) -> Result<bool> {
        self.control.is_slot_bootable(Slot::from_index(slot)?)
    }

    fn is_slot_marked_successful(&self, slot: u32) -> Result<bool> {
        self.control.is_slot_marked_successful(Slot::from_index(slot)?)
    }

    fn suffix(&self, slot: u32) -> Option<&'static str> {
        suffix_for(slot)
    }
}

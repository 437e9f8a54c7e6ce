// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Persistent A/B slot state machine
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable (v1.0)
//! TEST_COVERAGE: Unit tests (MemDevice)
//!   - activation demotes the other top-priority slot
//!   - success outranks exhausted priority/tries for bootability
//!   - corrupt record fails every operation, nothing is rewritten
//!
//! Each operation is an independent read-modify-write; mutations are
//! applied to the in-memory record and written back in one piece.

use log::warn;

use crate::device::MiscDevice;
use crate::error::Result;
use crate::record::{Record, SlotMetadata, MAX_PRIORITY, MAX_TRIES, NUM_SLOTS};
use crate::slot::Slot;
use crate::store::MetadataStore;

/// Priority given to the previously active slot when another slot is activated.
pub const DEMOTED_PRIORITY: u8 = MAX_PRIORITY - 1;

#[derive(Debug, Clone)]
pub struct BootControl<D> {
    store: MetadataStore<D>,
}

impl<D: MiscDevice> BootControl<D> {
    pub fn new(store: MetadataStore<D>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MetadataStore<D> {
        &self.store
    }

    pub fn number_slots(&self) -> usize {
        NUM_SLOTS
    }

    /// Validated snapshot of the persisted record.
    pub fn record(&self) -> Result<Record> {
        self.load()
    }

    /// Confirms `slot` as good: stops the retry countdown and sets the success flag.
    pub fn mark_boot_successful(&self, slot: Slot) -> Result<()> {
        self.update(|record| {
            let info = &mut record.slot_info[slot.index()];
            info.tries_remaining = 0;
            info.successful_boot = true;
        })
    }

    /// Makes `slot` the preferred, not yet confirmed, boot target.
    pub fn set_active_boot_slot(&self, slot: Slot) -> Result<()> {
        self.update(|record| {
            let other = &mut record.slot_info[slot.other().index()];
            if other.priority == MAX_PRIORITY {
                other.priority = DEMOTED_PRIORITY;
            }
            record.slot_info[slot.index()] = SlotMetadata {
                priority: MAX_PRIORITY,
                tries_remaining: MAX_TRIES,
                successful_boot: false,
            };
        })
    }

    pub fn set_slot_as_unbootable(&self, slot: Slot) -> Result<()> {
        self.update(|record| record.slot_info[slot.index()] = SlotMetadata::default())
    }

    /// A slot is unbootable only with zero priority, zero tries and no recorded success.
    pub fn is_slot_bootable(&self, slot: Slot) -> Result<bool> {
        let info = self.load()?.slot_info[slot.index()];
        Ok(info.priority != 0 || info.tries_remaining != 0 || info.successful_boot)
    }

    pub fn is_slot_marked_successful(&self, slot: Slot) -> Result<bool> {
        Ok(self.load()?.slot_info[slot.index()].successful_boot)
    }

    fn load(&self) -> Result<Record> {
        self.store.read().map_err(|err| {
            warn!("bootctrl: error loading boot information: {err}");
            err
        })
    }

    fn update(&self, mutate: impl FnOnce(&mut Record)) -> Result<()> {
        let mut record = self.load()?;
        mutate(&mut record);
        self.store.write(&record).map_err(|err| {
            warn!("bootctrl: error writing boot information: {err}");
            err
        })
    }
}

// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Integration tests for persistent A/B boot control on file-backed misc images
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: 9 tests
//!
//! TEST_SCOPE:
//!   - Generator-style image -> mark successful -> read back
//!   - Activation priority demotion
//!   - Bootability edge cases
//!   - Slot bounds checked before I/O
//!   - Validation order (magic, version, checksum)
//!   - Corrupt record never repaired
//!   - Loader-facing module built from TOML config
//!
//! TEST_SCENARIOS:
//!   - test_end_to_end_mark_successful(): fresh image, suffix _a, mark slot 0
//!   - test_activate_demotes_other_slot(): slot 0 at 15 drops to 14
//!   - test_success_overrides_exhausted_slot(): prio 0, tries 0, success -> bootable
//!   - test_exhausted_slot_unbootable(): prio 0, tries 0, no success -> not bootable
//!   - test_out_of_range_slot_rejected_without_io(): missing device still yields InvalidSlot
//!   - test_magic_checked_before_version_and_checksum(): ordered verdicts
//!   - test_corrupt_record_fails_every_operation(): bytes on disk unchanged
//!   - test_update_flow_switch_and_confirm(): activate B, boot B, confirm
//!   - test_module_from_config(): device/offset/cmdline from TOML

use std::fs;
use std::path::{Path, PathBuf};

use bootctrl::{
    current_slot, validate, BootControl, BootControlHal, BootControlModule, Config, Error,
    FileDevice, FixedSuffix, MetadataStore, Record, Slot, SlotMetadata, StatusCode,
    ValidationError, BOOTCTRL_OFFSET, RECORD_SIZE,
};
use tempfile::TempDir;

const IMAGE_LEN: u64 = 64 * 1024;

struct Fixture {
    _dir: TempDir,
    path: PathBuf,
}

impl Fixture {
    fn new(a: (u8, u8, bool), b: (u8, u8, bool)) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("misc.img");
        let file = fs::File::create(&path).expect("create image");
        file.set_len(IMAGE_LEN).expect("size image");
        drop(file);

        let a = SlotMetadata::new(a.0, a.1, a.2).expect("slot a");
        let b = SlotMetadata::new(b.0, b.1, b.2).expect("slot b");
        store_at(&path).write(&Record::new([a, b], 7)).expect("seed record");
        Self { _dir: dir, path }
    }

    fn control(&self) -> BootControl<FileDevice> {
        BootControl::new(store_at(&self.path))
    }

    fn module(&self, suffix: &str) -> BootControlHal<FileDevice, FixedSuffix> {
        BootControlHal::new(self.control(), FixedSuffix::new(suffix))
    }

    fn record_bytes(&self) -> Vec<u8> {
        let image = fs::read(&self.path).expect("read image");
        let at = BOOTCTRL_OFFSET as usize;
        image[at..at + RECORD_SIZE].to_vec()
    }

    fn poke(&self, offset_in_record: usize, f: impl FnOnce(&mut u8)) {
        let mut image = fs::read(&self.path).expect("read image");
        f(&mut image[BOOTCTRL_OFFSET as usize + offset_in_record]);
        fs::write(&self.path, image).expect("write image");
    }
}

fn store_at(path: &Path) -> MetadataStore<FileDevice> {
    MetadataStore::new(FileDevice::new(path), BOOTCTRL_OFFSET)
}

fn slot(priority: u8, tries: u8, success: bool) -> SlotMetadata {
    SlotMetadata::new(priority, tries, success).expect("in range")
}

#[test]
fn test_end_to_end_mark_successful() {
    let fixture = Fixture::new((15, 7, false), (0, 0, false));
    let module = fixture.module("_a");

    assert_eq!(current_slot(Some("_a")).slot, Slot::A);
    assert_eq!(module.current_slot(), 0);
    module.mark_boot_successful().expect("mark");

    let record = store_at(&fixture.path).read().expect("read back");
    assert_eq!(record.slot_info[0], slot(15, 0, true));
    assert_eq!(record.slot_info[1], slot(0, 0, false));
    assert_eq!(record.crc32, record.computed_checksum());
    assert_eq!(validate(&record), Ok(()));
    assert_eq!(fs::metadata(&fixture.path).expect("meta").len(), IMAGE_LEN);
}

#[test]
fn test_activate_demotes_other_slot() {
    let fixture = Fixture::new((15, 0, true), (0, 0, false));
    let ctrl = fixture.control();
    ctrl.set_active_boot_slot(Slot::B).expect("activate");

    let record = ctrl.record().expect("record");
    assert_eq!(record.slot_info[0].priority(), 14);
    assert_eq!(record.slot_info[1], slot(15, 7, false));
}

#[test]
fn test_success_overrides_exhausted_slot() {
    let fixture = Fixture::new((15, 7, false), (0, 0, true));
    let module = fixture.module("_a");
    assert!(module.is_slot_bootable(1).expect("query"));
    assert!(module.is_slot_marked_successful(1).expect("query"));
}

#[test]
fn test_exhausted_slot_unbootable() {
    let fixture = Fixture::new((15, 7, false), (0, 0, false));
    let module = fixture.module("_a");
    assert!(!module.is_slot_bootable(1).expect("query"));
    assert_eq!(module.is_slot_bootable(1).status_code(), 0);
    assert_eq!(module.is_slot_bootable(0).status_code(), 1);
}

#[test]
fn test_out_of_range_slot_rejected_without_io() {
    let fixture = Fixture::new((15, 7, false), (0, 0, false));
    let module = fixture.module("_a");
    fs::remove_file(&fixture.path).expect("remove image");

    // With the device gone, any attempted I/O would surface as DeviceOpen.
    assert!(matches!(module.set_active_boot_slot(2), Err(Error::InvalidSlot(2))));
    assert!(matches!(module.set_slot_as_unbootable(2), Err(Error::InvalidSlot(2))));
    assert!(matches!(module.is_slot_bootable(2), Err(Error::InvalidSlot(2))));
    assert!(matches!(module.is_slot_marked_successful(7), Err(Error::InvalidSlot(7))));
    assert_eq!(module.suffix(2), None);
    assert!(matches!(Slot::from_index(2), Err(Error::InvalidSlot(2))));

    assert!(matches!(module.is_slot_bootable(0), Err(Error::DeviceOpen(_))));
    assert!(matches!(module.mark_boot_successful(), Err(Error::DeviceOpen(_))));
}

#[test]
fn test_magic_checked_before_version_and_checksum() {
    let fixture = Fixture::new((15, 7, false), (0, 0, false));
    let store = store_at(&fixture.path);

    // Wrong version, checksum resealed: version is the verdict.
    let mut record = store.read().expect("read");
    record.version = 9;
    record.seal();
    fs::write(&fixture.path, image_with(&fixture.path, &record)).expect("write");
    assert!(matches!(
        store.read(),
        Err(Error::Invalid(ValidationError::UnsupportedVersion { found: 9, .. }))
    ));

    // Break magic as well (checksum now stale too): magic is the verdict.
    fixture.poke(1, |b| *b = b'X');
    assert!(matches!(store.read(), Err(Error::Invalid(ValidationError::InvalidMagic { .. }))));
}

fn image_with(path: &Path, record: &Record) -> Vec<u8> {
    let mut image = fs::read(path).expect("read image");
    let at = BOOTCTRL_OFFSET as usize;
    image[at..at + RECORD_SIZE].copy_from_slice(&record.encode());
    image
}

#[test]
fn test_corrupt_record_fails_every_operation() {
    let fixture = Fixture::new((15, 7, false), (14, 0, true));
    fixture.poke(5, |b| *b ^= 0x10);
    let before = fixture.record_bytes();
    let module = fixture.module("_b");

    for result in [
        module.mark_boot_successful(),
        module.set_active_boot_slot(0),
        module.set_slot_as_unbootable(1),
    ] {
        let err = result.expect_err("corrupt");
        assert!(err.is_storage());
        assert!(matches!(err, Error::Invalid(ValidationError::ChecksumMismatch { .. })));
    }
    assert!(module.is_slot_bootable(0).is_err());
    assert!(module.is_slot_marked_successful(1).is_err());
    assert_eq!(fixture.record_bytes(), before);
}

#[test]
fn test_update_flow_switch_and_confirm() {
    let fixture = Fixture::new((15, 0, true), (0, 0, false));

    // Running on A: install to B and switch.
    let on_a = fixture.module("_a");
    on_a.set_active_boot_slot(1).expect("activate b");
    assert!(on_a.is_slot_bootable(1).expect("b bootable"));
    assert!(!on_a.is_slot_marked_successful(1).expect("b unconfirmed"));

    // Rebooted into B: confirm it.
    let on_b = fixture.module("_b");
    assert_eq!(on_b.current_slot(), 1);
    on_b.mark_boot_successful().expect("confirm b");

    let record = fixture.control().record().expect("record");
    assert_eq!(record.slot_info[0], slot(14, 0, true));
    assert_eq!(record.slot_info[1], slot(15, 0, true));

    // Switching back demotes B and re-arms A.
    on_b.set_active_boot_slot(0).expect("activate a");
    let record = fixture.control().record().expect("record");
    assert_eq!(record.slot_info[0], slot(15, 7, false));
    assert_eq!(record.slot_info[1], slot(14, 0, true));
    assert_eq!(record.recovery_tries_remaining, 7);
}

#[test]
fn test_module_from_config() {
    let fixture = Fixture::new((15, 7, false), (0, 0, false));
    let dir = tempfile::tempdir().expect("tempdir");
    let cmdline = dir.path().join("cmdline");
    fs::write(&cmdline, "console=ttyS0 androidboot.slot_suffix=_b\n").expect("cmdline");
    let cfg_path = dir.path().join("bootctrl.toml");
    fs::write(
        &cfg_path,
        format!(
            "device = {:?}\noffset = {}\ncmdline = {:?}\n",
            fixture.path.display().to_string(),
            BOOTCTRL_OFFSET,
            cmdline.display().to_string()
        ),
    )
    .expect("config");

    let config = Config::load(&cfg_path).expect("load config");
    let mut module = BootControlHal::from_config(&config);
    module.init();
    assert_eq!(module.number_slots(), 2);
    assert_eq!(module.current_slot(), 1);
    assert_eq!(module.suffix(module.current_slot()), Some("_b"));
    assert_eq!(module.mark_boot_successful().status_code(), 0);
    assert!(module.is_slot_marked_successful(1).expect("b"));
}

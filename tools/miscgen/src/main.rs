// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Offline generator for misc images carrying a boot-control record
//! OWNERS: @tools-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests (argument bounds, image layout)
//!
//! PUBLIC API:
//!   - CLI: miscgen <aPrio> <aTry> <aSuccess> <bPrio> <bTry> <bSuccess> [file] [--offset <bytes>]
//!
//! DEPENDENCIES:
//!   - bootctrl: record codec and store
//!   - clap: argument parsing and bounds checks

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use bootctrl::record::{DEFAULT_RECOVERY_TRIES, MAX_PRIORITY, MAX_TRIES};
use bootctrl::{FileDevice, MetadataStore, Record, SlotMetadata, BOOTCTRL_OFFSET};
use clap::Parser;
use log::info;

const DEFAULT_OUTPUT: &str = "misc.img";

#[derive(Debug, Parser)]
#[command(
    name = "miscgen",
    about = "Writes an initial A/B boot-control record into a misc image",
    override_usage = "miscgen <aPrio> <aTry> <aSuccess> <bPrio> <bTry> <bSuccess> [file] [--offset <bytes>]"
)]
struct Args {
    /// Slot A priority (0..=15)
    #[arg(value_name = "aPrio", value_parser = clap::value_parser!(u8).range(..=MAX_PRIORITY as i64))]
    a_prio: u8,
    /// Slot A tries remaining (0..=7)
    #[arg(value_name = "aTry", value_parser = clap::value_parser!(u8).range(..=MAX_TRIES as i64))]
    a_try: u8,
    /// Slot A successful boot (0 or 1)
    #[arg(value_name = "aSuccess", value_parser = clap::value_parser!(u8).range(..=1))]
    a_success: u8,
    /// Slot B priority (0..=15)
    #[arg(value_name = "bPrio", value_parser = clap::value_parser!(u8).range(..=MAX_PRIORITY as i64))]
    b_prio: u8,
    /// Slot B tries remaining (0..=7)
    #[arg(value_name = "bTry", value_parser = clap::value_parser!(u8).range(..=MAX_TRIES as i64))]
    b_try: u8,
    /// Slot B successful boot (0 or 1)
    #[arg(value_name = "bSuccess", value_parser = clap::value_parser!(u8).range(..=1))]
    b_success: u8,
    /// Output image, created or truncated
    #[arg(value_name = "file", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
    /// Byte offset of the record inside the image
    #[arg(long, default_value_t = BOOTCTRL_OFFSET)]
    offset: u64,
}

impl Args {
    fn record(&self) -> Result<Record, bootctrl::Error> {
        let a = SlotMetadata::new(self.a_prio, self.a_try, self.a_success == 1)?;
        let b = SlotMetadata::new(self.b_prio, self.b_try, self.b_success == 1)?;
        Ok(Record::new([a, b], DEFAULT_RECOVERY_TRIES))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let record = args.record()?;

    println!("output file: {}", args.output.display());
    println!("crc: {}", record.crc32);
    for (idx, slot) in record.slot_info.iter().enumerate() {
        println!(
            "slot {idx}: prio {}, try {}, success {}",
            slot.priority(),
            slot.tries_remaining(),
            u8::from(slot.successful_boot())
        );
    }

    write_image(&args.output, args.offset, &record)?;
    info!("miscgen: wrote {} at offset {}", args.output.display(), args.offset);
    Ok(())
}

/// Creates or truncates `path` and writes `record` at `offset`, zero-filling the gap.
fn write_image(path: &Path, offset: u64, record: &Record) -> Result<Record, Box<dyn std::error::Error>> {
    File::create(path)?;
    let store = MetadataStore::new(FileDevice::new(path), offset);
    store.write(record)?;
    OpenOptions::new().write(true).open(path)?.sync_all()?;
    Ok(store.read()?)
}

// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Slot identity, suffixes and running-slot resolution
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable (v1.0)
//! TEST_COVERAGE: Unit tests

use std::fmt;
use std::fs;
use std::path::PathBuf;

use log::warn;

use crate::error::{Error, Result};

pub const SUFFIX_A: &str = "_a";
pub const SUFFIX_B: &str = "_b";

/// Kernel command-line key carrying the running slot suffix.
pub const CMDLINE_SUFFIX_KEY: &str = "androidboot.slot_suffix";

/// Kernel command line read by [`CmdlineSuffix::default`].
pub const DEFAULT_CMDLINE: &str = "/proc/cmdline";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::A, Slot::B];

    /// Maps a raw index to a slot; anything other than 0 or 1 is rejected.
    pub fn from_index(index: u32) -> Result<Self> {
        match index {
            0 => Ok(Slot::A),
            1 => Ok(Slot::B),
            other => Err(Error::InvalidSlot(other)),
        }
    }

    pub fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Slot::A => SUFFIX_A,
            Slot::B => SUFFIX_B,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Suffix for a raw slot index, `None` when out of range. No I/O.
pub fn suffix_for(index: u32) -> Option<&'static str> {
    Slot::from_index(index).ok().map(Slot::suffix)
}

/// Why running-slot resolution fell back to slot A.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuffixWarning {
    Missing,
    Unrecognized(String),
}

/// Outcome of [`current_slot`]; the warning is informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentSlot {
    pub slot: Slot,
    pub warning: Option<SuffixWarning>,
}

/// Resolves the running slot from the boot-environment suffix.
///
/// The first two characters are compared against `_a`/`_b`; an absent or
/// unknown suffix falls back to slot A with a warning.
pub fn current_slot(suffix: Option<&str>) -> CurrentSlot {
    let value = match suffix {
        Some(value) if !value.is_empty() => value,
        _ => {
            warn!("bootctrl: slot suffix is missing, defaulting to {}", Slot::A);
            return CurrentSlot { slot: Slot::A, warning: Some(SuffixWarning::Missing) };
        }
    };
    for slot in Slot::ALL {
        if value.as_bytes().starts_with(slot.suffix().as_bytes()) {
            return CurrentSlot { slot, warning: None };
        }
    }
    warn!("bootctrl: slot suffix {value:?} is invalid, defaulting to {}", Slot::A);
    CurrentSlot { slot: Slot::A, warning: Some(SuffixWarning::Unrecognized(value.to_string())) }
}

/// Supplies the running slot suffix at call time.
pub trait SuffixSource {
    fn slot_suffix(&self) -> Option<String>;
}

/// Suffix fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct FixedSuffix(pub Option<String>);

impl FixedSuffix {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self(Some(suffix.into()))
    }
}

impl SuffixSource for FixedSuffix {
    fn slot_suffix(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Reads `androidboot.slot_suffix=` from a kernel command line file.
#[derive(Debug, Clone)]
pub struct CmdlineSuffix {
    path: PathBuf,
}

impl CmdlineSuffix {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for CmdlineSuffix {
    fn default() -> Self {
        Self::new(DEFAULT_CMDLINE)
    }
}

impl SuffixSource for CmdlineSuffix {
    fn slot_suffix(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(cmdline) => parse_cmdline_suffix(&cmdline),
            Err(err) => {
                warn!("bootctrl: cannot read {}: {err}", self.path.display());
                None
            }
        }
    }
}

/// Extracts the slot suffix from a kernel command line; last occurrence wins.
pub fn parse_cmdline_suffix(cmdline: &str) -> Option<String> {
    cmdline
        .split_ascii_whitespace()
        .filter_map(|arg| arg.split_once('='))
        .filter(|(key, _)| *key == CMDLINE_SUFFIX_KEY)
        .map(|(_, value)| value.to_string())
        .last()
}

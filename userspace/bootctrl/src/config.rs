// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Boot-control configuration (device path, record offset, cmdline source)
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable (v1.0)
//! TEST_COVERAGE: Unit tests
//!
//! Example `bootctrl.toml`:
//!
//! ```toml
//! device = "/dev/block/by-name/misc"
//! offset = 2048
//! cmdline = "/proc/cmdline"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::slot::DEFAULT_CMDLINE;
use crate::store::BOOTCTRL_OFFSET;

/// Misc partition holding the boot-control record.
pub const DEFAULT_DEVICE: &str = "/dev/block/by-name/misc";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Block device or image file holding the record.
    pub device: PathBuf,
    /// Byte offset of the record inside `device`.
    pub offset: u64,
    /// Kernel command line consulted for the running slot suffix.
    pub cmdline: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_DEVICE),
            offset: BOOTCTRL_OFFSET,
            cmdline: PathBuf::from(DEFAULT_CMDLINE),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|err| Error::Config { path: path.to_path_buf(), reason: err.to_string() })?;
        Self::parse(&text, path)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Self::parse(text, Path::new("<inline>"))
    }

    fn parse(text: &str, origin: &Path) -> Result<Self> {
        toml::from_str(text)
            .map_err(|err| Error::Config { path: origin.to_path_buf(), reason: err.to_string() })
    }
}

// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Backing device abstraction for the misc partition
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable (v1.0)
//! TEST_COVERAGE: Unit tests (MemDevice semantics)
//!
//! A device hands out a fresh handle per operation; dropping the handle
//! closes it. Callers must serialize access to one device: there is no
//! locking against other processes or the bootloader.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

/// How a handle is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// Seekable byte store that holds the boot-control record.
pub trait MiscDevice {
    type Handle: Read + Write + Seek;

    fn open(&self, access: Access) -> io::Result<Self::Handle>;
}

/// Block device node or image file on the host filesystem.
#[derive(Debug, Clone)]
pub struct FileDevice {
    path: PathBuf,
}

impl FileDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MiscDevice for FileDevice {
    type Handle = File;

    fn open(&self, access: Access) -> io::Result<File> {
        match access {
            Access::ReadOnly => File::open(&self.path),
            Access::ReadWrite => OpenOptions::new().read(true).write(true).open(&self.path),
        }
    }
}

#[derive(Debug, Default)]
struct MemState {
    data: Vec<u8>,
    pending_interrupts: usize,
    fail_open: bool,
    fail_seek: bool,
    seek_landing: Option<u64>,
    opens: usize,
}

/// Fixed-size in-memory device for tests and fixtures.
///
/// Clones share the same backing image. Writes never grow the image, so a
/// write that crosses the end comes back short.
#[derive(Debug, Clone, Default)]
pub struct MemDevice {
    state: Arc<Mutex<MemState>>,
}

impl MemDevice {
    /// Zero-filled device of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self::from_bytes(vec![0u8; len])
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { state: Arc::new(Mutex::new(MemState { data, ..MemState::default() })) }
    }

    /// Copy of the current image.
    pub fn snapshot(&self) -> Vec<u8> {
        self.state.lock().data.clone()
    }

    /// Direct access to the image (for corruption tests).
    pub fn with_data<R>(&self, f: impl FnOnce(&mut Vec<u8>) -> R) -> R {
        f(&mut self.state.lock().data)
    }

    /// Makes the next `count` read/write calls fail with `Interrupted`.
    pub fn inject_interrupts(&self, count: usize) {
        self.state.lock().pending_interrupts = count;
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.state.lock().fail_open = fail;
    }

    /// Makes every seek fail with an I/O error.
    pub fn set_fail_seek(&self, fail: bool) {
        self.state.lock().fail_seek = fail;
    }

    /// Forces every seek to land at `pos` regardless of the request.
    pub fn set_seek_landing(&self, pos: Option<u64>) {
        self.state.lock().seek_landing = pos;
    }

    /// Number of successful and failed open attempts so far.
    pub fn open_count(&self) -> usize {
        self.state.lock().opens
    }
}

impl MiscDevice for MemDevice {
    type Handle = MemHandle;

    fn open(&self, access: Access) -> io::Result<MemHandle> {
        let mut state = self.state.lock();
        state.opens += 1;
        if state.fail_open {
            return Err(io::Error::new(io::ErrorKind::NotFound, "mem device unavailable"));
        }
        Ok(MemHandle {
            state: Arc::clone(&self.state),
            pos: 0,
            writable: access == Access::ReadWrite,
        })
    }
}

/// Open handle on a [`MemDevice`].
#[derive(Debug)]
pub struct MemHandle {
    state: Arc<Mutex<MemState>>,
    pos: u64,
    writable: bool,
}

fn take_interrupt(state: &mut MemState) -> io::Result<()> {
    if state.pending_interrupts > 0 {
        state.pending_interrupts -= 1;
        return Err(io::Error::from(io::ErrorKind::Interrupted));
    }
    Ok(())
}

impl Read for MemHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        take_interrupt(&mut state)?;
        let len = state.data.len() as u64;
        if self.pos >= len {
            return Ok(0);
        }
        let start = self.pos as usize;
        let n = buf.len().min(state.data.len() - start);
        buf[..n].copy_from_slice(&state.data[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Write for MemHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.writable {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "handle opened read-only"));
        }
        let mut state = self.state.lock();
        take_interrupt(&mut state)?;
        let len = state.data.len() as u64;
        if self.pos >= len {
            return Ok(0);
        }
        let start = self.pos as usize;
        let n = buf.len().min(state.data.len() - start);
        state.data[start..start + n].copy_from_slice(&buf[..n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (len, fail_seek, landing) = {
            let state = self.state.lock();
            (state.data.len() as u64, state.fail_seek, state.seek_landing)
        };
        if fail_seek {
            return Err(io::Error::new(io::ErrorKind::Other, "mem device seek failure"));
        }
        if let Some(forced) = landing {
            self.pos = forced;
            return Ok(forced);
        }
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::End(delta) => len.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.pos.checked_add_signed(delta),
        };
        let target = target
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "seek before start"))?;
        self.pos = target;
        Ok(target)
    }
}

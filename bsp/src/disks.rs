//! The contract between a filesystem and the block devices it mounts.

use log::{trace, warn};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use spin::Mutex;
use thiserror::Error;

pub const SECTOR_SIZE: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskStatus {
    Ready,
    NoDisk,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskError {
    #[error("Hard error in the device")]
    Device,

    #[error("Device not ready")]
    NotReady,

    #[error("Invalid parameter")]
    Parameter,
}

/// Control codes as the filesystem passes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum IoctlCommand {
    Sync = 0,
    GetSectorCount = 1,
    GetSectorSize = 2,
    GetBlockSize = 3,
    Trim = 4,
}

/// A sector-addressed disk.
pub trait DiskIo: Send + Sync {
    fn status(&self) -> DiskStatus;

    /// Nothing to bring up once the device is probed.
    fn initialize(&self) -> DiskStatus {
        DiskStatus::Ready
    }

    /// Read `count` sectors starting at `sector`.
    /// `buff` holds at least `count * SECTOR_SIZE` bytes.
    fn read(&self, buff: &mut [u8], sector: u32, count: u32) -> Result<(), DiskError>;

    /// Write `count` sectors starting at `sector`.
    /// `buff` holds at least `count * SECTOR_SIZE` bytes.
    fn write(&self, buff: &[u8], sector: u32, count: u32) -> Result<(), DiskError>;

    /// Writes complete before they return, so a sync has nothing left to flush.
    fn ioctl(&self, command: IoctlCommand) -> Result<(), DiskError> {
        match command {
            IoctlCommand::Sync => Ok(()),
            other => {
                warn!(target: "disks", "Unsupported disk control {:?}", other);
                Err(DiskError::Parameter)
            }
        }
    }

    fn ioctl_raw(&self, code: u8) -> Result<(), DiskError> {
        match IoctlCommand::from_u8(code) {
            Some(command) => self.ioctl(command),
            None => {
                warn!(target: "disks", "Unknown disk control code {}", code);
                Err(DiskError::Parameter)
            }
        }
    }
}

/// A disk backed by a caller-provided piece of RAM.
pub struct RamDisk<'a> {
    storage: Mutex<&'a mut [u8]>,
}

impl<'a> RamDisk<'a> {
    /// Only whole sectors of `storage` are used.
    pub fn new(storage: &'a mut [u8]) -> Self {
        let len = storage.len() - storage.len() % SECTOR_SIZE;
        Self {
            storage: Mutex::new(&mut storage[..len]),
        }
    }

    pub fn sector_count(&self) -> usize {
        self.storage.lock().len() / SECTOR_SIZE
    }

    fn span(
        disk_len: usize,
        buff_len: usize,
        sector: u32,
        count: u32,
    ) -> Result<core::ops::Range<usize>, DiskError> {
        let start = sector as usize * SECTOR_SIZE;
        let len = count as usize * SECTOR_SIZE;
        let end = start.checked_add(len).ok_or(DiskError::Parameter)?;
        if end > disk_len || buff_len < len {
            return Err(DiskError::Parameter);
        }
        Ok(start..end)
    }
}

impl DiskIo for RamDisk<'_> {
    fn status(&self) -> DiskStatus {
        DiskStatus::Ready
    }

    fn read(&self, buff: &mut [u8], sector: u32, count: u32) -> Result<(), DiskError> {
        trace!(target: "disks", "ram read sector {} count {}", sector, count);
        let storage = self.storage.lock();
        let span = Self::span(storage.len(), buff.len(), sector, count)?;
        buff[..span.len()].copy_from_slice(&storage[span]);
        Ok(())
    }

    fn write(&self, buff: &[u8], sector: u32, count: u32) -> Result<(), DiskError> {
        trace!(target: "disks", "ram write sector {} count {}", sector, count);
        let mut storage = self.storage.lock();
        let span = Self::span(storage.len(), buff.len(), sector, count)?;
        let len = span.len();
        storage[span].copy_from_slice(&buff[..len]);
        Ok(())
    }
}

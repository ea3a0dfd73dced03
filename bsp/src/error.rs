use core::fmt::Debug;

use thiserror::Error;

#[derive(Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    CustomStr(&'static str),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Interrupt error: {0}")]
    Interrupt(#[from] InterruptError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
}

impl Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    #[error("No disk attached")]
    NoDisk,

    #[error("Request queue not running")]
    QueueNotRunning,

    #[error("Request timed out")]
    Timeout,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptError {
    #[error("Interrupt {0} already has a handler")]
    InUse(u32),

    #[error("Interrupt {0} is out of range")]
    Invalid(u32),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Region has {count} slots, {needed} needed")]
    RegionTooSmall { count: usize, needed: usize },

    #[error("Region stride {stride:#x} can't hold {size:#x} bytes")]
    StrideTooSmall { stride: usize, size: usize },

    #[error("Address {0:#x} is misaligned")]
    Misaligned(usize),

    #[error("Regions overlap")]
    Overlap,
}

//! Driver for the IceBlk block device.
//!
//! One request is in flight at a time. Completion is signaled by interrupt and
//! bounded by a timeout; see [`IceBlk::queue_request`].

#![cfg_attr(not(test), no_std)]

use bsp::{
    disks::DiskStatus, error::Error, interrupts::InterruptController, mmio::RegisterWindow,
    rtos::Rtos,
};
use log::warn;
use spin::Once;

mod device;
mod disk;
mod regs;
mod request;
#[cfg(test)]
mod sim;

pub use device::{Config, Geometry, IceBlk, MAX_REQUEST_SECTORS};
pub use request::Request;

static DEVICE: Once<IceBlk> = Once::new();

/// Bring up the board's disk controller. Later calls return the same device.
pub fn init(
    regs: RegisterWindow,
    rtos: &'static dyn Rtos,
    controller: &InterruptController,
    interrupt: u32,
    config: Config,
) -> Result<&'static IceBlk, Error> {
    let device = DEVICE.call_once(|| IceBlk::new(regs, rtos, config));
    if !device.is_probed() && device.setup(controller, interrupt)? == DiskStatus::NoDisk {
        warn!("Device setup failed, disk unavailable");
    }
    Ok(device)
}

/// The device brought up by [`init`].
pub fn device() -> Option<&'static IceBlk> {
    DEVICE.get()
}

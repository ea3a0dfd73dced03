#![cfg_attr(not(any(test, feature = "sim")), no_std)]

pub mod board;
pub mod cpu;
pub mod devices;
pub mod disks;
pub mod error;
pub mod interrupts;
pub mod logger;
pub mod memory;
pub mod mmio;
pub mod rtos;
pub mod sync;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

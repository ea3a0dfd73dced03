//! Driver for the IceNet Ethernet controller.
//!
//! Frames live in two fixed regions of slots, one for sending and one for receiving.
//! Each region is walked by a [`ring::Ring`] that tracks which slots the controller owns.
//! The driver polls: it never blocks and takes no lock.

#![cfg_attr(not(test), no_std)]

mod device;
mod frame;
mod regs;
pub mod ring;
#[cfg(test)]
mod sim;

pub use device::{IceNet, ETH_HEADER_BYTES, FRAME_ALIGN, MAX_FRAME_SIZE, MTU, RING_SIZE};
pub use frame::{RxFrame, TxFrame};
pub use regs::IntMask;

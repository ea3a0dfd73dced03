//! Memory map of the FireSim target.

use crate::{
    memory::{PhysicalAddress, Region},
    mmio::{RegisterWindow, VOLATILE},
};
use static_assertions::const_assert;

pub const FRAME_SLOT_STRIDE: usize = 0x600;
pub const FRAME_SLOT_COUNT: usize = 64;

// slots are 8-byte aligned for DMA
const_assert!(FRAME_SLOT_STRIDE % 8 == 0);
const_assert!(FRAME_SLOT_COUNT.is_power_of_two());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    pub clint_base: PhysicalAddress,
    pub plic_base: PhysicalAddress,
    /// PLIC context of the boot hart in machine mode.
    pub plic_context: usize,
    pub uart_base: PhysicalAddress,
    pub uart_irq: u32,
    pub iceblk_base: PhysicalAddress,
    pub iceblk_irq: u32,
    pub icenet_base: PhysicalAddress,
    pub icenet_irq: u32,
    pub timebase_hz: u64,
    pub peripheral_clock_hz: u32,
    pub tx_frames: Region,
    pub rx_frames: Region,
}

impl BoardConfig {
    pub const FIRESIM: Self = {
        let tx_frames = Region::new(
            PhysicalAddress::new(0x8000_0000),
            FRAME_SLOT_STRIDE,
            FRAME_SLOT_COUNT,
        );
        Self {
            clint_base: PhysicalAddress::new(0x0200_0000),
            plic_base: PhysicalAddress::new(0x0C00_0000),
            plic_context: 0,
            uart_base: PhysicalAddress::new(0x5400_0000),
            uart_irq: 1,
            iceblk_base: PhysicalAddress::new(0x1001_5000),
            iceblk_irq: 2,
            icenet_base: PhysicalAddress::new(0x1001_6000),
            icenet_irq: 3,
            timebase_hz: 1_000_000,
            peripheral_clock_hz: 100_000_000,
            tx_frames,
            rx_frames: Region::new(
                PhysicalAddress::new(0x8000_0000 + FRAME_SLOT_STRIDE * FRAME_SLOT_COUNT),
                FRAME_SLOT_STRIDE,
                FRAME_SLOT_COUNT,
            ),
        }
    };

    /// # Safety
    /// `base` must be one of this board's device windows and the board must be the one running.
    pub unsafe fn window(&self, base: PhysicalAddress) -> RegisterWindow {
        unsafe { RegisterWindow::new(base, &VOLATILE) }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::FIRESIM
    }
}

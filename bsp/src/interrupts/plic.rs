use spin::Mutex;

use super::InterruptsChip;
use crate::mmio::RegisterWindow;

const PRIORITY: usize = 0x0;
const ENABLE: usize = 0x2000;
const ENABLE_STRIDE: usize = 0x80;
const THRESHOLD: usize = 0x20_0000;
const CONTEXT_STRIDE: usize = 0x1000;
const CLAIM: usize = 0x20_0004;

/// Platform-Level Interrupt Controller, seen from one hart context.
pub struct Plic {
    regs: RegisterWindow,
    context: usize,
    // enable bits are read-modify-write
    enable_lock: Mutex<()>,
}

impl Plic {
    pub const fn new(regs: RegisterWindow, context: usize) -> Self {
        Self {
            regs,
            context,
            enable_lock: Mutex::new(()),
        }
    }

    /// Accept every source with a non-zero priority.
    pub fn init(&self) {
        self.regs.write32(THRESHOLD + CONTEXT_STRIDE * self.context, 0);
    }

    pub fn set_priority(&self, interrupt: u32, priority: u32) {
        self.regs.write32(PRIORITY + 4 * interrupt as usize, priority);
    }

    #[inline]
    fn enable_word(&self, interrupt: u32) -> (usize, u32) {
        let offset = ENABLE + ENABLE_STRIDE * self.context + 4 * (interrupt as usize / 32);
        (offset, 1 << (interrupt % 32))
    }
}

impl InterruptsChip for Plic {
    fn enable_interrupt(&self, interrupt: u32) {
        self.set_priority(interrupt, 1);
        let (offset, bit) = self.enable_word(interrupt);
        let _guard = self.enable_lock.lock();
        let current = self.regs.read32(offset);
        self.regs.write32(offset, current | bit);
    }

    fn disable_interrupt(&self, interrupt: u32) {
        let (offset, bit) = self.enable_word(interrupt);
        let _guard = self.enable_lock.lock();
        let current = self.regs.read32(offset);
        self.regs.write32(offset, current & !bit);
    }

    #[inline]
    fn claim(&self) -> Option<u32> {
        match self.regs.read32(CLAIM + CONTEXT_STRIDE * self.context) {
            0 => None,
            interrupt => Some(interrupt),
        }
    }

    #[inline]
    fn complete(&self, interrupt: u32) {
        self.regs.write32(CLAIM + CONTEXT_STRIDE * self.context, interrupt);
    }
}

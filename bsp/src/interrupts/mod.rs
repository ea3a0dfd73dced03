use log::{trace, warn};
use spin::RwLock;

use crate::error::InterruptError;

mod plic;
pub use plic::Plic;

pub trait InterruptsChip: Sync + Send {
    fn enable_interrupt(&self, interrupt: u32);
    fn disable_interrupt(&self, interrupt: u32);

    /// Return the highest priority pending interrupt, if any, and mark it in service.
    fn claim(&self) -> Option<u32>;
    fn complete(&self, interrupt: u32);
}

/// A device that services one interrupt source. Runs in interrupt context.
pub trait InterruptHandler: Sync {
    fn handle_interrupt(&self, interrupt: u32);
}

pub const MAX_INTERRUPTS: usize = 64;

/// Interrupt sources of one chip and the handlers bound to them.
pub struct InterruptController {
    chip: &'static dyn InterruptsChip,
    handlers: RwLock<[Option<&'static dyn InterruptHandler>; MAX_INTERRUPTS]>,
}

impl InterruptController {
    pub const fn new(chip: &'static dyn InterruptsChip) -> Self {
        Self {
            chip,
            handlers: RwLock::new([None; MAX_INTERRUPTS]),
        }
    }

    #[inline]
    pub fn chip(&self) -> &'static dyn InterruptsChip {
        self.chip
    }

    /// Bind `handler` to `interrupt` and enable the source. Fail if there is already a handler.
    pub fn register_handler(
        &self,
        interrupt: u32,
        handler: &'static dyn InterruptHandler,
    ) -> Result<(), InterruptError> {
        if interrupt == 0 || interrupt as usize >= MAX_INTERRUPTS {
            return Err(InterruptError::Invalid(interrupt));
        }
        let mut handlers = self.handlers.write();
        let slot = &mut handlers[interrupt as usize];
        if slot.is_some() {
            return Err(InterruptError::InUse(interrupt));
        }
        *slot = Some(handler);
        drop(handlers);

        self.chip.enable_interrupt(interrupt);
        trace!(target: "interrupts", "Registered handler for interrupt {}", interrupt);
        Ok(())
    }

    pub fn unregister_handler(&self, interrupt: u32) {
        if interrupt as usize >= MAX_INTERRUPTS {
            return;
        }
        self.chip.disable_interrupt(interrupt);
        self.handlers.write()[interrupt as usize] = None;
    }

    /// Service every pending interrupt. Called from the external interrupt trap, with
    /// interrupts masked.
    pub fn dispatch(&self) {
        while let Some(interrupt) = self.chip.claim() {
            trace!(target: "interrupts", "Receive IRQ {}", interrupt);

            let handler = self
                .handlers
                .read()
                .get(interrupt as usize)
                .copied()
                .flatten();
            match handler {
                Some(handler) => handler.handle_interrupt(interrupt),
                None => warn!(target: "interrupts", "No handler for interrupt {}", interrupt),
            }

            self.chip.complete(interrupt);
        }
    }
}

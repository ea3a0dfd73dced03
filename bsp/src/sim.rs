//! Host stand-ins for the hart and its interrupt chip.
//!
//! Tasks are host threads. Masking interrupts takes a re-entrant "CPU lock", and
//! pending interrupts are delivered whenever a task that does not hold it yields.

use std::{
    sync::{Condvar, Mutex},
    thread::{self, ThreadId},
    time::Instant,
};

use core::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use spin::Once;

use crate::{
    interrupts::{InterruptController, InterruptsChip},
    rtos::Rtos,
};

#[derive(Default)]
struct CpuLock {
    owner: Option<ThreadId>,
    depth: usize,
}

pub struct HostRtos {
    start: Instant,
    cpu: Mutex<CpuLock>,
    released: Condvar,
    controller: Once<&'static InterruptController>,
}

impl Default for HostRtos {
    fn default() -> Self {
        Self {
            start: Instant::now(),
            cpu: Mutex::new(CpuLock::default()),
            released: Condvar::new(),
            controller: Once::new(),
        }
    }
}

impl HostRtos {
    pub fn leak() -> &'static Self {
        Box::leak(Box::default())
    }

    /// Deliver the interrupts of `controller` on yields.
    pub fn set_controller(&self, controller: &'static InterruptController) {
        self.controller.call_once(|| controller);
    }

    fn masked_here(&self) -> bool {
        let cpu = self.cpu.lock().unwrap_or_else(|e| e.into_inner());
        cpu.owner == Some(thread::current().id())
    }
}

impl Rtos for HostRtos {
    fn uptime(&self) -> Duration {
        self.start.elapsed()
    }

    fn yield_now(&self) {
        if let Some(controller) = self.controller.get() {
            if !self.masked_here() {
                let restore = self.disable_interrupts();
                controller.dispatch();
                self.restore_interrupts(restore);
            }
        }
        thread::yield_now();
    }

    fn disable_interrupts(&self) -> bool {
        let me = thread::current().id();
        let mut cpu = self.cpu.lock().unwrap_or_else(|e| e.into_inner());
        if cpu.owner == Some(me) {
            cpu.depth += 1;
            return false;
        }
        while cpu.owner.is_some() {
            cpu = self
                .released
                .wait(cpu)
                .unwrap_or_else(|e| e.into_inner());
        }
        cpu.owner = Some(me);
        cpu.depth = 1;
        true
    }

    fn restore_interrupts(&self, enabled: bool) {
        let mut cpu = self.cpu.lock().unwrap_or_else(|e| e.into_inner());
        assert_eq!(cpu.owner, Some(thread::current().id()));
        cpu.depth -= 1;
        assert_eq!(cpu.depth == 0, enabled, "Unbalanced critical section");
        if cpu.depth == 0 {
            cpu.owner = None;
            self.released.notify_one();
        }
    }
}

/// Interrupt chip with 64 level-free sources: `raise` marks one pending until claimed.
#[derive(Default)]
pub struct SimChip {
    pending: AtomicU64,
    enabled: AtomicU64,
}

impl SimChip {
    pub fn leak() -> &'static Self {
        Box::leak(Box::default())
    }

    pub fn raise(&self, interrupt: u32) {
        self.pending.fetch_or(1 << interrupt, Ordering::SeqCst);
    }

    pub fn is_enabled(&self, interrupt: u32) -> bool {
        self.enabled.load(Ordering::SeqCst) & (1 << interrupt) != 0
    }

    pub fn is_pending(&self, interrupt: u32) -> bool {
        self.pending.load(Ordering::SeqCst) & (1 << interrupt) != 0
    }
}

impl InterruptsChip for SimChip {
    fn enable_interrupt(&self, interrupt: u32) {
        self.enabled.fetch_or(1 << interrupt, Ordering::SeqCst);
    }

    fn disable_interrupt(&self, interrupt: u32) {
        self.enabled.fetch_and(!(1 << interrupt), Ordering::SeqCst);
    }

    fn claim(&self) -> Option<u32> {
        loop {
            let pending = self.pending.load(Ordering::SeqCst);
            let ready = pending & self.enabled.load(Ordering::SeqCst);
            if ready == 0 {
                return None;
            }
            let interrupt = ready.trailing_zeros();
            let bit = 1 << interrupt;
            if self
                .pending
                .compare_exchange(pending, pending & !bit, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Some(interrupt);
            }
        }
    }

    fn complete(&self, _interrupt: u32) {}
}

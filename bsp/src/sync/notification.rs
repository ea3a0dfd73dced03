use core::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use crate::rtos::{Deadline, Rtos};

/// One-shot wake signal. Set from interrupt context, consumed by one waiting task.
#[derive(Debug, Default)]
pub struct Notification {
    signaled: AtomicBool,
}

impl Notification {
    pub const fn new() -> Self {
        Self {
            signaled: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn notify(&self) {
        self.signaled.store(true, Ordering::Release);
    }

    /// Drop a signal nobody consumed.
    #[inline]
    pub fn clear(&self) {
        self.signaled.store(false, Ordering::Release);
    }

    /// Consume the signal if it is set.
    #[inline]
    pub fn take(&self) -> bool {
        self.signaled.swap(false, Ordering::AcqRel)
    }

    /// Wait for the signal, at most `timeout`. Return `false` if the time ran out.
    pub fn wait_timeout(&self, rtos: &dyn Rtos, timeout: Duration) -> bool {
        let deadline = Deadline::after(rtos, timeout);
        loop {
            if self.take() {
                return true;
            }
            if deadline.expired(rtos) {
                // the signal may have landed while checking the clock
                return self.take();
            }
            rtos.yield_now();
        }
    }
}

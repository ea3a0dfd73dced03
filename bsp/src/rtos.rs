use core::time::Duration;

/// What the drivers need from the host real-time OS.
pub trait Rtos: Sync + Send {
    /// Monotonic time since boot.
    fn uptime(&self) -> Duration;

    /// Let other tasks run. Pending interrupts may be serviced before this returns.
    fn yield_now(&self);

    /// Mask interrupts on the current hart. Return whether they were enabled before.
    fn disable_interrupts(&self) -> bool;

    /// Restore the state returned by the matching [`Rtos::disable_interrupts`].
    fn restore_interrupts(&self, enabled: bool);

    /// Block the calling task for at least `duration`.
    fn sleep(&self, duration: Duration) {
        let deadline = Deadline::after(self, duration);
        while !deadline.expired(self) {
            self.yield_now();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Duration);

impl Deadline {
    #[inline]
    pub fn after<R: Rtos + ?Sized>(rtos: &R, timeout: Duration) -> Self {
        Self(rtos.uptime().saturating_add(timeout))
    }

    #[inline]
    pub fn expired<R: Rtos + ?Sized>(&self, rtos: &R) -> bool {
        rtos.uptime() >= self.0
    }

    #[inline]
    pub fn remaining<R: Rtos + ?Sized>(&self, rtos: &R) -> Duration {
        self.0.saturating_sub(rtos.uptime())
    }
}

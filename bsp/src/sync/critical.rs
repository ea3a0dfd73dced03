use crate::rtos::Rtos;

/// Interrupts stay masked on this hart while the guard lives.
///
/// Sections nest: dropping an inner guard restores the state seen when it was entered.
#[must_use]
pub struct CriticalSection<'a> {
    rtos: &'a dyn Rtos,
    restore: bool,
}

impl<'a> CriticalSection<'a> {
    #[inline(always)]
    pub fn enter(rtos: &'a dyn Rtos) -> Self {
        let restore = rtos.disable_interrupts();
        Self { rtos, restore }
    }
}

impl Drop for CriticalSection<'_> {
    #[inline(always)]
    fn drop(&mut self) {
        self.rtos.restore_interrupts(self.restore);
    }
}

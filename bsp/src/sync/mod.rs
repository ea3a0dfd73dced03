mod critical;
mod notification;

pub use critical::CriticalSection;
pub use notification::Notification;

use spin::lock_api::{Mutex, MutexGuard};

use crate::rtos::Rtos;

/// Acquire `mutex`, letting other tasks run while it is held elsewhere.
///
/// There is no timeout: the caller stays here until the owner releases it.
pub fn lock<'a, T>(mutex: &'a Mutex<T>, rtos: &dyn Rtos) -> MutexGuard<'a, T> {
    loop {
        if let Some(guard) = mutex.try_lock() {
            return guard;
        }
        rtos.yield_now();
    }
}

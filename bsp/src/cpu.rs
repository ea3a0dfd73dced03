use core::time::Duration;

use crate::mmio::RegisterWindow;

/// Offset of `mtime` in the CLINT window.
pub const MTIME: usize = 0xBFF8;

/// `mstatus.MIE`
pub const MSTATUS_MIE: usize = 1 << 3;

/// Machine-mode hart with no scheduler: time comes from the CLINT, yielding spins.
#[derive(Debug)]
pub struct BareMetal {
    clint: RegisterWindow,
    timebase_hz: u64,
}

impl BareMetal {
    /// Panic if `timebase_hz` is zero.
    pub const fn new(clint: RegisterWindow, timebase_hz: u64) -> Self {
        assert!(timebase_hz != 0, "Zero timebase frequency");
        Self { clint, timebase_hz }
    }

    #[inline]
    pub fn timebase_hz(&self) -> u64 {
        self.timebase_hz
    }

    /// The 64-bit counter read as two words, retried if the high word moved in between.
    pub fn mtime(&self) -> u64 {
        loop {
            let high = self.clint.read32(MTIME + 4);
            let low = self.clint.read32(MTIME);
            if self.clint.read32(MTIME + 4) == high {
                return (high as u64) << 32 | low as u64;
            }
        }
    }
}

pub fn ticks_to_duration(ticks: u64, hz: u64) -> Duration {
    debug_assert!(hz != 0);
    let secs = ticks / hz;
    let nanos = (ticks % hz) as u128 * 1_000_000_000 / hz as u128;
    Duration::new(secs, nanos as u32)
}

cfg_if::cfg_if! {
    if #[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))] {
        use crate::rtos::Rtos;

        impl Rtos for BareMetal {
            fn uptime(&self) -> Duration {
                ticks_to_duration(self.mtime(), self.timebase_hz())
            }

            #[inline]
            fn yield_now(&self) {
                core::hint::spin_loop();
            }

            #[inline]
            fn disable_interrupts(&self) -> bool {
                let previous: usize;
                unsafe {
                    core::arch::asm!(
                        "csrrci {0}, mstatus, {1}",
                        out(reg) previous,
                        const MSTATUS_MIE,
                        options(nostack),
                    );
                }
                previous & MSTATUS_MIE != 0
            }

            #[inline]
            fn restore_interrupts(&self, enabled: bool) {
                if enabled {
                    unsafe {
                        core::arch::asm!("csrsi mstatus, {0}", const MSTATUS_MIE, options(nostack));
                    }
                }
            }
        }
    }
}

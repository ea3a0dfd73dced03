//! Register access primitives.
//!
//! Every access goes straight to the device: reads are never cached and writes are
//! issued in program order. [`Mmio::write64`] is *not* atomic, it is two 32-bit
//! stores, low word first. Devices that sample a 64-bit field on the low-word write
//! rely on that order.

use core::ptr;

use log::trace;

use crate::memory::PhysicalAddress;

/// Typed loads and stores on memory-mapped addresses.
///
/// # Safety
/// Callers of the methods must pass addresses that belong to a mapped device (or
/// memory) and are aligned to the access width.
pub trait Mmio: Send + Sync {
    unsafe fn read8(&self, addr: PhysicalAddress) -> u8;
    unsafe fn read16(&self, addr: PhysicalAddress) -> u16;
    unsafe fn read32(&self, addr: PhysicalAddress) -> u32;
    unsafe fn read64(&self, addr: PhysicalAddress) -> u64;

    unsafe fn write8(&self, addr: PhysicalAddress, value: u8);
    unsafe fn write16(&self, addr: PhysicalAddress, value: u16);
    unsafe fn write32(&self, addr: PhysicalAddress, value: u32);

    /// Store `value` as two 32-bit writes: `addr` gets the low word, then `addr + 4` the high word.
    #[inline]
    unsafe fn write64(&self, addr: PhysicalAddress, value: u64) {
        unsafe {
            self.write32(addr, value as u32);
            self.write32(addr + 4, (value >> 32) as u32);
        }
    }
}

/// Direct volatile accesses, for real hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct Volatile;

pub static VOLATILE: Volatile = Volatile;

impl Mmio for Volatile {
    #[inline(always)]
    unsafe fn read8(&self, addr: PhysicalAddress) -> u8 {
        unsafe { ptr::read_volatile(addr.as_ptr()) }
    }

    #[inline(always)]
    unsafe fn read16(&self, addr: PhysicalAddress) -> u16 {
        unsafe { ptr::read_volatile(addr.as_ptr()) }
    }

    #[inline(always)]
    unsafe fn read32(&self, addr: PhysicalAddress) -> u32 {
        unsafe { ptr::read_volatile(addr.as_ptr()) }
    }

    #[inline(always)]
    unsafe fn read64(&self, addr: PhysicalAddress) -> u64 {
        cfg_if::cfg_if! {
            if #[cfg(target_pointer_width = "64")] {
                unsafe { ptr::read_volatile(addr.as_ptr()) }
            } else {
                let low = unsafe { ptr::read_volatile::<u32>(addr.as_ptr()) } as u64;
                let high = unsafe { ptr::read_volatile::<u32>((addr + 4).as_ptr()) } as u64;
                high << 32 | low
            }
        }
    }

    #[inline(always)]
    unsafe fn write8(&self, addr: PhysicalAddress, value: u8) {
        unsafe { ptr::write_volatile(addr.as_ptr(), value) }
    }

    #[inline(always)]
    unsafe fn write16(&self, addr: PhysicalAddress, value: u16) {
        unsafe { ptr::write_volatile(addr.as_ptr(), value) }
    }

    #[inline(always)]
    unsafe fn write32(&self, addr: PhysicalAddress, value: u32) {
        unsafe { ptr::write_volatile(addr.as_ptr(), value) }
    }
}

/// The register window of one peripheral: a base address and the accessor used to reach it.
#[derive(Clone, Copy)]
pub struct RegisterWindow {
    base: PhysicalAddress,
    io: &'static dyn Mmio,
}

impl core::fmt::Debug for RegisterWindow {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisterWindow")
            .field("base", &self.base)
            .finish()
    }
}

impl RegisterWindow {
    /// # Safety
    /// `base` must be the base of a device register window reachable through `io`, and
    /// every offset later used with this window must stay inside it.
    pub const unsafe fn new(base: PhysicalAddress, io: &'static dyn Mmio) -> Self {
        Self { base, io }
    }

    #[inline]
    pub fn base(&self) -> PhysicalAddress {
        self.base
    }

    #[inline]
    pub fn read8(&self, offset: usize) -> u8 {
        let value = unsafe { self.io.read8(self.base + offset) };
        trace!(target: "mmio", "read8 {}+{:#x} -> {:#x}", self.base, offset, value);
        value
    }

    #[inline]
    pub fn read16(&self, offset: usize) -> u16 {
        let value = unsafe { self.io.read16(self.base + offset) };
        trace!(target: "mmio", "read16 {}+{:#x} -> {:#x}", self.base, offset, value);
        value
    }

    #[inline]
    pub fn read32(&self, offset: usize) -> u32 {
        let value = unsafe { self.io.read32(self.base + offset) };
        trace!(target: "mmio", "read32 {}+{:#x} -> {:#x}", self.base, offset, value);
        value
    }

    #[inline]
    pub fn read64(&self, offset: usize) -> u64 {
        let value = unsafe { self.io.read64(self.base + offset) };
        trace!(target: "mmio", "read64 {}+{:#x} -> {:#x}", self.base, offset, value);
        value
    }

    #[inline]
    pub fn write8(&self, offset: usize, value: u8) {
        trace!(target: "mmio", "write8 {}+{:#x} <- {:#x}", self.base, offset, value);
        unsafe { self.io.write8(self.base + offset, value) }
    }

    #[inline]
    pub fn write16(&self, offset: usize, value: u16) {
        trace!(target: "mmio", "write16 {}+{:#x} <- {:#x}", self.base, offset, value);
        unsafe { self.io.write16(self.base + offset, value) }
    }

    #[inline]
    pub fn write32(&self, offset: usize, value: u32) {
        trace!(target: "mmio", "write32 {}+{:#x} <- {:#x}", self.base, offset, value);
        unsafe { self.io.write32(self.base + offset, value) }
    }

    /// Low word first, see [`Mmio::write64`].
    #[inline]
    pub fn write64(&self, offset: usize, value: u64) {
        trace!(target: "mmio", "write64 {}+{:#x} <- {:#x}", self.base, offset, value);
        unsafe { self.io.write64(self.base + offset, value) }
    }
}

#[cfg(test)]
mod tests {
    use spin::Mutex;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Access {
        Read(usize, u8),
        Write(usize, u8, u64),
    }

    #[derive(Default)]
    struct Recorder {
        log: Mutex<Vec<Access>>,
    }

    impl Mmio for Recorder {
        unsafe fn read8(&self, addr: PhysicalAddress) -> u8 {
            self.log.lock().push(Access::Read(addr.addr(), 8));
            0xAB
        }
        unsafe fn read16(&self, addr: PhysicalAddress) -> u16 {
            self.log.lock().push(Access::Read(addr.addr(), 16));
            0xABCD
        }
        unsafe fn read32(&self, addr: PhysicalAddress) -> u32 {
            self.log.lock().push(Access::Read(addr.addr(), 32));
            0x1234_5678
        }
        unsafe fn read64(&self, addr: PhysicalAddress) -> u64 {
            self.log.lock().push(Access::Read(addr.addr(), 64));
            0x1122_3344_5566_7788
        }
        unsafe fn write8(&self, addr: PhysicalAddress, value: u8) {
            self.log
                .lock()
                .push(Access::Write(addr.addr(), 8, value as u64));
        }
        unsafe fn write16(&self, addr: PhysicalAddress, value: u16) {
            self.log
                .lock()
                .push(Access::Write(addr.addr(), 16, value as u64));
        }
        unsafe fn write32(&self, addr: PhysicalAddress, value: u32) {
            self.log
                .lock()
                .push(Access::Write(addr.addr(), 32, value as u64));
        }
    }

    #[test]
    fn write64_is_low_word_first() {
        let recorder: &'static Recorder = Box::leak(Box::default());
        let window = unsafe { RegisterWindow::new(PhysicalAddress::new(0x1000), recorder) };

        window.write64(0x40, 0xDEAD_BEEF_0000_1111);

        let log = recorder.log.lock();
        assert_eq!(
            *log,
            [
                Access::Write(0x1040, 32, 0x0000_1111),
                Access::Write(0x1044, 32, 0xDEAD_BEEF),
            ]
        );
    }

    #[test]
    fn window_offsets_are_relative_to_base() {
        let recorder: &'static Recorder = Box::leak(Box::default());
        let window = unsafe { RegisterWindow::new(PhysicalAddress::new(0x2000), recorder) };

        assert_eq!(window.read8(17), 0xAB);
        assert_eq!(window.read16(18), 0xABCD);
        assert_eq!(window.read32(24), 0x1234_5678);
        assert_eq!(window.read64(24), 0x1122_3344_5566_7788);
        window.write8(16, 1);
        window.write16(2, 0x10);

        let log = recorder.log.lock();
        assert_eq!(
            *log,
            [
                Access::Read(0x2011, 8),
                Access::Read(0x2012, 16),
                Access::Read(0x2018, 32),
                Access::Read(0x2018, 64),
                Access::Write(0x2010, 8, 1),
                Access::Write(0x2002, 16, 0x10),
            ]
        );
    }

    #[test]
    fn volatile_reaches_memory() {
        let cell: &'static mut [u64; 2] = Box::leak(Box::new([0u64; 2]));
        let base = PhysicalAddress::from_ptr(cell.as_mut_ptr());
        let window = unsafe { RegisterWindow::new(base, &VOLATILE) };

        window.write64(0, 0x0000_0002_0000_0001);
        window.write32(8, 7);

        assert_eq!(window.read32(0), 1);
        assert_eq!(window.read32(4), 2);
        assert_eq!(window.read64(0), 0x0000_0002_0000_0001);
        assert_eq!(window.read8(8), 7);
    }
}

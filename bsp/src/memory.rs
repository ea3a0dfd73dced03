use core::{
    fmt::{Debug, Display},
    ops::{Add, AddAssign, Sub},
};

use crate::error::MemoryError;

/// Represent a physical memory address. Has the same memory layout as `usize`.
///
/// The board runs with an identity mapping, so a physical address is also the
/// address the CPU uses to reach that memory.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PhysicalAddress(usize);

impl PhysicalAddress {
    #[inline]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn from_ptr<T: ?Sized>(ptr: *const T) -> Self {
        Self(ptr as *const () as usize)
    }

    #[inline]
    /// Get the underlying address.
    pub const fn addr(self) -> usize {
        self.0
    }

    #[inline]
    pub const fn is_aligned_to(self, alignment: usize) -> bool {
        self.0 % alignment == 0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn as_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }
}

impl Add<usize> for PhysicalAddress {
    type Output = Self;
    fn add(self, rhs: usize) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<usize> for PhysicalAddress {
    fn add_assign(&mut self, rhs: usize) {
        self.0 += rhs;
    }
}

impl Sub for PhysicalAddress {
    type Output = usize;
    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}

impl Debug for PhysicalAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PhysicalAddress({:#x})", self.0)
    }
}

impl Display for PhysicalAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A block of `count` equally sized slots starting at `base`, `stride` bytes apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub base: PhysicalAddress,
    pub stride: usize,
    pub count: usize,
}

impl Region {
    pub const fn new(base: PhysicalAddress, stride: usize, count: usize) -> Self {
        Self {
            base,
            stride,
            count,
        }
    }

    /// Address of slot `index`. Panic if `index` is out of the region.
    #[inline]
    pub fn slot(&self, index: usize) -> PhysicalAddress {
        assert!(index < self.count, "Slot {} outside of region", index);
        self.base + index * self.stride
    }

    #[inline]
    pub const fn size(&self) -> usize {
        self.stride * self.count
    }

    /// Address right after the last slot.
    #[inline]
    pub fn end(&self) -> PhysicalAddress {
        self.base + self.size()
    }

    #[inline]
    pub fn overlaps(&self, other: &Region) -> bool {
        self.base < other.end() && other.base < self.end()
    }

    /// Check that the region has at least `count` slots of `size` bytes each, aligned to `align`.
    pub fn check(&self, count: usize, size: usize, align: usize) -> Result<(), MemoryError> {
        if self.count < count {
            return Err(MemoryError::RegionTooSmall {
                count: self.count,
                needed: count,
            });
        }
        if self.stride < size {
            return Err(MemoryError::StrideTooSmall {
                stride: self.stride,
                size,
            });
        }
        if !self.base.is_aligned_to(align) || self.stride % align != 0 {
            return Err(MemoryError::Misaligned(self.base.addr()));
        }
        Ok(())
    }
}

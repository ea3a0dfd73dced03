use bsp::memory::{PhysicalAddress, Region};

/// Circular queue of frame slots. One entry always stays free so a full ring differs from an
/// empty one.
#[derive(Debug)]
pub struct Ring<const N: usize> {
    slots: [PhysicalAddress; N],
    head: usize,
    tail: usize,
}

impl<const N: usize> Ring<N> {
    const MASK: usize = {
        assert!(N.is_power_of_two(), "Ring capacity must be a power of two");
        N - 1
    };

    /// An empty ring over the first `N` slots of `region`.
    pub fn new(region: &Region) -> Self {
        let mut slots = [PhysicalAddress::default(); N];
        for (i, slot) in slots.iter_mut().enumerate() {
            *slot = region.slot(i);
        }
        Self {
            slots,
            head: 0,
            tail: 0,
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.head.wrapping_sub(self.tail) & Self::MASK
    }

    #[inline]
    pub fn space(&self) -> usize {
        N - 1 - self.count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    #[inline]
    pub fn head_slot(&self) -> PhysicalAddress {
        self.slots[self.head]
    }

    /// Hand the head slot over and advance. Panic if the ring is full.
    pub fn push(&mut self) -> PhysicalAddress {
        assert!(self.space() > 0, "Push on a full ring");
        let slot = self.slots[self.head];
        self.head = (self.head + 1) & Self::MASK;
        slot
    }

    /// Take the tail slot back, if any.
    pub fn pop(&mut self) -> Option<PhysicalAddress> {
        if self.is_empty() {
            return None;
        }
        let slot = self.slots[self.tail];
        self.tail = (self.tail + 1) & Self::MASK;
        Some(slot)
    }
}

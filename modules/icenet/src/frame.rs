use core::{marker::PhantomData, slice};

use bsp::memory::PhysicalAddress;

use crate::device::{IceNet, MAX_FRAME_SIZE};

/// The free send slot at the ring head. Holding it keeps the device borrowed, so the slot
/// can't be handed out twice.
pub struct TxFrame<'a> {
    pub(crate) nic: &'a mut IceNet,
    pub(crate) slot: PhysicalAddress,
}

impl TxFrame<'_> {
    #[inline]
    pub fn address(&self) -> PhysicalAddress {
        self.slot
    }

    pub fn buffer(&mut self) -> &mut [u8] {
        // the slot belongs to software until it is posted
        unsafe { slice::from_raw_parts_mut(self.slot.as_ptr::<u8>(), MAX_FRAME_SIZE) }
    }

    /// Post the first `len` bytes of the slot. Panic if `len` is above a frame.
    pub fn transmit(self, len: usize) {
        assert!(
            len <= MAX_FRAME_SIZE,
            "Frame of {} bytes, at most {}",
            len,
            MAX_FRAME_SIZE
        );
        unsafe { self.nic.transmit(self.slot, len) }
    }
}

/// A received frame. Its slot is reposted by the next
/// [`IceNet::allocate_receive_slots`], which can't run while the frame lives.
pub struct RxFrame<'a> {
    pub(crate) slot: PhysicalAddress,
    pub(crate) len: usize,
    pub(crate) _nic: PhantomData<&'a mut IceNet>,
}

impl RxFrame<'_> {
    #[inline]
    pub fn address(&self) -> PhysicalAddress {
        self.slot
    }

    /// Length reported by the controller.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn data(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.slot.as_ptr::<u8>(), self.len.min(MAX_FRAME_SIZE)) }
    }
}

use core::marker::PhantomData;

use bsp::{
    error::MemoryError,
    memory::{PhysicalAddress, Region},
    mmio::RegisterWindow,
};
use log::{error, info, trace, warn};
use static_assertions::const_assert;
use tock_registers::LocalRegisterCopy;

use crate::{
    frame::{RxFrame, TxFrame},
    regs::{Counts, IntMask, Registers},
    ring::Ring,
};

pub const MTU: usize = 1500;
pub const ETH_HEADER_BYTES: usize = 14;
pub const MAX_FRAME_SIZE: usize = MTU + ETH_HEADER_BYTES;
pub const RING_SIZE: usize = 64;
/// Slot alignment the controller's DMA engine needs.
pub const FRAME_ALIGN: usize = 8;

const_assert!(RING_SIZE.is_power_of_two());

/// An IceNet controller with its send and receive rings.
///
/// Nothing here blocks or locks: callers serialize their own accesses, which `&mut self`
/// enforces.
pub struct IceNet {
    regs: Registers,
    send: Ring<RING_SIZE>,
    recv: Ring<RING_SIZE>,
    opened: bool,
}

impl IceNet {
    /// # Safety
    /// `tx_frames` and `rx_frames` must be RAM reserved for this device, reachable by both the
    /// CPU and the controller, and `regs` must be the controller's window.
    pub unsafe fn new(
        regs: RegisterWindow,
        tx_frames: Region,
        rx_frames: Region,
    ) -> Result<Self, MemoryError> {
        tx_frames.check(RING_SIZE, MAX_FRAME_SIZE, FRAME_ALIGN)?;
        rx_frames.check(RING_SIZE, MAX_FRAME_SIZE, FRAME_ALIGN)?;
        if tx_frames.overlaps(&rx_frames) {
            return Err(MemoryError::Overlap);
        }
        Ok(Self {
            regs: Registers::new(regs),
            send: Ring::new(&tx_frames),
            recv: Ring::new(&rx_frames),
            opened: false,
        })
    }

    /// Post receive slots and unmask the receive interrupt.
    ///
    /// Both rings are built by [`IceNet::new`] and keep every slot already handed to the
    /// controller.
    pub fn open(&mut self) {
        if self.opened {
            warn!("Device already open");
            return;
        }
        self.opened = true;

        let posted = self.allocate_receive_slots();
        self.set_intmask(IntMask::RX);
        info!("Opened device, {} receive slots posted", posted);
    }

    #[inline]
    fn counts(&self) -> LocalRegisterCopy<u32, Counts::Register> {
        self.regs.counts()
    }

    #[inline]
    pub fn send_req_avail(&self) -> usize {
        self.counts().read(Counts::SEND_REQ) as usize
    }

    #[inline]
    pub fn recv_req_avail(&self) -> usize {
        self.counts().read(Counts::RECV_REQ) as usize
    }

    #[inline]
    pub fn send_comp_avail(&self) -> usize {
        self.counts().read(Counts::SEND_COMP) as usize
    }

    #[inline]
    pub fn recv_comp_avail(&self) -> usize {
        self.counts().read(Counts::RECV_COMP) as usize
    }

    /// Frames posted for sending and not completed yet.
    #[inline]
    pub fn send_in_flight(&self) -> usize {
        self.send.count()
    }

    /// Slots posted for receiving and not filled yet.
    #[inline]
    pub fn recv_posted(&self) -> usize {
        self.recv.count()
    }

    /// Post as many receive slots as both the controller and the ring take. Return how many.
    pub fn allocate_receive_slots(&mut self) -> usize {
        let count = self.recv_req_avail().min(self.recv.space());
        for _ in 0..count {
            let slot = self.recv.push();
            self.regs.post_recv(slot);
        }
        trace!("Posted {} receive slots", count);
        count
    }

    /// The send slot at the ring head, and whether one more frame can be sent.
    ///
    /// The slot must not be written unless the flag is set.
    pub fn transmit_slot(&self) -> (PhysicalAddress, bool) {
        let ready = self.send_req_avail() >= 1 && self.send.space() > 0;
        (self.send.head_slot(), ready)
    }

    /// The free send slot, if a frame can be sent right now.
    pub fn get_transmit_buffer(&mut self) -> Option<TxFrame<'_>> {
        match self.transmit_slot() {
            (slot, true) => Some(TxFrame { nic: self, slot }),
            (_, false) => None,
        }
    }

    /// Drain finished sends, then post `len` bytes at `addr` for sending.
    ///
    /// # Safety
    /// There must be room for one more frame (see [`IceNet::transmit_slot`]) and `addr` must be
    /// the head send slot holding the frame.
    pub unsafe fn transmit(&mut self, addr: PhysicalAddress, len: usize) {
        self.complete_send();
        self.regs.post_send(addr, len);
        self.send.push();
        trace!("Posted {} bytes frame at {}", len, addr);
    }

    /// Acknowledge every finished send and release its slot. Return how many.
    pub fn complete_send(&mut self) -> usize {
        let count = self.send_comp_avail();
        for _ in 0..count {
            self.regs.pop_send_completion();
            if self.send.pop().is_none() {
                error!("Send completion with no frame in flight");
            }
        }
        count
    }

    /// Take one received frame, if there is one. Finished sends are drained first.
    pub fn receive(&mut self) -> Option<RxFrame<'_>> {
        self.complete_send();

        if self.recv_comp_avail() == 0 {
            return None;
        }
        let len = self.regs.pop_recv_completion() as usize;
        let Some(slot) = self.recv.pop() else {
            error!("Receive completion with no slot posted");
            return None;
        };
        if len > MAX_FRAME_SIZE {
            warn!("Received {} bytes frame, truncated to {}", len, MAX_FRAME_SIZE);
        }
        Some(RxFrame {
            slot,
            len,
            _nic: PhantomData,
        })
    }

    pub fn mac_address(&self) -> [u8; 6] {
        let raw = self.regs.mac_address().to_le_bytes();
        let mut mac = [0; 6];
        mac.copy_from_slice(&raw[..6]);
        mac
    }

    pub fn intmask(&self) -> IntMask {
        self.regs.intmask()
    }

    pub fn set_intmask(&self, mask: IntMask) {
        self.regs.set_intmask(self.regs.intmask() | mask);
    }

    pub fn clear_intmask(&self, mask: IntMask) {
        self.regs.set_intmask(self.regs.intmask() - mask);
    }
}

use bitflags::bitflags;
use bsp::{memory::PhysicalAddress, mmio::RegisterWindow};
use tock_registers::{register_bitfields, LocalRegisterCopy};

pub(crate) const SEND_COMP: usize = 16;
pub(crate) const RECV_COMP: usize = 18;
pub(crate) const COUNTS: usize = 20;
pub(crate) const MACADDR: usize = 24;
pub(crate) const INTMASK: usize = 32;
pub(crate) const SHADOW_SEND_REQ: usize = 64;
pub(crate) const SHADOW_RECV_REQ: usize = 72;

// queue depths, one byte each
register_bitfields![
    u32,

    pub Counts [
        RECV_COMP OFFSET(24) NUMBITS(8) [],
        SEND_COMP OFFSET(16) NUMBITS(8) [],
        RECV_REQ OFFSET(8) NUMBITS(8) [],
        SEND_REQ OFFSET(0) NUMBITS(8) [],
    ]
];

register_bitfields![
    u64,

    pub SendRequest [
        LEN OFFSET(48) NUMBITS(16) [],
        ADDR OFFSET(0) NUMBITS(48) [],
    ]
];

bitflags! {
    pub struct IntMask: u32 {
        const TX = 1;
        const RX = 2;
    }
}

/// Register window of an IceNet controller.
#[derive(Debug, Clone, Copy)]
pub struct Registers(RegisterWindow);

impl Registers {
    pub const fn new(window: RegisterWindow) -> Self {
        Self(window)
    }

    #[inline]
    pub fn counts(&self) -> LocalRegisterCopy<u32, Counts::Register> {
        LocalRegisterCopy::new(self.0.read32(COUNTS))
    }

    #[inline]
    pub fn post_send(&self, addr: PhysicalAddress, len: usize) {
        let descriptor =
            SendRequest::LEN.val(len as u64) + SendRequest::ADDR.val(addr.addr() as u64);
        self.0.write64(SHADOW_SEND_REQ, descriptor.value);
    }

    #[inline]
    pub fn post_recv(&self, addr: PhysicalAddress) {
        self.0.write64(SHADOW_RECV_REQ, addr.addr() as u64);
    }

    /// Acknowledge one finished send.
    #[inline]
    pub fn pop_send_completion(&self) -> u16 {
        self.0.read16(SEND_COMP)
    }

    /// Acknowledge one received frame and return its length.
    #[inline]
    pub fn pop_recv_completion(&self) -> u16 {
        self.0.read16(RECV_COMP)
    }

    #[inline]
    pub fn mac_address(&self) -> u64 {
        self.0.read64(MACADDR)
    }

    #[inline]
    pub fn intmask(&self) -> IntMask {
        IntMask::from_bits_truncate(self.0.read32(INTMASK))
    }

    #[inline]
    pub fn set_intmask(&self, mask: IntMask) {
        self.0.write32(INTMASK, mask.bits());
    }
}

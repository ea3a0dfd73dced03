use bsp::mmio::RegisterWindow;

pub(crate) const ADDR: usize = 0;
pub(crate) const OFFSET: usize = 8;
pub(crate) const LEN: usize = 12;
pub(crate) const WRITE: usize = 16;
pub(crate) const REQUEST: usize = 17;
pub(crate) const NREQUEST: usize = 18;
pub(crate) const COMPLETE: usize = 19;
pub(crate) const NCOMPLETE: usize = 20;
pub(crate) const NSECTORS: usize = 24;
pub(crate) const MAX_REQUEST_LENGTH: usize = 28;

/// Register window of an IceBlk controller.
#[derive(Debug, Clone, Copy)]
pub struct Registers(RegisterWindow);

impl Registers {
    pub const fn new(window: RegisterWindow) -> Self {
        Self(window)
    }

    /// DMA address of the next request. Low word first.
    #[inline]
    pub fn set_addr(&self, addr: u64) {
        self.0.write64(ADDR, addr);
    }

    #[inline]
    pub fn set_offset(&self, sector: u32) {
        self.0.write32(OFFSET, sector);
    }

    #[inline]
    pub fn set_len(&self, count: u32) {
        self.0.write32(LEN, count);
    }

    #[inline]
    pub fn set_write(&self, write: bool) {
        self.0.write8(WRITE, write as u8);
    }

    /// Issue the request described by the other registers and return its tag.
    #[inline]
    pub fn issue(&self) -> u8 {
        self.0.read8(REQUEST)
    }

    /// How many more requests the controller accepts.
    #[inline]
    pub fn request_slots(&self) -> u8 {
        self.0.read8(NREQUEST)
    }

    /// Pop the tag of a completed request. Acknowledges it.
    #[inline]
    pub fn pop_completion(&self) -> u8 {
        self.0.read8(COMPLETE)
    }

    #[inline]
    pub fn completions(&self) -> u8 {
        self.0.read8(NCOMPLETE)
    }

    #[inline]
    pub fn sector_count(&self) -> u32 {
        self.0.read32(NSECTORS)
    }

    #[inline]
    pub fn max_request_length(&self) -> u32 {
        self.0.read32(MAX_REQUEST_LENGTH)
    }
}

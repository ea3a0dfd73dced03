use bsp::disks::SECTOR_SIZE;

/// One transfer of whole sectors between a caller buffer and the disk.
#[derive(Debug)]
pub enum Request<'a> {
    Read {
        buff: &'a mut [u8],
        sector: u32,
        count: u32,
    },
    Write {
        buff: &'a [u8],
        sector: u32,
        count: u32,
    },
}

impl Request<'_> {
    #[inline]
    pub fn sector(&self) -> u32 {
        match self {
            Self::Read { sector, .. } | Self::Write { sector, .. } => *sector,
        }
    }

    #[inline]
    pub fn count(&self) -> u32 {
        match self {
            Self::Read { count, .. } | Self::Write { count, .. } => *count,
        }
    }

    #[inline]
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }

    /// Bytes moved by the request.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.count() as usize * SECTOR_SIZE
    }

    #[inline]
    pub fn buffer_len(&self) -> usize {
        match self {
            Self::Read { buff, .. } => buff.len(),
            Self::Write { buff, .. } => buff.len(),
        }
    }
}

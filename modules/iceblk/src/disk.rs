use bsp::{
    disks::{DiskError, DiskIo, DiskStatus},
    error::DeviceError,
};

use crate::{device::IceBlk, request::Request};

fn disk_error(err: DeviceError) -> DiskError {
    match err {
        DeviceError::QueueNotRunning => DiskError::Device,
        DeviceError::Timeout | DeviceError::NoDisk => DiskError::NotReady,
    }
}

impl DiskIo for IceBlk {
    fn status(&self) -> DiskStatus {
        if self.is_present() {
            DiskStatus::Ready
        } else {
            DiskStatus::NoDisk
        }
    }

    fn read(&self, buff: &mut [u8], sector: u32, count: u32) -> Result<(), DiskError> {
        self.queue_request(Request::Read {
            buff,
            sector,
            count,
        })
        .map_err(disk_error)
    }

    fn write(&self, buff: &[u8], sector: u32, count: u32) -> Result<(), DiskError> {
        self.queue_request(Request::Write {
            buff,
            sector,
            count,
        })
        .map_err(disk_error)
    }
}

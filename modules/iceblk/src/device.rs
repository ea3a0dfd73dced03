use core::{
    sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering},
    time::Duration,
};

use bsp::{
    disks::{DiskStatus, SECTOR_SIZE},
    error::{DeviceError, Error},
    interrupts::{InterruptController, InterruptHandler},
    memory::PhysicalAddress,
    mmio::RegisterWindow,
    rtos::Rtos,
    sync::{self, CriticalSection, Notification},
};
use log::{info, trace, warn};
use spin::{lock_api::Mutex, Once};
use static_assertions::const_assert_eq;

use crate::{regs::Registers, request::Request};

/// Capacity of the staging buffer, in sectors.
pub const MAX_REQUEST_SECTORS: usize = 16;

const NO_WAITER: u16 = u16::MAX;

/// Word and bit of `tag` in a 256-tag bitset.
#[inline]
const fn tag_bit(tag: u16) -> (usize, u64) {
    ((tag / 64) as usize, 1 << (tag % 64))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// How long a request may stay in flight before it is given up.
    pub timeout: Duration,
    /// Pause between issuing a request and waiting for it.
    pub settle_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(500),
            settle_delay: Duration::from_millis(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub sector_count: u32,
    pub tag_count: u8,
    pub max_request_length: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    Absent,
    Ready(Geometry),
}

// the controller masters on cache-line boundaries
#[repr(C, align(64))]
struct StagingBuffer([u8; SECTOR_SIZE * MAX_REQUEST_SECTORS]);

const_assert_eq!(core::mem::align_of::<StagingBuffer>(), 64);

struct Inner {
    staging: StagingBuffer,
}

pub struct IceBlk {
    regs: Registers,
    rtos: &'static dyn Rtos,
    config: Config,
    probe: Once<Probe>,
    inner: Mutex<Inner>,
    queue_running: AtomicBool,
    /// Tag of the request a task waits for, or `NO_WAITER`.
    waiting: AtomicU16,
    /// Tags of timed out requests whose completion has not been seen yet.
    abandoned: [AtomicU64; 4],
    done: Notification,
}

impl IceBlk {
    pub fn new(regs: RegisterWindow, rtos: &'static dyn Rtos, config: Config) -> Self {
        Self {
            regs: Registers::new(regs),
            rtos,
            config,
            probe: Once::new(),
            inner: Mutex::new(Inner {
                staging: StagingBuffer([0; SECTOR_SIZE * MAX_REQUEST_SECTORS]),
            }),
            queue_running: AtomicBool::new(false),
            waiting: AtomicU16::new(NO_WAITER),
            abandoned: Default::default(),
            done: Notification::new(),
        }
    }

    /// Hook the controller's interrupt and probe the disk.
    ///
    /// Panic if the controller accepts longer requests than the staging buffer holds.
    pub fn setup(
        &'static self,
        controller: &InterruptController,
        interrupt: u32,
    ) -> Result<DiskStatus, Error> {
        controller.register_handler(interrupt, self)?;
        trace!("irq handler registered on {}", interrupt);

        let probe = self.probe.call_once(|| {
            let sector_count = self.regs.sector_count();
            if sector_count == 0 {
                info!("No disk attached");
                return Probe::Absent;
            }
            let geometry = Geometry {
                sector_count,
                tag_count: self.regs.request_slots(),
                max_request_length: self.regs.max_request_length(),
            };
            self.queue_running.store(true, Ordering::Relaxed);
            info!(
                "Disk loaded; {} sectors, {} tags, {} max request length",
                geometry.sector_count, geometry.tag_count, geometry.max_request_length
            );
            assert!(
                geometry.max_request_length as usize <= MAX_REQUEST_SECTORS,
                "Controller max request length {} above staging capacity {}",
                geometry.max_request_length,
                MAX_REQUEST_SECTORS
            );
            Probe::Ready(geometry)
        });

        Ok(match probe {
            Probe::Absent => DiskStatus::NoDisk,
            Probe::Ready(_) => DiskStatus::Ready,
        })
    }

    /// `None` until setup ran, or if no disk is attached.
    pub fn geometry(&self) -> Option<Geometry> {
        match self.probe.get() {
            Some(Probe::Ready(geometry)) => Some(*geometry),
            _ => None,
        }
    }

    #[inline]
    pub fn is_probed(&self) -> bool {
        self.probe.is_completed()
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        self.geometry().is_some()
    }

    /// Whether the controller accepted requests the last time it was asked.
    #[inline]
    pub fn queue_running(&self) -> bool {
        self.queue_running.load(Ordering::Relaxed)
    }

    /// Requests given up on whose completion is still expected.
    #[inline]
    pub fn abandoned_requests(&self) -> usize {
        self.abandoned
            .iter()
            .map(|word| word.load(Ordering::Acquire).count_ones() as usize)
            .sum()
    }

    fn abandon(&self, tag: u16) {
        let (word, bit) = tag_bit(tag);
        self.abandoned[word].fetch_or(bit, Ordering::AcqRel);
    }

    /// Forget `tag` if it was abandoned. Return whether it was.
    fn reclaim(&self, tag: u16) -> bool {
        let (word, bit) = tag_bit(tag);
        self.abandoned[word].fetch_and(!bit, Ordering::AcqRel) & bit != 0
    }

    /// Run `request` to completion. Requests to one device are served one at a time.
    ///
    /// Panic if the request is longer than the controller accepts or than its buffer.
    pub fn queue_request(&self, request: Request<'_>) -> Result<(), DeviceError> {
        let geometry = self.geometry().ok_or(DeviceError::NoDisk)?;
        assert!(
            request.count() <= geometry.max_request_length,
            "Request of {} sectors, at most {} supported",
            request.count(),
            geometry.max_request_length
        );
        let len = request.byte_len();
        assert!(
            request.buffer_len() >= len,
            "Buffer of {} bytes for a {} bytes request",
            request.buffer_len(),
            len
        );
        if len == 0 {
            return Ok(());
        }

        let mut inner = sync::lock(&self.inner, self.rtos);

        if let Request::Write { buff, .. } = &request {
            inner.staging.0[..len].copy_from_slice(&buff[..len]);
        }

        if self.regs.request_slots() == 0 {
            self.queue_running.store(false, Ordering::Relaxed);
            warn!("Queue not running, abort request");
            return Err(DeviceError::QueueNotRunning);
        }
        self.queue_running.store(true, Ordering::Relaxed);

        // a completion signaled after its waiter gave up must not satisfy this request
        self.done.clear();

        let staging = PhysicalAddress::from_ptr(inner.staging.0.as_ptr());
        let tag = {
            let _section = CriticalSection::enter(self.rtos);
            self.regs.set_addr(staging.addr() as u64);
            self.regs.set_offset(request.sector());
            self.regs.set_len(request.count());
            self.regs.set_write(request.is_write());
            let tag = self.regs.issue() as u16;
            self.waiting.store(tag, Ordering::Release);
            tag
        };
        trace!(
            "Issued tag {}: {} {} sectors at {}",
            tag,
            if request.is_write() { "write" } else { "read" },
            request.count(),
            request.sector()
        );

        self.rtos.sleep(self.config.settle_delay);

        let completed = self.done.wait_timeout(self.rtos, self.config.timeout) || {
            let _section = CriticalSection::enter(self.rtos);
            match self
                .waiting
                .compare_exchange(tag, NO_WAITER, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    self.abandon(tag);
                    false
                }
                // completed right at the deadline
                Err(_) => {
                    self.done.clear();
                    true
                }
            }
        };

        if !completed {
            warn!("Request with tag {} timed out", tag);
            return Err(DeviceError::Timeout);
        }

        if let Request::Read { buff, .. } = request {
            buff[..len].copy_from_slice(&inner.staging.0[..len]);
        }
        Ok(())
    }

    pub fn read(&self, buff: &mut [u8], sector: u32, count: u32) -> Result<(), DeviceError> {
        self.queue_request(Request::Read {
            buff,
            sector,
            count,
        })
    }

    pub fn write(&self, buff: &[u8], sector: u32, count: u32) -> Result<(), DeviceError> {
        self.queue_request(Request::Write {
            buff,
            sector,
            count,
        })
    }
}

impl InterruptHandler for IceBlk {
    /// Drain every completion and wake the task waiting for one of them.
    ///
    /// Panic on a completion no request accounts for.
    fn handle_interrupt(&self, _interrupt: u32) {
        let count = self.regs.completions();
        for _ in 0..count {
            let tag = self.regs.pop_completion() as u16;
            if self
                .waiting
                .compare_exchange(tag, NO_WAITER, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.done.notify();
            } else if self.reclaim(tag) {
                warn!("Dropping late completion of tag {}", tag);
            } else {
                panic!("Completion of tag {} with no request waiting", tag);
            }
        }
    }
}

//! Behavioral model of the controller for host tests.

use std::collections::VecDeque;

use bsp::{
    disks::SECTOR_SIZE,
    interrupts::InterruptController,
    memory::PhysicalAddress,
    mmio::{Mmio, RegisterWindow},
    sim::{HostRtos, SimChip},
};
use spin::Mutex;

use crate::{
    device::{Config, IceBlk},
    regs::{
        ADDR, COMPLETE, LEN, MAX_REQUEST_LENGTH, NCOMPLETE, NREQUEST, NSECTORS, OFFSET, REQUEST,
        WRITE,
    },
};

pub const IRQ: u32 = 2;
const TAGS: u8 = 4;

struct State {
    disk: Vec<u8>,
    max_request_length: u32,
    addr: u64,
    offset: u32,
    len: u32,
    write: bool,
    in_flight: Vec<u8>,
    held: VecDeque<u8>,
    completions: VecDeque<u8>,
    respond: bool,
    stopped: bool,
    release_on_issue: bool,
    issued: usize,
    descriptor_writes: usize,
    max_in_flight: usize,
}

pub struct SimBlk {
    chip: &'static SimChip,
    state: Mutex<State>,
}

impl SimBlk {
    pub fn leak(
        chip: &'static SimChip,
        sector_count: u32,
        max_request_length: u32,
    ) -> &'static Self {
        Box::leak(Box::new(Self {
            chip,
            state: Mutex::new(State {
                disk: vec![0; sector_count as usize * SECTOR_SIZE],
                max_request_length,
                addr: 0,
                offset: 0,
                len: 0,
                write: false,
                in_flight: Vec::new(),
                held: VecDeque::new(),
                completions: VecDeque::new(),
                respond: true,
                stopped: false,
                release_on_issue: false,
                issued: 0,
                descriptor_writes: 0,
                max_in_flight: 0,
            }),
        }))
    }

    /// With `false`, issued requests stay in flight until [`SimBlk::release_held`].
    pub fn set_respond(&self, respond: bool) {
        self.state.lock().respond = respond;
    }

    /// Complete the held requests, without moving their data.
    pub fn release_held(&self) {
        let mut state = self.state.lock();
        self.release(&mut state);
    }

    pub fn release_held_on_next_issue(&self) {
        self.state.lock().release_on_issue = true;
    }

    pub fn stop_queue(&self) {
        self.state.lock().stopped = true;
    }

    pub fn start_queue(&self) {
        self.state.lock().stopped = false;
    }

    /// Report a completion for `tag` whether it was issued or not.
    pub fn inject_completion(&self, tag: u8) {
        self.state.lock().completions.push_back(tag);
        self.chip.raise(IRQ);
    }

    pub fn issued(&self) -> usize {
        self.state.lock().issued
    }

    pub fn descriptor_writes(&self) -> usize {
        self.state.lock().descriptor_writes
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.lock().max_in_flight
    }

    pub fn sectors(&self, sector: u32, count: u32) -> Vec<u8> {
        let start = sector as usize * SECTOR_SIZE;
        self.state.lock().disk[start..start + count as usize * SECTOR_SIZE].to_vec()
    }

    fn release(&self, state: &mut State) {
        if state.held.is_empty() {
            return;
        }
        while let Some(tag) = state.held.pop_front() {
            state.completions.push_back(tag);
        }
        self.chip.raise(IRQ);
    }

    fn issue(&self) -> u8 {
        let mut state = self.state.lock();
        let tag = (0..TAGS)
            .find(|tag| !state.in_flight.contains(tag))
            .expect("Request issued with every tag in flight");
        state.in_flight.push(tag);
        state.max_in_flight = state.max_in_flight.max(state.in_flight.len());
        state.issued += 1;

        if state.release_on_issue {
            state.release_on_issue = false;
            self.release(&mut state);
        }

        if state.respond {
            let len = state.len as usize * SECTOR_SIZE;
            let start = state.offset as usize * SECTOR_SIZE;
            let memory =
                unsafe { core::slice::from_raw_parts_mut(state.addr as usize as *mut u8, len) };
            if state.write {
                state.disk[start..start + len].copy_from_slice(memory);
            } else {
                memory.copy_from_slice(&state.disk[start..start + len]);
            }
            state.completions.push_back(tag);
            self.chip.raise(IRQ);
        } else {
            state.held.push_back(tag);
        }
        tag
    }
}

impl Mmio for SimBlk {
    unsafe fn read8(&self, addr: PhysicalAddress) -> u8 {
        match addr.addr() {
            REQUEST => self.issue(),
            NREQUEST => {
                let state = self.state.lock();
                if state.stopped {
                    0
                } else {
                    TAGS - state.in_flight.len() as u8
                }
            }
            COMPLETE => {
                let mut state = self.state.lock();
                let tag = state
                    .completions
                    .pop_front()
                    .expect("Completion register read while empty");
                state.in_flight.retain(|&t| t != tag);
                tag
            }
            NCOMPLETE => self.state.lock().completions.len() as u8,
            other => panic!("read8 at {:#x}", other),
        }
    }

    unsafe fn read16(&self, addr: PhysicalAddress) -> u16 {
        panic!("read16 at {}", addr)
    }

    unsafe fn read32(&self, addr: PhysicalAddress) -> u32 {
        let state = self.state.lock();
        match addr.addr() {
            NSECTORS => (state.disk.len() / SECTOR_SIZE) as u32,
            MAX_REQUEST_LENGTH => state.max_request_length,
            other => panic!("read32 at {:#x}", other),
        }
    }

    unsafe fn read64(&self, addr: PhysicalAddress) -> u64 {
        panic!("read64 at {}", addr)
    }

    unsafe fn write8(&self, addr: PhysicalAddress, value: u8) {
        let mut state = self.state.lock();
        assert_eq!(addr.addr(), WRITE);
        state.write = value != 0;
        state.descriptor_writes += 1;
    }

    unsafe fn write16(&self, addr: PhysicalAddress, _: u16) {
        panic!("write16 at {}", addr)
    }

    unsafe fn write32(&self, addr: PhysicalAddress, value: u32) {
        let mut state = self.state.lock();
        state.descriptor_writes += 1;
        match addr.addr() {
            ADDR => state.addr = (state.addr & !0xFFFF_FFFF) | value as u64,
            a if a == ADDR + 4 => state.addr = (state.addr & 0xFFFF_FFFF) | (value as u64) << 32,
            OFFSET => state.offset = value,
            LEN => state.len = value,
            other => panic!("write32 at {:#x}", other),
        }
    }
}

pub struct Rig {
    pub device: &'static IceBlk,
    pub hw: &'static SimBlk,
    pub chip: &'static SimChip,
    pub rtos: &'static HostRtos,
}

/// A probed device wired to a model controller and a host interrupt chip.
pub fn rig(sector_count: u32, max_request_length: u32, config: Config) -> Rig {
    let rtos = HostRtos::leak();
    let chip = SimChip::leak();
    let controller: &'static InterruptController =
        Box::leak(Box::new(InterruptController::new(chip)));
    rtos.set_controller(controller);

    let hw = SimBlk::leak(chip, sector_count, max_request_length);
    let regs = unsafe { RegisterWindow::new(PhysicalAddress::new(0), hw) };
    let device: &'static IceBlk = Box::leak(Box::new(IceBlk::new(regs, rtos, config)));
    device.setup(controller, IRQ).unwrap();

    Rig {
        device,
        hw,
        chip,
        rtos,
    }
}

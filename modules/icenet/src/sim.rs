//! Behavioral model of the controller for host tests.

use std::collections::VecDeque;

use bsp::{
    board::FRAME_SLOT_STRIDE,
    memory::{PhysicalAddress, Region},
    mmio::{Mmio, RegisterWindow},
};
use spin::Mutex;
use tock_registers::LocalRegisterCopy;

use crate::{
    device::{IceNet, RING_SIZE},
    regs::{
        Counts, SendRequest, COUNTS, INTMASK, MACADDR, RECV_COMP, SEND_COMP, SHADOW_RECV_REQ,
        SHADOW_SEND_REQ,
    },
};

#[derive(Default)]
struct State {
    send_req_avail: u8,
    recv_req_avail: u8,
    send_low: u32,
    recv_low: u32,
    sends: Vec<u64>,
    sending: VecDeque<u64>,
    send_completions: usize,
    recvs: Vec<u64>,
    free_recvs: VecDeque<u64>,
    recv_completions: VecDeque<u16>,
    mac: u64,
    intmask: u32,
}

pub struct SimNet {
    state: Mutex<State>,
}

impl SimNet {
    pub fn leak(send_req_avail: u8, recv_req_avail: u8) -> &'static Self {
        Box::leak(Box::new(Self {
            state: Mutex::new(State {
                send_req_avail,
                recv_req_avail,
                ..Default::default()
            }),
        }))
    }

    pub fn set_mac(&self, mac: u64) {
        self.state.lock().mac = mac;
    }

    pub fn set_recv_req_avail(&self, count: u8) {
        self.state.lock().recv_req_avail = count;
    }

    pub fn send_req_avail(&self) -> usize {
        self.state.lock().send_req_avail as usize
    }

    pub fn recv_req_avail(&self) -> usize {
        self.state.lock().recv_req_avail as usize
    }

    pub fn send_comp_avail(&self) -> usize {
        self.state.lock().send_completions
    }

    pub fn recv_comp_avail(&self) -> usize {
        self.state.lock().recv_completions.len()
    }

    /// Every send descriptor posted so far.
    pub fn posted_sends(&self) -> Vec<u64> {
        self.state.lock().sends.clone()
    }

    /// Every receive address posted so far.
    pub fn posted_recvs(&self) -> Vec<u64> {
        self.state.lock().recvs.clone()
    }

    /// The first `len` bytes of the frame sent by descriptor `index`.
    pub fn sent_payload(&self, index: usize, len: usize) -> Vec<u8> {
        let descriptor = self.state.lock().sends[index];
        let addr = LocalRegisterCopy::<u64, SendRequest::Register>::new(descriptor)
            .read(SendRequest::ADDR);
        unsafe { std::slice::from_raw_parts(addr as usize as *const u8, len) }.to_vec()
    }

    /// Finish the `count` oldest sends in flight.
    pub fn complete_sends(&self, count: usize) {
        let mut state = self.state.lock();
        for _ in 0..count {
            state
                .sending
                .pop_front()
                .expect("Send completed with nothing in flight");
            state.send_req_avail += 1;
            state.send_completions += 1;
        }
    }

    /// Report `count` send completions with no matching send.
    pub fn inject_send_completions(&self, count: usize) {
        self.state.lock().send_completions += count;
    }

    /// Write `frame` into the oldest posted receive slot.
    pub fn deliver(&self, frame: &[u8]) {
        let mut state = self.state.lock();
        let addr = state
            .free_recvs
            .pop_front()
            .expect("Frame delivered with no receive slot posted");
        unsafe {
            std::slice::from_raw_parts_mut(addr as usize as *mut u8, frame.len())
                .copy_from_slice(frame)
        };
        state.recv_completions.push_back(frame.len() as u16);
    }
}

impl Mmio for SimNet {
    unsafe fn read8(&self, addr: PhysicalAddress) -> u8 {
        panic!("read8 at {}", addr)
    }

    unsafe fn read16(&self, addr: PhysicalAddress) -> u16 {
        let mut state = self.state.lock();
        match addr.addr() {
            SEND_COMP => {
                assert!(state.send_completions > 0, "Send completion read while empty");
                state.send_completions -= 1;
                0
            }
            RECV_COMP => state
                .recv_completions
                .pop_front()
                .expect("Receive completion read while empty"),
            other => panic!("read16 at {:#x}", other),
        }
    }

    unsafe fn read32(&self, addr: PhysicalAddress) -> u32 {
        let state = self.state.lock();
        match addr.addr() {
            COUNTS => {
                let counts = Counts::SEND_REQ.val(state.send_req_avail as u32)
                    + Counts::RECV_REQ.val(state.recv_req_avail as u32)
                    + Counts::SEND_COMP.val(state.send_completions.min(0xFF) as u32)
                    + Counts::RECV_COMP.val(state.recv_completions.len().min(0xFF) as u32);
                counts.value
            }
            INTMASK => state.intmask,
            other => panic!("read32 at {:#x}", other),
        }
    }

    unsafe fn read64(&self, addr: PhysicalAddress) -> u64 {
        assert_eq!(addr.addr(), MACADDR);
        self.state.lock().mac
    }

    unsafe fn write8(&self, addr: PhysicalAddress, _: u8) {
        panic!("write8 at {}", addr)
    }

    unsafe fn write16(&self, addr: PhysicalAddress, _: u16) {
        panic!("write16 at {}", addr)
    }

    // 64-bit requests are taken when their high word lands
    unsafe fn write32(&self, addr: PhysicalAddress, value: u32) {
        let mut state = self.state.lock();
        match addr.addr() {
            INTMASK => state.intmask = value,
            SHADOW_SEND_REQ => state.send_low = value,
            SHADOW_RECV_REQ => state.recv_low = value,
            a if a == SHADOW_SEND_REQ + 4 => {
                assert!(state.send_req_avail > 0, "Send posted with a full queue");
                let descriptor = (value as u64) << 32 | state.send_low as u64;
                state.send_req_avail -= 1;
                state.sends.push(descriptor);
                state.sending.push_back(descriptor);
            }
            a if a == SHADOW_RECV_REQ + 4 => {
                assert!(state.recv_req_avail > 0, "Receive posted with a full queue");
                let addr = (value as u64) << 32 | state.recv_low as u64;
                state.recv_req_avail -= 1;
                state.recvs.push(addr);
                state.free_recvs.push_back(addr);
            }
            other => panic!("write32 at {:#x}", other),
        }
    }
}

/// Leaked, zeroed frame slots.
pub fn frames() -> Region {
    let memory: &'static mut [u64] =
        Box::leak(vec![0u64; RING_SIZE * FRAME_SLOT_STRIDE / 8].into_boxed_slice());
    Region::new(
        PhysicalAddress::from_ptr(memory.as_mut_ptr()),
        FRAME_SLOT_STRIDE,
        RING_SIZE,
    )
}

pub struct Rig {
    pub nic: IceNet,
    pub hw: &'static SimNet,
    pub tx: Region,
    pub rx: Region,
}

/// A device over a model controller that takes `send_req` sends and `recv_req` receive slots.
pub fn rig(send_req: u8, recv_req: u8) -> Rig {
    let hw = SimNet::leak(send_req, recv_req);
    let regs = unsafe { RegisterWindow::new(PhysicalAddress::new(0), hw) };
    let (tx, rx) = (frames(), frames());
    let nic = unsafe { IceNet::new(regs, tx, rx) }.unwrap();
    Rig { nic, hw, tx, rx }
}

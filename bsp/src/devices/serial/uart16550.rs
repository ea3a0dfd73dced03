use core::fmt::Write;

use tock_registers::{register_bitfields, LocalRegisterCopy};

use super::SerialPort;
use crate::mmio::RegisterWindow;

const QUEUE: usize = 0;
const INTERRUPT_ENABLE: usize = 1;
const FIFO_CONTROL: usize = 2;
const LINE_CONTROL: usize = 3;
const LINE_STATUS: usize = 5;

register_bitfields![
    u8,

    LineControl [
        DLAB OFFSET(7) NUMBITS(1) [],
        WORD_LENGTH OFFSET(0) NUMBITS(2) [
            Bits8 = 0b11
        ],
    ],

    LineStatus [
        THR_EMPTY OFFSET(5) NUMBITS(1) [],
        DATA_READY OFFSET(0) NUMBITS(1) [],
    ]
];

// enable and clear both FIFOs, 14-byte trigger
const FIFO_SETUP: u8 = 0xC7;

/// Distance between two consecutive registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterStride {
    /// Byte registers, byte accesses.
    Byte,
    /// One register per 32-bit word, word accesses.
    Word,
}

/// NS16550-compatible UART, polled.
#[derive(Debug)]
pub struct Uart16550 {
    regs: RegisterWindow,
    stride: RegisterStride,
}

impl Uart16550 {
    pub const fn new(regs: RegisterWindow, stride: RegisterStride) -> Self {
        Self { regs, stride }
    }

    /// 8N1, FIFOs on, interrupts off, baud divisor from the peripheral clock.
    ///
    /// Panic if `baud` is zero.
    pub fn init(&mut self, clock_hz: u32, baud: u32) {
        assert!(baud != 0, "Zero baud rate");
        let divisor = clock_hz / (16 * baud);
        self.write_reg(INTERRUPT_ENABLE, 0);
        self.write_reg(LINE_CONTROL, LineControl::DLAB::SET.value);
        self.write_reg(QUEUE, divisor as u8);
        self.write_reg(INTERRUPT_ENABLE, (divisor >> 8) as u8);
        self.write_reg(LINE_CONTROL, LineControl::WORD_LENGTH::Bits8.value);
        self.write_reg(FIFO_CONTROL, FIFO_SETUP);
    }

    #[inline]
    fn line_status(&self) -> LocalRegisterCopy<u8, LineStatus::Register> {
        LocalRegisterCopy::new(self.read_reg(LINE_STATUS))
    }

    fn read_reg(&self, reg: usize) -> u8 {
        match self.stride {
            RegisterStride::Byte => self.regs.read8(reg),
            RegisterStride::Word => self.regs.read32(reg * 4) as u8,
        }
    }

    fn write_reg(&self, reg: usize, value: u8) {
        match self.stride {
            RegisterStride::Byte => self.regs.write8(reg, value),
            RegisterStride::Word => self.regs.write32(reg * 4, value as u32),
        }
    }
}

impl SerialPort for Uart16550 {
    fn put(&mut self, byte: u8) {
        while !self.line_status().is_set(LineStatus::THR_EMPTY) {
            core::hint::spin_loop();
        }
        self.write_reg(QUEUE, byte);
    }

    fn get(&mut self) -> Option<u8> {
        if self.line_status().is_set(LineStatus::DATA_READY) {
            Some(self.read_reg(QUEUE))
        } else {
            None
        }
    }
}

impl Write for Uart16550 {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for b in s.bytes() {
            self.put(b);
            if b == b'\n' {
                self.put(b'\r');
            }
        }
        Ok(())
    }
}

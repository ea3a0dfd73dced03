use core::fmt::Write;

use tock_registers::{register_bitfields, LocalRegisterCopy};

use super::SerialPort;
use crate::mmio::RegisterWindow;

const TXDATA: usize = 0x00;
const RXDATA: usize = 0x04;
const TXCTRL: usize = 0x08;
const RXCTRL: usize = 0x0C;
const DIV: usize = 0x18;

register_bitfields![
    u32,

    TxData [
        FULL OFFSET(31) NUMBITS(1) [],
        DATA OFFSET(0) NUMBITS(8) [],
    ],

    RxData [
        EMPTY OFFSET(31) NUMBITS(1) [],
        DATA OFFSET(0) NUMBITS(8) [],
    ],

    Control [
        ENABLE OFFSET(0) NUMBITS(1) [],
    ]
];

/// Divisor giving the 3686400 baud link FireSim expects from a 100 MHz bus.
pub const FIRESIM_DIVISOR: u32 = 27;

/// SiFive UART, polled.
#[derive(Debug)]
pub struct SifiveUart {
    regs: RegisterWindow,
}

impl SifiveUart {
    pub const fn new(regs: RegisterWindow) -> Self {
        Self { regs }
    }

    pub fn init(&mut self, divisor: u32) {
        self.regs.write32(TXCTRL, Control::ENABLE::SET.value);
        self.regs.write32(DIV, divisor);
        self.regs.write32(RXCTRL, Control::ENABLE::SET.value);
    }
}

impl SerialPort for SifiveUart {
    fn put(&mut self, byte: u8) {
        loop {
            let tx: LocalRegisterCopy<u32, TxData::Register> =
                LocalRegisterCopy::new(self.regs.read32(TXDATA));
            if !tx.is_set(TxData::FULL) {
                break;
            }
            core::hint::spin_loop();
        }
        self.regs.write32(TXDATA, TxData::DATA.val(byte as u32).value);
    }

    fn get(&mut self) -> Option<u8> {
        let rx: LocalRegisterCopy<u32, RxData::Register> =
            LocalRegisterCopy::new(self.regs.read32(RXDATA));
        if rx.is_set(RxData::EMPTY) {
            None
        } else {
            Some(rx.read(RxData::DATA) as u8)
        }
    }
}

impl Write for SifiveUart {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        s.bytes().for_each(|b| self.put(b));
        Ok(())
    }
}

mod uart16550;
mod uart_sifive;

pub use uart16550::{RegisterStride, Uart16550};
pub use uart_sifive::SifiveUart;

/// Polled byte-oriented console port.
pub trait SerialPort: Send {
    /// Block until the transmitter accepts `byte`.
    fn put(&mut self, byte: u8);

    /// Return a received byte, if there is one.
    fn get(&mut self) -> Option<u8>;

    /// Read exactly `buff.len()` bytes, spinning until each arrives.
    fn read_blocking(&mut self, buff: &mut [u8]) {
        for b in buff {
            *b = loop {
                if let Some(byte) = self.get() {
                    break byte;
                }
                core::hint::spin_loop();
            };
        }
    }
}

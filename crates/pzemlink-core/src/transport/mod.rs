//! Byte transports the driver talks through.
//!
//! The core never opens or configures a serial line. Anything that can
//! write bytes and hand back received bytes one at a time, without
//! blocking, can carry the protocol.

mod emulator;
mod memory;

pub use emulator::{EmulatedMeter, Fault};
pub use memory::MemoryTransport;

use thiserror::Error;

pub trait Transport {
    /// Emit `bytes` in order. No acknowledgement is awaited.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
    /// Number of bytes that can be read right now without blocking.
    fn available(&mut self) -> Result<usize, TransportError>;
    /// Read one byte. Only called after `available` reported at least one.
    fn read_byte(&mut self) -> Result<u8, TransportError>;
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no byte available to read")]
    Empty,
    #[error("transport disconnected")]
    Disconnected,
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }

    fn available(&mut self) -> Result<usize, TransportError> {
        (**self).available()
    }

    fn read_byte(&mut self) -> Result<u8, TransportError> {
        (**self).read_byte()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }

    fn available(&mut self) -> Result<usize, TransportError> {
        (**self).available()
    }

    fn read_byte(&mut self) -> Result<u8, TransportError> {
        (**self).read_byte()
    }
}

//! Serial-port transport for real meters.

use std::io::{self, ErrorKind, Read, Write};
use std::time::Duration;

use pzemlink_core::{Transport, TransportError};
use serialport::{DataBits, Parity, SerialPort, StopBits};

/// Per-call I/O timeout of the port itself. Reads only happen after
/// `bytes_to_read` reported data, so this never bounds the response wait.
const PORT_IO_TIMEOUT: Duration = Duration::from_millis(50);

pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open `path` as 8N1 at `baud_rate`.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, serialport::Error> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(PORT_IO_TIMEOUT)
            .open()?;
        tracing::info!(port = path, baud_rate, "serial port opened");
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(bytes).map_err(classify)?;
        self.port.flush().map_err(classify)?;
        Ok(())
    }

    fn available(&mut self) -> Result<usize, TransportError> {
        let pending = self
            .port
            .bytes_to_read()
            .map_err(|err| classify(io::Error::from(err)))?;
        Ok(pending as usize)
    }

    fn read_byte(&mut self) -> Result<u8, TransportError> {
        let mut byte = [0u8; 1];
        self.port.read_exact(&mut byte).map_err(classify)?;
        Ok(byte[0])
    }
}

/// An unplugged USB adapter shows up as EOF or a broken pipe.
fn classify(err: io::Error) -> TransportError {
    match err.kind() {
        ErrorKind::UnexpectedEof | ErrorKind::BrokenPipe | ErrorKind::NotConnected => {
            TransportError::Disconnected
        }
        _ => TransportError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, ErrorKind};

    use pzemlink_core::TransportError;

    use super::classify;

    #[test]
    fn unplugged_port_is_disconnected() {
        for kind in [
            ErrorKind::UnexpectedEof,
            ErrorKind::BrokenPipe,
            ErrorKind::NotConnected,
        ] {
            assert!(matches!(
                classify(io::Error::from(kind)),
                TransportError::Disconnected
            ));
        }
    }

    #[test]
    fn other_failures_stay_io() {
        let err = classify(io::Error::from(ErrorKind::PermissionDenied));
        assert!(matches!(err, TransportError::Io(_)));
    }
}

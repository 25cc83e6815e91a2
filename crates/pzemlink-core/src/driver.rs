//! Request/response driver for one serial bus.
//!
//! Each operation writes one command frame and then polls the transport
//! until a full response has arrived or the timeout has elapsed. Every
//! method takes `&mut self`, so at most one request can be in flight per
//! driver; callers sharing a bus between several meters serialize requests
//! themselves.

use std::time::Duration;

use tracing::{debug, trace};

use crate::clock::{Clock, MonotonicClock};
use crate::error::PzemError;
use crate::protocol::layout::{RESPONSE_FRAME_LEN, STARTUP_ARTIFACT};
use crate::protocol::{
    Command, CommandFrame, DeviceAddress, Quantity, ResponseFrame, decode_ack, decode_quantity,
    encode_command, parse_response,
};
use crate::transport::Transport;
use crate::{DEFAULT_TIMEOUT, Reading};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PzemConfig {
    /// Upper bound on the wait for a complete response.
    pub timeout: Duration,
}

impl Default for PzemConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Driver owning one transport and the clock bounding its reads.
pub struct Pzem<T, C = MonotonicClock> {
    transport: T,
    clock: C,
    config: PzemConfig,
}

impl<T: Transport> Pzem<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, MonotonicClock::new(), PzemConfig::default())
    }
}

impl<T: Transport, C: Clock> Pzem<T, C> {
    pub fn with_config(transport: T, clock: C, config: PzemConfig) -> Self {
        Self {
            transport,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &PzemConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn write_frame(&mut self, frame: &CommandFrame) -> Result<(), PzemError> {
        let bytes = frame.to_bytes();
        debug!(
            command = %frame.command,
            address = %frame.address,
            bytes = ?bytes,
            "sending command"
        );
        self.transport.write(&bytes)?;
        Ok(())
    }

    /// Collect one response frame and validate it against `expected_tag`.
    ///
    /// The very first byte received is dropped if it is zero: meters and bus
    /// transceivers emit one spurious zero at power-up. The guard fires once
    /// per call, so a second zero is taken as frame data.
    ///
    /// # Errors
    /// `Timeout` when nothing arrived, `Framing` when only part of a frame
    /// arrived, then `Checksum` or `TagMismatch` for a complete but invalid
    /// frame. Transport failures abort the read immediately.
    pub fn read_response(
        &mut self,
        expected_tag: u8,
        timeout: Duration,
    ) -> Result<ResponseFrame, PzemError> {
        let timeout_ms = timeout_to_ms(timeout);
        let mut buffer = [0u8; RESPONSE_FRAME_LEN];
        let mut len = 0usize;
        let mut first_byte = true;

        let start = self.clock.now_ms();
        while len < RESPONSE_FRAME_LEN && self.clock.now_ms().saturating_sub(start) < timeout_ms {
            if self.transport.available()? == 0 {
                std::hint::spin_loop();
                continue;
            }
            let byte = self.transport.read_byte()?;
            if first_byte && byte == STARTUP_ARTIFACT {
                first_byte = false;
                trace!("discarded leading zero byte");
                continue;
            }
            first_byte = false;
            buffer[len] = byte;
            len += 1;
        }

        if len == 0 {
            debug!(timeout_ms, "no response");
            return Err(PzemError::Timeout { timeout_ms });
        }
        if len != RESPONSE_FRAME_LEN {
            debug!(received = len, "incomplete response");
            return Err(PzemError::Framing {
                received: len,
                expected: RESPONSE_FRAME_LEN,
            });
        }

        let frame = parse_response(&buffer, expected_tag).inspect_err(|err| {
            debug!(error = %err, bytes = ?buffer, "rejected response");
        })?;
        debug!(tag = frame.tag, data = ?frame.data, "received response");
        Ok(frame)
    }

    /// Drop whatever an earlier exchange left unread, so it cannot be taken
    /// as the start of the next response.
    fn discard_pending(&mut self) -> Result<usize, PzemError> {
        let mut discarded = 0usize;
        while self.transport.available()? > 0 {
            let byte = self.transport.read_byte()?;
            trace!(byte, "discarded stale byte");
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded, "cleared stale input before request");
        }
        Ok(discarded)
    }

    fn request(&mut self, frame: CommandFrame) -> Result<ResponseFrame, PzemError> {
        self.discard_pending()?;
        self.write_frame(&frame)?;
        let timeout = self.config.timeout;
        self.read_response(frame.command.response_tag(), timeout)
    }

    pub fn read(&mut self, quantity: Quantity, address: DeviceAddress) -> Result<f64, PzemError> {
        let response = self.request(encode_command(quantity.command(), address, 0))?;
        Ok(decode_quantity(quantity, &response.data))
    }

    /// Line voltage in volts, 0.1 V resolution.
    pub fn voltage(&mut self, address: DeviceAddress) -> Result<f64, PzemError> {
        self.read(Quantity::Voltage, address)
    }

    /// Line current in amps, 0.01 A resolution.
    pub fn current(&mut self, address: DeviceAddress) -> Result<f64, PzemError> {
        self.read(Quantity::Current, address)
    }

    /// Active power in whole watts.
    pub fn power(&mut self, address: DeviceAddress) -> Result<f64, PzemError> {
        self.read(Quantity::Power, address)
    }

    /// Accumulated energy in whole watt-hours.
    pub fn energy(&mut self, address: DeviceAddress) -> Result<f64, PzemError> {
        self.read(Quantity::Energy, address)
    }

    /// Read all four measurements in turn. The first failure is returned.
    pub fn read_all(&mut self, address: DeviceAddress) -> Result<Reading, PzemError> {
        Ok(Reading {
            voltage: self.voltage(address)?,
            current: self.current(address)?,
            power: self.power(address)?,
            energy: self.energy(address)?,
        })
    }

    /// Assign `new_address` to the meter listening on the bus.
    ///
    /// A checksum-valid reply with the set-address tag is the acknowledgement;
    /// `Ok(true)` reports it.
    pub fn set_address(&mut self, new_address: DeviceAddress) -> Result<bool, PzemError> {
        let response = self.request(encode_command(Command::SetAddress, new_address, 0))?;
        Ok(decode_ack(&response.data))
    }

    /// Set the power alarm threshold of the meter at `address`.
    pub fn set_power_alarm(
        &mut self,
        address: DeviceAddress,
        threshold: u8,
    ) -> Result<bool, PzemError> {
        let response = self.request(encode_command(Command::PowerAlarm, address, threshold))?;
        Ok(decode_ack(&response.data))
    }
}

/// Whole milliseconds, rounded up so a sub-millisecond timeout still polls.
fn timeout_to_ms(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}

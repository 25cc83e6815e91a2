use std::collections::VecDeque;

use tracing::{debug, trace};

use super::{Transport, TransportError};
use crate::Reading;
use crate::protocol::layout::{COMMAND_FRAME_LEN, RESPONSE_DATA_LEN, STARTUP_ARTIFACT};
use crate::protocol::{
    Command, CommandFrame, DeviceAddress, Quantity, encode_quantity, encode_response,
    parse_command,
};

/// Misbehaviour injected into the next reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Flip the low bit of the checksum byte.
    CorruptChecksum,
    /// Answer with the given tag instead of the expected one (checksum stays valid).
    WrongTag(u8),
    /// Send only the first `n` bytes of the reply.
    Truncate(usize),
    /// Do not answer at all.
    Silent,
}

/// A meter living behind a [`Transport`].
///
/// Command frames written to it are validated like real hardware would;
/// frames with a bad checksum, an unknown opcode, or another meter's address
/// get no answer. Set-address is accepted whatever the current address is,
/// since it is how a meter is given its address in the first place.
///
/// # Examples
/// ```
/// use pzemlink_core::{DeviceAddress, EmulatedMeter, Pzem, Reading};
///
/// let addr = DeviceAddress::new([192, 168, 1, 1]);
/// let meter = EmulatedMeter::new(addr, Reading::new(230.5, 1.25, 288.0, 300.0));
/// let mut pzem = Pzem::new(meter);
/// assert_eq!(pzem.voltage(addr)?, 230.5);
/// # Ok::<(), pzemlink_core::PzemError>(())
/// ```
#[derive(Debug, Clone)]
pub struct EmulatedMeter {
    address: DeviceAddress,
    reading: Reading,
    power_alarm: Option<u8>,
    leading_zero: bool,
    fault: Option<Fault>,
    received: Vec<u8>,
    outbound: VecDeque<u8>,
    commands_seen: usize,
}

impl EmulatedMeter {
    pub fn new(address: DeviceAddress, reading: Reading) -> Self {
        Self {
            address,
            reading,
            power_alarm: None,
            leading_zero: false,
            fault: None,
            received: Vec::with_capacity(COMMAND_FRAME_LEN),
            outbound: VecDeque::new(),
            commands_seen: 0,
        }
    }

    /// Prefix every reply with the startup zero byte some meters emit.
    pub fn with_leading_zero(mut self) -> Self {
        self.leading_zero = true;
        self
    }

    pub fn inject_fault(&mut self, fault: Fault) {
        self.fault = Some(fault);
    }

    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    pub fn reading(&self) -> Reading {
        self.reading
    }

    pub fn set_reading(&mut self, reading: Reading) {
        self.reading = reading;
    }

    pub fn power_alarm(&self) -> Option<u8> {
        self.power_alarm
    }

    /// Valid command frames received, answered or not.
    pub fn commands_seen(&self) -> usize {
        self.commands_seen
    }

    fn handle_frame(&mut self, bytes: &[u8]) {
        let frame = match parse_command(bytes) {
            Ok(frame) => frame,
            Err(err) => {
                debug!(error = %err, "emulated meter dropped command");
                return;
            }
        };
        self.commands_seen += 1;

        if frame.command != Command::SetAddress && frame.address != self.address {
            trace!(address = %frame.address, "command for another meter");
            return;
        }

        let data = self.execute(&frame);
        self.reply(frame.command.response_tag(), data);
    }

    fn execute(&mut self, frame: &CommandFrame) -> [u8; RESPONSE_DATA_LEN] {
        match frame.command {
            Command::SetAddress => {
                self.address = frame.address;
                [0; RESPONSE_DATA_LEN]
            }
            Command::PowerAlarm => {
                self.power_alarm = Some(frame.payload);
                [0; RESPONSE_DATA_LEN]
            }
            command => match Quantity::from_command(command) {
                Some(quantity) => encode_quantity(quantity, self.reading.get(quantity)),
                None => [0; RESPONSE_DATA_LEN],
            },
        }
    }

    fn reply(&mut self, tag: u8, data: [u8; RESPONSE_DATA_LEN]) {
        let fault = self.fault.take();
        let tag = match fault {
            Some(Fault::WrongTag(other)) => other,
            _ => tag,
        };
        let mut bytes = encode_response(tag, data).to_bytes().to_vec();
        match fault {
            Some(Fault::CorruptChecksum) => {
                if let Some(last) = bytes.last_mut() {
                    *last ^= 0x01;
                }
            }
            Some(Fault::Truncate(n)) => bytes.truncate(n),
            Some(Fault::Silent) => return,
            Some(Fault::WrongTag(_)) | None => {}
        }

        if self.leading_zero {
            self.outbound.push_back(STARTUP_ARTIFACT);
        }
        self.outbound.extend(bytes);
    }
}

impl Transport for EmulatedMeter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        for &byte in bytes {
            self.received.push(byte);
            if self.received.len() == COMMAND_FRAME_LEN {
                let frame = std::mem::take(&mut self.received);
                self.handle_frame(&frame);
            }
        }
        Ok(())
    }

    fn available(&mut self) -> Result<usize, TransportError> {
        Ok(self.outbound.len())
    }

    fn read_byte(&mut self) -> Result<u8, TransportError> {
        self.outbound.pop_front().ok_or(TransportError::Empty)
    }
}

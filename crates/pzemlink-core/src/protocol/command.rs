use std::fmt;

use super::address::DeviceAddress;
use super::checksum::checksum;
use super::error::ProtocolError;
use super::layout;
use super::reader::FrameReader;

/// Operations a meter understands, each with its own opcode and reply tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Voltage,
    Current,
    Power,
    Energy,
    SetAddress,
    PowerAlarm,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Voltage,
        Command::Current,
        Command::Power,
        Command::Energy,
        Command::SetAddress,
        Command::PowerAlarm,
    ];

    pub const fn opcode(self) -> u8 {
        match self {
            Command::Voltage => layout::OPCODE_VOLTAGE,
            Command::Current => layout::OPCODE_CURRENT,
            Command::Power => layout::OPCODE_POWER,
            Command::Energy => layout::OPCODE_ENERGY,
            Command::SetAddress => layout::OPCODE_SET_ADDRESS,
            Command::PowerAlarm => layout::OPCODE_POWER_ALARM,
        }
    }

    /// Tag the meter puts in the first byte of its answer to this command.
    pub const fn response_tag(self) -> u8 {
        match self {
            Command::Voltage => layout::TAG_VOLTAGE,
            Command::Current => layout::TAG_CURRENT,
            Command::Power => layout::TAG_POWER,
            Command::Energy => layout::TAG_ENERGY,
            Command::SetAddress => layout::TAG_SET_ADDRESS,
            Command::PowerAlarm => layout::TAG_POWER_ALARM,
        }
    }

    pub fn from_opcode(value: u8) -> Result<Self, ProtocolError> {
        Self::ALL
            .into_iter()
            .find(|command| command.opcode() == value)
            .ok_or(ProtocolError::UnknownOpcode { value })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Command::Voltage => "voltage",
            Command::Current => "current",
            Command::Power => "power",
            Command::Energy => "energy",
            Command::SetAddress => "set-address",
            Command::PowerAlarm => "power-alarm",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Host-to-meter request.
///
/// The checksum is not stored: it is derived from the other fields whenever
/// the frame is serialized, so it can never go stale.
///
/// # Examples
/// ```
/// use pzemlink_core::{Command, CommandFrame, DeviceAddress};
///
/// let frame = CommandFrame::new(Command::Voltage, DeviceAddress::new([192, 168, 1, 1]));
/// assert_eq!(frame.to_bytes(), [0xB0, 0xC0, 0xA8, 0x01, 0x01, 0x00, 0x1A]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    pub command: Command,
    pub address: DeviceAddress,
    pub payload: u8,
}

impl CommandFrame {
    pub fn new(command: Command, address: DeviceAddress) -> Self {
        encode_command(command, address, 0)
    }

    pub fn with_payload(command: Command, address: DeviceAddress, payload: u8) -> Self {
        encode_command(command, address, payload)
    }

    pub fn checksum(&self) -> u8 {
        checksum(&self.body())
    }

    pub fn to_bytes(&self) -> [u8; layout::COMMAND_FRAME_LEN] {
        let mut bytes = [0u8; layout::COMMAND_FRAME_LEN];
        bytes[..layout::COMMAND_CHECKSUM_OFFSET].copy_from_slice(&self.body());
        bytes[layout::COMMAND_CHECKSUM_OFFSET] = self.checksum();
        bytes
    }

    fn body(&self) -> [u8; layout::COMMAND_CHECKSUM_OFFSET] {
        let mut body = [0u8; layout::COMMAND_CHECKSUM_OFFSET];
        body[layout::COMMAND_OPCODE_OFFSET] = self.command.opcode();
        body[layout::COMMAND_ADDRESS_RANGE].copy_from_slice(&self.address.octets());
        body[layout::COMMAND_PAYLOAD_OFFSET] = self.payload;
        body
    }
}

/// Build a command frame. Pure construction; it cannot fail.
pub fn encode_command(command: Command, address: DeviceAddress, payload: u8) -> CommandFrame {
    CommandFrame {
        command,
        address,
        payload,
    }
}

/// Validate a raw command frame as a meter would receive it.
pub fn parse_command(bytes: &[u8]) -> Result<CommandFrame, ProtocolError> {
    let reader = FrameReader::new(bytes);
    reader.require_exact_len(layout::COMMAND_FRAME_LEN)?;
    reader.verify_checksum(layout::COMMAND_CHECKSUM_OFFSET)?;

    let command = Command::from_opcode(reader.read_u8(layout::COMMAND_OPCODE_OFFSET)?)?;
    let address: [u8; 4] = reader.read_array(layout::COMMAND_ADDRESS_RANGE)?;
    let payload = reader.read_u8(layout::COMMAND_PAYLOAD_OFFSET)?;

    Ok(CommandFrame {
        command,
        address: DeviceAddress::from(address),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::{Command, CommandFrame, encode_command, parse_command};
    use crate::protocol::checksum::verify;
    use crate::protocol::error::ProtocolError;
    use crate::protocol::layout;
    use crate::DeviceAddress;

    #[test]
    fn opcode_and_tag_table() {
        let table: Vec<(u8, u8)> = Command::ALL
            .iter()
            .map(|c| (c.opcode(), c.response_tag()))
            .collect();
        assert_eq!(
            table,
            vec![
                (0xB0, 0xA0),
                (0xB1, 0xA1),
                (0xB2, 0xA2),
                (0xB3, 0xA3),
                (0xB4, 0xA4),
                (0xB5, 0xA5),
            ]
        );
    }

    #[test]
    fn from_opcode_rejects_unknown() {
        assert_eq!(Command::from_opcode(0xB3), Ok(Command::Energy));
        assert_eq!(
            Command::from_opcode(0xB6),
            Err(ProtocolError::UnknownOpcode { value: 0xB6 })
        );
    }

    #[test]
    fn encoded_frames_always_verify() {
        let addresses = [[0, 0, 0, 0], [192, 168, 1, 1], [255, 255, 255, 255]];
        for command in Command::ALL {
            for octets in addresses {
                for payload in [0u8, 1, 0x7F, 0xFF] {
                    let frame = encode_command(command, DeviceAddress::new(octets), payload);
                    let bytes = frame.to_bytes();
                    assert_eq!(bytes.len(), layout::COMMAND_FRAME_LEN);
                    assert!(verify(&bytes), "{command} {octets:?} {payload}");
                    assert_eq!(bytes[layout::COMMAND_CHECKSUM_OFFSET], frame.checksum());
                }
            }
        }
    }

    #[test]
    fn alarm_frame_carries_threshold() {
        let frame =
            CommandFrame::with_payload(Command::PowerAlarm, DeviceAddress::new([1, 2, 3, 4]), 20);
        assert_eq!(frame.to_bytes(), [0xB5, 1, 2, 3, 4, 20, 0xD3]);
    }

    #[test]
    fn parse_command_accepts_encoded_frame() {
        let frame = CommandFrame::new(Command::Energy, DeviceAddress::new([10, 0, 0, 7]));
        assert_eq!(parse_command(&frame.to_bytes()), Ok(frame));
    }

    #[test]
    fn parse_command_rejects_bad_checksum_and_length() {
        let mut bytes = CommandFrame::new(Command::Power, DeviceAddress::new([1, 1, 1, 1])).to_bytes();
        bytes[6] ^= 0x01;
        assert!(matches!(
            parse_command(&bytes),
            Err(ProtocolError::Checksum { .. })
        ));
        assert!(matches!(
            parse_command(&bytes[..6]),
            Err(ProtocolError::InvalidLength { expected: 7, actual: 6 })
        ));
    }
}

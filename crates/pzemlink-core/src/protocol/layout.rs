pub const COMMAND_FRAME_LEN: usize = 7;
pub const RESPONSE_FRAME_LEN: usize = 6;
pub const RESPONSE_DATA_LEN: usize = 4;

pub const COMMAND_OPCODE_OFFSET: usize = 0;
pub const COMMAND_ADDRESS_RANGE: std::ops::Range<usize> = 1..5;
pub const COMMAND_PAYLOAD_OFFSET: usize = 5;
pub const COMMAND_CHECKSUM_OFFSET: usize = 6;

pub const RESPONSE_TAG_OFFSET: usize = 0;
pub const RESPONSE_DATA_RANGE: std::ops::Range<usize> = 1..5;
pub const RESPONSE_CHECKSUM_OFFSET: usize = 5;

pub const OPCODE_VOLTAGE: u8 = 0xB0;
pub const OPCODE_CURRENT: u8 = 0xB1;
pub const OPCODE_POWER: u8 = 0xB2;
pub const OPCODE_ENERGY: u8 = 0xB3;
pub const OPCODE_SET_ADDRESS: u8 = 0xB4;
pub const OPCODE_POWER_ALARM: u8 = 0xB5;

pub const TAG_VOLTAGE: u8 = 0xA0;
pub const TAG_CURRENT: u8 = 0xA1;
pub const TAG_POWER: u8 = 0xA2;
pub const TAG_ENERGY: u8 = 0xA3;
pub const TAG_SET_ADDRESS: u8 = 0xA4;
pub const TAG_POWER_ALARM: u8 = 0xA5;

/// Value of the spurious byte some meters emit before the first real frame byte.
pub const STARTUP_ARTIFACT: u8 = 0x00;

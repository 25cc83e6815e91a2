//! Meter wire protocol.
//!
//! Layered the same way for both directions:
//! - `layout`: frame sizes, byte offsets and the opcode/tag table
//! - `reader`: bounds-checked access to a buffered frame
//! - `command` / `response`: frame construction and validation
//! - `decode`: measurement values from response data bytes
//! - `error`: explicit, actionable errors
//!
//! Everything here is pure: no I/O, no clock. The driver owns the transport
//! and feeds this module complete buffers.

pub mod address;
pub mod checksum;
pub mod command;
pub mod decode;
pub mod error;
pub mod layout;
pub mod reader;
pub mod response;

pub use address::{AddressParseError, DeviceAddress};
pub use command::{Command, CommandFrame, encode_command, parse_command};
pub use decode::{
    Quantity, ResponseData, decode_ack, decode_current, decode_energy, decode_power,
    decode_quantity, decode_voltage, encode_current, encode_energy, encode_power,
    encode_quantity, encode_voltage,
};
pub use error::ProtocolError;
pub use response::{ResponseFrame, encode_response, parse_response};

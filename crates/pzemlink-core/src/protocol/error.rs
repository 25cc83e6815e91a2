use thiserror::Error;

/// Errors returned when validating a frame that is already fully buffered.
///
/// # Examples
/// ```
/// use pzemlink_core::protocol::error::ProtocolError;
///
/// let err = ProtocolError::TagMismatch { expected: 0xA0, actual: 0xA1 };
/// assert!(err.to_string().contains("unexpected response tag"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid frame length: need {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("checksum mismatch: computed {expected:#04x}, frame carries {actual:#04x}")]
    Checksum { expected: u8, actual: u8 },
    #[error("unexpected response tag: expected {expected:#04x}, got {actual:#04x}")]
    TagMismatch { expected: u8, actual: u8 },
    #[error("unknown opcode: {value:#04x}")]
    UnknownOpcode { value: u8 },
}

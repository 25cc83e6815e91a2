use thiserror::Error;

use crate::protocol::ProtocolError;
use crate::transport::TransportError;

/// Why a single request to a meter failed.
///
/// Every variant is local to one exchange: the driver never retries, and the
/// next request starts from a clean read.
///
/// # Examples
/// ```
/// use pzemlink_core::PzemError;
///
/// let err = PzemError::Framing { received: 3, expected: 6 };
/// assert!(err.is_no_response());
/// assert!(err.to_string().contains("3 of 6"));
/// ```
#[derive(Debug, Error)]
pub enum PzemError {
    #[error("no response within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
    #[error("incomplete response: received {received} of {expected} bytes")]
    Framing { received: usize, expected: usize },
    #[error("response checksum mismatch: computed {expected:#04x}, received {actual:#04x}")]
    Checksum { expected: u8, actual: u8 },
    #[error("unexpected response tag: expected {expected:#04x}, got {actual:#04x}")]
    TagMismatch { expected: u8, actual: u8 },
    #[error("protocol error: {0}")]
    Protocol(ProtocolError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl PzemError {
    /// Timeouts and partial frames look the same to a caller: nothing usable
    /// came back.
    pub fn is_no_response(&self) -> bool {
        matches!(self, PzemError::Timeout { .. } | PzemError::Framing { .. })
    }
}

impl From<ProtocolError> for PzemError {
    fn from(value: ProtocolError) -> Self {
        match value {
            ProtocolError::InvalidLength { expected, actual } => PzemError::Framing {
                received: actual,
                expected,
            },
            ProtocolError::Checksum { expected, actual } => PzemError::Checksum { expected, actual },
            ProtocolError::TagMismatch { expected, actual } => {
                PzemError::TagMismatch { expected, actual }
            }
            other => PzemError::Protocol(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PzemError;
    use crate::protocol::ProtocolError;

    #[test]
    fn protocol_errors_map_to_driver_taxonomy() {
        let err = PzemError::from(ProtocolError::InvalidLength {
            expected: 6,
            actual: 2,
        });
        assert!(matches!(
            err,
            PzemError::Framing {
                received: 2,
                expected: 6
            }
        ));

        let err = PzemError::from(ProtocolError::TagMismatch {
            expected: 0xA0,
            actual: 0xA1,
        });
        assert!(matches!(
            err,
            PzemError::TagMismatch {
                expected: 0xA0,
                actual: 0xA1
            }
        ));

        let err = PzemError::from(ProtocolError::UnknownOpcode { value: 0x10 });
        assert!(matches!(err, PzemError::Protocol(_)));
    }

    #[test]
    fn only_missing_frames_count_as_no_response() {
        assert!(PzemError::Timeout { timeout_ms: 1000 }.is_no_response());
        assert!(!PzemError::Checksum {
            expected: 1,
            actual: 2
        }
        .is_no_response());
    }
}

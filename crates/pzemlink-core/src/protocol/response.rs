use super::checksum::checksum;
use super::error::ProtocolError;
use super::layout;
use super::reader::FrameReader;

/// Meter-to-host answer: a tag naming the command answered and four data bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame {
    pub tag: u8,
    pub data: [u8; layout::RESPONSE_DATA_LEN],
}

impl ResponseFrame {
    pub fn checksum(&self) -> u8 {
        checksum(&self.body())
    }

    pub fn to_bytes(&self) -> [u8; layout::RESPONSE_FRAME_LEN] {
        let mut bytes = [0u8; layout::RESPONSE_FRAME_LEN];
        bytes[..layout::RESPONSE_CHECKSUM_OFFSET].copy_from_slice(&self.body());
        bytes[layout::RESPONSE_CHECKSUM_OFFSET] = self.checksum();
        bytes
    }

    fn body(&self) -> [u8; layout::RESPONSE_CHECKSUM_OFFSET] {
        let mut body = [0u8; layout::RESPONSE_CHECKSUM_OFFSET];
        body[layout::RESPONSE_TAG_OFFSET] = self.tag;
        body[layout::RESPONSE_DATA_RANGE].copy_from_slice(&self.data);
        body
    }
}

pub fn encode_response(tag: u8, data: [u8; layout::RESPONSE_DATA_LEN]) -> ResponseFrame {
    ResponseFrame { tag, data }
}

/// Validate a buffered response: exact length, then checksum, then tag.
///
/// The order matters to callers: a corrupted frame reports `Checksum` even
/// when its tag byte also looks wrong.
///
/// # Examples
/// ```
/// use pzemlink_core::protocol::parse_response;
///
/// let frame = parse_response(&[0xA0, 0x00, 0xE6, 0x05, 0x00, 0x8B], 0xA0)?;
/// assert_eq!(frame.data, [0x00, 0xE6, 0x05, 0x00]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse_response(bytes: &[u8], expected_tag: u8) -> Result<ResponseFrame, ProtocolError> {
    let reader = FrameReader::new(bytes);
    reader.require_exact_len(layout::RESPONSE_FRAME_LEN)?;
    reader.verify_checksum(layout::RESPONSE_CHECKSUM_OFFSET)?;

    let tag = reader.read_u8(layout::RESPONSE_TAG_OFFSET)?;
    if tag != expected_tag {
        return Err(ProtocolError::TagMismatch {
            expected: expected_tag,
            actual: tag,
        });
    }
    let data = reader.read_array(layout::RESPONSE_DATA_RANGE)?;

    Ok(ResponseFrame { tag, data })
}

#[cfg(test)]
mod tests {
    use super::{encode_response, parse_response};
    use crate::protocol::checksum::checksum;
    use crate::protocol::error::ProtocolError;

    fn frame_with_checksum(body: [u8; 5]) -> Vec<u8> {
        let mut bytes = body.to_vec();
        bytes.push(checksum(&body));
        bytes
    }

    #[test]
    fn accepts_any_buffer_with_matching_checksum() {
        let bodies = [
            [0xA0, 0x00, 0x00, 0x00, 0x00],
            [0xA0, 0xFF, 0xFF, 0xFF, 0xFF],
            [0xA0, 0x12, 0x34, 0x56, 0x78],
        ];
        for body in bodies {
            let bytes = frame_with_checksum(body);
            let frame = parse_response(&bytes, 0xA0).unwrap();
            assert_eq!(frame.data, [body[1], body[2], body[3], body[4]]);
        }
    }

    #[test]
    fn rejects_wrong_tag_with_valid_checksum() {
        let bytes = frame_with_checksum([0xA1, 0x00, 0x01, 0x02, 0x00]);
        assert_eq!(
            parse_response(&bytes, 0xA0),
            Err(ProtocolError::TagMismatch {
                expected: 0xA0,
                actual: 0xA1
            })
        );
    }

    #[test]
    fn checksum_is_checked_before_tag() {
        let mut bytes = frame_with_checksum([0xA1, 0x00, 0x01, 0x02, 0x00]);
        bytes[5] = bytes[5].wrapping_add(1);
        assert!(matches!(
            parse_response(&bytes, 0xA0),
            Err(ProtocolError::Checksum { .. })
        ));
    }

    #[test]
    fn rejects_short_and_overlong() {
        let bytes = frame_with_checksum([0xA0, 0, 0, 0, 0]);
        assert!(matches!(
            parse_response(&bytes[..5], 0xA0),
            Err(ProtocolError::InvalidLength { expected: 6, actual: 5 })
        ));
        let mut long = bytes.clone();
        long.push(0);
        assert!(matches!(
            parse_response(&long, 0xA0),
            Err(ProtocolError::InvalidLength { expected: 6, actual: 7 })
        ));
    }

    #[test]
    fn encoded_response_parses() {
        let frame = encode_response(0xA3, [0x00, 0x01, 0x2C, 0x00]);
        assert_eq!(parse_response(&frame.to_bytes(), 0xA3), Ok(frame));
    }
}

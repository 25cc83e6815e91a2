use super::checksum::checksum;
use super::error::ProtocolError;

/// Bounds-checked view over a buffered frame.
pub struct FrameReader<'a> {
    frame: &'a [u8],
}

impl<'a> FrameReader<'a> {
    pub fn new(frame: &'a [u8]) -> Self {
        Self { frame }
    }

    /// Frames are fixed-size: shorter and longer buffers are both rejected.
    pub fn require_exact_len(&self, expected: usize) -> Result<(), ProtocolError> {
        if self.frame.len() != expected {
            return Err(ProtocolError::InvalidLength {
                expected,
                actual: self.frame.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, ProtocolError> {
        self.frame
            .get(offset)
            .copied()
            .ok_or(ProtocolError::InvalidLength {
                expected: offset + 1,
                actual: self.frame.len(),
            })
    }

    pub fn read_array<const N: usize>(
        &self,
        range: std::ops::Range<usize>,
    ) -> Result<[u8; N], ProtocolError> {
        let slice = self
            .frame
            .get(range.clone())
            .ok_or(ProtocolError::InvalidLength {
                expected: range.end,
                actual: self.frame.len(),
            })?;
        slice.try_into().map_err(|_| ProtocolError::InvalidLength {
            expected: N,
            actual: slice.len(),
        })
    }

    /// Compare the byte at `offset` with the checksum of everything before it.
    pub fn verify_checksum(&self, offset: usize) -> Result<(), ProtocolError> {
        let actual = self.read_u8(offset)?;
        let expected = checksum(&self.frame[..offset]);
        if expected != actual {
            return Err(ProtocolError::Checksum { expected, actual });
        }
        Ok(())
    }
}

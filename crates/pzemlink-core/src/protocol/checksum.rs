//! Additive frame checksum.
//!
//! The meter protects each frame with the low 8 bits of the sum of every
//! preceding byte. This is not a CRC: it cannot detect reordered bytes, and
//! pairs of errors that cancel out in the sum pass unnoticed. It is kept
//! bit-exact because the hardware computes the same value.

/// Sum `bytes` into a 16-bit accumulator and keep the low 8 bits.
///
/// # Examples
/// ```
/// use pzemlink_core::protocol::checksum::checksum;
///
/// assert_eq!(checksum(&[0xB0, 0xC0, 0xA8, 0x01, 0x01, 0x00]), 0x1A);
/// ```
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes
        .iter()
        .fold(0u16, |acc, byte| acc.wrapping_add(u16::from(*byte)));
    (sum & 0xFF) as u8
}

/// Check that the last byte of `frame` is the checksum of the bytes before it.
///
/// Empty input is never valid.
pub fn verify(frame: &[u8]) -> bool {
    match frame.split_last() {
        Some((last, body)) => checksum(body) == *last,
        None => false,
    }
}

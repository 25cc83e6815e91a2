use std::collections::VecDeque;

use super::{Transport, TransportError};

/// In-memory transport: bytes pushed with [`push_inbound`](Self::push_inbound)
/// are readable at once, replies queued with [`queue_reply`](Self::queue_reply)
/// become readable one per write, and bytes the driver writes are recorded.
///
/// # Examples
/// ```
/// use pzemlink_core::{MemoryTransport, Transport};
///
/// let mut transport = MemoryTransport::new();
/// transport.push_inbound(&[0xA0]);
/// assert_eq!(transport.available()?, 1);
/// assert_eq!(transport.read_byte()?, 0xA0);
/// # Ok::<(), pzemlink_core::TransportError>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryTransport {
    inbound: VecDeque<u8>,
    replies: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    trickle: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report at most one available byte per poll, like a slow UART.
    pub fn trickle(mut self) -> Self {
        self.trickle = true;
        self
    }

    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    /// Release `bytes` on the next write, the way a meter answers a command.
    pub fn queue_reply(&mut self, bytes: &[u8]) {
        self.replies.push_back(bytes.to_vec());
    }

    /// Bytes readable by the driver but not read yet.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }
}

impl Transport for MemoryTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.written.extend_from_slice(bytes);
        if let Some(reply) = self.replies.pop_front() {
            self.inbound.extend(reply);
        }
        Ok(())
    }

    fn available(&mut self) -> Result<usize, TransportError> {
        let pending = self.inbound.len();
        Ok(if self.trickle { pending.min(1) } else { pending })
    }

    fn read_byte(&mut self) -> Result<u8, TransportError> {
        self.inbound.pop_front().ok_or(TransportError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryTransport;
    use crate::transport::{Transport, TransportError};

    #[test]
    fn records_writes_in_order() {
        let mut transport = MemoryTransport::new();
        transport.write(&[1, 2]).unwrap();
        transport.write(&[3]).unwrap();
        assert_eq!(transport.written(), &[1, 2, 3]);
        assert_eq!(transport.take_written(), vec![1, 2, 3]);
        assert!(transport.written().is_empty());
    }

    #[test]
    fn trickle_reports_one_byte_at_a_time() {
        let mut transport = MemoryTransport::new().trickle();
        transport.push_inbound(&[1, 2, 3]);
        assert_eq!(transport.available().unwrap(), 1);
        assert_eq!(transport.pending(), 3);
    }

    #[test]
    fn queued_reply_appears_after_write() {
        let mut transport = MemoryTransport::new();
        transport.queue_reply(&[0xA0, 0x01]);
        transport.queue_reply(&[0xA1]);
        assert_eq!(transport.available().unwrap(), 0);
        transport.write(&[0xB0]).unwrap();
        assert_eq!(transport.pending(), 2);
        transport.write(&[0xB1]).unwrap();
        assert_eq!(transport.pending(), 3);
    }

    #[test]
    fn read_from_empty_fails() {
        let mut transport = MemoryTransport::new();
        assert!(matches!(transport.read_byte(), Err(TransportError::Empty)));
    }
}

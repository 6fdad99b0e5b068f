use bytes::{Bytes, BytesMut};

/// Size of a single bulk IN transfer.
pub const CHUNK_SIZE: usize = 64;

/// Bulk IN transfers arrive in opaque chunks of up to [`CHUNK_SIZE`] bytes,
/// but the protocol layer needs byte-exact reads. This buffer sits between
/// the two: chunks are appended at the back, the protocol consumes from the
/// front, and nothing is ever reordered.
#[derive(Debug, Default)]
pub struct ReadBuffer {
    buffer: BytesMut,
}

impl ReadBuffer {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(CHUNK_SIZE * 4),
        }
    }

    /// Append one chunk of bulk IN data.
    pub fn append(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Consume the `len` oldest buffered bytes.
    ///
    /// Callers must check [`len`](Self::len) first; taking more than is
    /// buffered is a logic error.
    pub fn take(&mut self, len: usize) -> Bytes {
        debug_assert!(len <= self.buffer.len());
        self.buffer.split_to(len).freeze()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discard everything currently buffered.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_consumes_in_fifo_order() {
        let mut buffer = ReadBuffer::new();
        buffer.append(&[1, 2, 3]);
        buffer.append(&[4, 5]);

        assert_eq!(&buffer.take(2)[..], &[1, 2]);
        assert_eq!(&buffer.take(3)[..], &[3, 4, 5]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn take_can_span_chunk_boundaries() {
        let mut buffer = ReadBuffer::new();
        buffer.append(&[0xAA; CHUNK_SIZE]);
        buffer.append(&[0xBB; CHUNK_SIZE]);

        let bytes = buffer.take(CHUNK_SIZE + 1);
        assert_eq!(bytes.len(), CHUNK_SIZE + 1);
        assert_eq!(bytes[CHUNK_SIZE - 1], 0xAA);
        assert_eq!(bytes[CHUNK_SIZE], 0xBB);
        assert_eq!(buffer.len(), CHUNK_SIZE - 1);
    }

    #[test]
    fn clear_discards_buffered_bytes() {
        let mut buffer = ReadBuffer::new();
        buffer.append(&[1, 2, 3, 4]);
        buffer.clear();

        assert!(buffer.is_empty());
        buffer.append(&[9]);
        assert_eq!(&buffer.take(1)[..], &[9]);
    }

    #[test]
    fn growth_then_partial_consumption_keeps_remainder() {
        let mut buffer = ReadBuffer::new();
        buffer.append(&[1, 2, 3, 4, 5]);

        let _ = buffer.take(2);
        assert_eq!(buffer.len(), 3);
        buffer.append(&[6]);
        assert_eq!(&buffer.take(4)[..], &[3, 4, 5, 6]);
    }
}

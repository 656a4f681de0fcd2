use bytes::{Bytes, BytesMut};

use crate::codec::{encode_attr_sized, HEADER_SIZE};
use crate::error::Result;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Appends aligned attribute records to an owned buffer.
///
/// Record boundaries are remembered so the finished stream can be handed
/// out one record at a time.
#[derive(Debug, Default)]
pub struct AttrWriter {
    buf: BytesMut,
    starts: Vec<usize>,
}

impl AttrWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_BUFFER_CAPACITY)
    }

    /// Create an empty writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            starts: Vec::new(),
        }
    }

    /// Append a record carrying `payload`.
    pub fn put(&mut self, type_id: u16, payload: &[u8]) -> Result<()> {
        self.put_sized(type_id, payload, payload.len())
    }

    /// Append a record with a `payload_len`-byte payload starting with `payload`.
    pub fn put_sized(&mut self, type_id: u16, payload: &[u8], payload_len: usize) -> Result<()> {
        let start = self.buf.len();
        encode_attr_sized(type_id, payload, payload_len, &mut self.buf)?;
        self.starts.push(start);
        tracing::trace!(
            type_id,
            len = HEADER_SIZE + payload_len,
            offset = start,
            "wrote attribute"
        );
        Ok(())
    }

    /// Append a record whose payload is the stream held by `nested`.
    pub fn put_nested(&mut self, type_id: u16, nested: &AttrWriter) -> Result<()> {
        self.put(type_id, nested.as_slice())
    }

    /// Total bytes written, padding included.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when no record has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of records written.
    pub fn records(&self) -> usize {
        self.starts.len()
    }

    /// The encoded stream.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Each record's wire bytes (header, payload and padding), in order.
    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.starts.iter().enumerate().map(move |(idx, &start)| {
            let end = self
                .starts
                .get(idx + 1)
                .copied()
                .unwrap_or(self.buf.len());
            &self.buf[start..end]
        })
    }

    /// Drop every record, keeping the allocation.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.starts.clear();
    }

    /// Consume the writer and return the encoded stream as frozen bytes.
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

use crate::codec::{decode_attr, Attr};

/// Walks the complete records at the front of a byte buffer.
///
/// Iteration stops silently at the first point where no complete record
/// remains, so a reader over a prefix of a larger stream yields exactly the
/// records that fit. [`AttrReader::consumed`] then tells the caller where the
/// unread remainder starts.
#[derive(Debug, Clone)]
pub struct AttrReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> AttrReader<'a> {
    /// Create a reader positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes walked so far, padding included.
    ///
    /// Sums aligned footprints, not declared lengths, so slicing at this
    /// offset always lands on a record boundary.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Bytes not yet walked.
    pub fn remaining(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// True when every byte of the buffer has been walked.
    pub fn is_exhausted(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Borrow the underlying buffer.
    pub fn get_ref(&self) -> &'a [u8] {
        self.buf
    }
}

impl<'a> Iterator for AttrReader<'a> {
    type Item = Attr<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let attr = decode_attr(self.remaining())?;
        self.pos += attr.wire_size();
        tracing::trace!(
            type_id = attr.type_id,
            len = attr.declared_len,
            offset = self.pos,
            "walked attribute"
        );
        Some(attr)
    }
}

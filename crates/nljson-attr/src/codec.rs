use bytes::{BufMut, BytesMut};

use crate::error::{AttrError, Result};

/// Attribute header: length (2) + type (2) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Records start on this boundary.
pub const ALIGNTO: usize = 4;

/// Largest payload whose record length still fits in 16 bits.
pub const MAX_PAYLOAD: usize = u16::MAX as usize - HEADER_SIZE;

/// Type flag set by the kernel on nested attributes.
pub const NLA_F_NESTED: u16 = 1 << 15;

/// Type flag marking a payload stored in network byte order.
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;

/// Bits of the type field that carry the attribute type id.
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

/// Round `len` up to the next record boundary.
pub const fn align_up(len: usize) -> usize {
    (len + ALIGNTO - 1) & !(ALIGNTO - 1)
}

/// A borrowed attribute record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr<'a> {
    /// Raw type field, flag bits included.
    pub type_id: u16,
    /// Record length from the header (header + payload, unaligned).
    pub declared_len: u16,
    /// Payload bytes, padding excluded.
    pub payload: &'a [u8],
}

impl<'a> Attr<'a> {
    /// Type id with the flag bits stripped.
    pub fn kind(&self) -> u16 {
        self.type_id & NLA_TYPE_MASK
    }

    /// Payload length (declared length minus header).
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Bytes this record occupies on the wire, padding included.
    pub fn wire_size(&self) -> usize {
        align_up(self.declared_len as usize)
    }
}

/// Encode one record into `dst`.
///
/// Wire format:
/// ```text
/// ┌────────────┬────────────┬──────────────────┬───────────┐
/// │ Length     │ Type       │ Payload          │ Pad       │
/// │ (2B host)  │ (2B host)  │ (Length-4 bytes) │ (0-3B, 0) │
/// └────────────┴────────────┴──────────────────┴───────────┘
/// ```
pub fn encode_attr(type_id: u16, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    encode_attr_sized(type_id, payload, payload.len(), dst)
}

/// Encode one record whose payload is `payload_len` bytes long.
///
/// `payload` is copied first and the rest of the payload is zero filled, so
/// `payload.len()` must not exceed `payload_len`.
pub fn encode_attr_sized(
    type_id: u16,
    payload: &[u8],
    payload_len: usize,
    dst: &mut BytesMut,
) -> Result<()> {
    if payload.len() > payload_len {
        return Err(AttrError::PayloadExceedsLength {
            size: payload.len(),
            declared: payload_len,
        });
    }
    if payload_len > MAX_PAYLOAD {
        return Err(AttrError::PayloadTooLarge {
            size: payload_len,
            max: MAX_PAYLOAD,
        });
    }

    let declared = HEADER_SIZE + payload_len;
    let footprint = align_up(declared);
    dst.reserve(footprint);
    dst.put_u16_ne(declared as u16);
    dst.put_u16_ne(type_id);
    dst.put_slice(payload);
    dst.put_bytes(0, footprint - HEADER_SIZE - payload.len());
    Ok(())
}

/// Decode the record at the start of `src`.
///
/// Returns `None` when `src` does not start with a complete, well-formed
/// record: a header shorter than 4 bytes, a declared length below the header
/// size, or an aligned footprint larger than `src`.
pub fn decode_attr(src: &[u8]) -> Option<Attr<'_>> {
    if src.len() < HEADER_SIZE {
        return None;
    }

    let declared_len = u16::from_ne_bytes([src[0], src[1]]);
    let type_id = u16::from_ne_bytes([src[2], src[3]]);
    let declared = declared_len as usize;

    if declared < HEADER_SIZE || align_up(declared) > src.len() {
        return None;
    }

    Some(Attr {
        type_id,
        declared_len,
        payload: &src[HEADER_SIZE..declared],
    })
}

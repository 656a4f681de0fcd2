//! Netlink attribute wire records.
//!
//! Every attribute on the wire is a `struct nlattr` followed by its payload:
//! - A 2-byte host-order record length (header + payload, unaligned)
//! - A 2-byte host-order attribute type id
//! - The payload, zero padded up to the next 4-byte boundary
//!
//! Records concatenate with no separator. Nested attributes carry a
//! complete attribute stream as their payload.

pub mod codec;
pub mod data_type;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    align_up, decode_attr, encode_attr, encode_attr_sized, Attr, ALIGNTO, HEADER_SIZE,
    MAX_PAYLOAD, NLA_F_NESTED, NLA_F_NET_BYTEORDER, NLA_TYPE_MASK,
};
pub use data_type::DataType;
pub use error::{AttrError, Result};
pub use reader::AttrReader;
pub use writer::AttrWriter;

//! Netlink attribute streams as JSON.
//!
//! nljson turns the type-length-value attribute streams carried by netlink
//! messages into JSON documents and back, naming and typing each record
//! through a recursive attribute policy.
//!
//! # Crate Structure
//!
//! - [`attr`]: wire records, alignment and the attribute data types
//! - [`policy`]: policy documents compiled into lookup trees
//! - [`codec`]: the encoder, decoder, handles and stream adapters
//!
//! ```
//! use nljson::{decode_alloc, CodecConfig, Handle};
//!
//! let handle = Handle::from_policy_str(
//!     r#"{"IFLA_MTU": {"attr_type": 4, "data_type": "NLA_U32"}}"#,
//!     CodecConfig::default(),
//! )?;
//!
//! let mut nla = Vec::new();
//! nla.extend_from_slice(&8u16.to_ne_bytes());
//! nla.extend_from_slice(&4u16.to_ne_bytes());
//! nla.extend_from_slice(&1500u32.to_ne_bytes());
//!
//! let json = handle.encode_alloc(&nla)?;
//! assert_eq!(
//!     json.output,
//!     r#"{"IFLA_MTU":{"data_type":"NLA_U32","type":4,"length":4,"value":1500}}"#
//! );
//!
//! let back = decode_alloc(json.output.as_bytes())?;
//! assert_eq!(&back.output[..], &nla[..]);
//! # Ok::<(), nljson::CodecError>(())
//! ```

/// Re-export wire record types.
pub mod attr {
    pub use nljson_attr::*;
}

/// Re-export policy types.
pub mod policy {
    pub use nljson_policy::*;
}

/// Re-export codec types.
pub mod codec {
    pub use nljson_codec::*;
}

pub use nljson_attr::DataType;
pub use nljson_codec::{
    decode, decode_alloc, decode_to, CodecConfig, CodecError, DecodeStream, EncodeStream, Handle,
    Progress, Result, Timestamp, Transcoded,
};
pub use nljson_policy::{AttributePolicy, SchemaError};

//! Netlink attribute stream <-> JSON codec.
//!
//! Encoding walks a binary attribute stream and renders each record as a
//! JSON attribute object, named and typed by an optional
//! [`nljson_policy::AttributePolicy`]. Decoding turns such a document back
//! into the exact binary stream. Every call reports how many input bytes it
//! used, so callers can feed partial input and resume with the remainder.
//!
//! Attribute object shape:
//! ```json
//! { "data_type": "NLA_U32", "type": 4, "length": 4, "value": 1500 }
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod handle;
pub mod output;
pub mod stream;

mod decoder;
mod encoder;

pub use config::CodecConfig;
pub use document::Timestamp;
pub use error::{CodecError, Result};
pub use handle::{decode, decode_alloc, decode_to, Handle};
pub use output::{Progress, Transcoded};
pub use stream::{DecodeStream, EncodeStream};

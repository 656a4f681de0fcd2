use std::io::{Read, Write};
use std::path::Path;

use bytes::Bytes;
use nljson_policy::AttributePolicy;
use serde_json::Value;

use crate::config::CodecConfig;
use crate::decoder::decode_document;
use crate::document::render;
use crate::encoder::encode_members;
use crate::error::{CodecError, Result};
use crate::output::{
    alloc_exact, copy_into, flush, write_chunk, Progress, Transcoded, OUTPUT_CHUNK_SIZE,
};

/// Codec state built once and shared read-only by every call.
///
/// A handle owns an optional compiled policy and the behavior flags. It is
/// never mutated after construction, so one handle can serve any number of
/// threads at once.
#[derive(Debug, Clone, Default)]
pub struct Handle {
    policy: Option<AttributePolicy>,
    config: CodecConfig,
}

impl Handle {
    /// Build a handle from an already compiled policy.
    pub fn new(policy: Option<AttributePolicy>, config: CodecConfig) -> Self {
        Self { policy, config }
    }

    /// Build a handle from policy JSON text.
    pub fn from_policy_str(policy_json: &str, config: CodecConfig) -> Result<Self> {
        let policy = AttributePolicy::from_json_str(policy_json)?;
        Ok(Self::new(Some(policy), config))
    }

    /// Build a handle from a policy file.
    pub fn from_policy_file(path: impl AsRef<Path>, config: CodecConfig) -> Result<Self> {
        let policy = AttributePolicy::from_file(path.as_ref())?;
        Ok(Self::new(Some(policy), config))
    }

    /// Build a handle from policy JSON pulled out of `reader`.
    pub fn from_policy_reader<R: Read>(reader: R, config: CodecConfig) -> Result<Self> {
        let policy = AttributePolicy::from_reader(reader)?;
        Ok(Self::new(Some(policy), config))
    }

    pub fn policy(&self) -> Option<&AttributePolicy> {
        self.policy.as_ref()
    }

    pub fn config(&self) -> CodecConfig {
        self.config
    }

    /// Encode the complete records at the front of `nla` into a JSON value.
    ///
    /// Also returns the number of bytes walked, padding included.
    pub fn encode_value(&self, nla: &[u8]) -> Result<(Value, usize)> {
        let (members, consumed) = encode_members(nla, self.policy(), &self.config)?;
        Ok((Value::Object(members), consumed))
    }

    fn encode_text(&self, nla: &[u8]) -> Result<(String, usize)> {
        let (members, consumed) = encode_members(nla, self.policy(), &self.config)?;
        Ok((render(members, self.config.pretty)?, consumed))
    }

    /// Encode into `output`. Fails with [`CodecError::Capacity`] and leaves
    /// `output` untouched when it is too small.
    pub fn encode(&self, nla: &[u8], output: &mut [u8]) -> Result<Progress> {
        let (text, consumed) = self.encode_text(nla)?;
        let produced = copy_into(text.as_bytes(), output)?;
        Ok(Progress { consumed, produced })
    }

    /// Encode into a newly allocated string sized to the output.
    pub fn encode_alloc(&self, nla: &[u8]) -> Result<Transcoded<String>> {
        let (text, consumed) = self.encode_text(nla)?;
        let mut output = String::new();
        output
            .try_reserve_exact(text.len())
            .map_err(|_| CodecError::Allocation(text.len()))?;
        output.push_str(&text);
        Ok(Transcoded { consumed, output })
    }

    /// Encode and push the JSON text to `sink` in chunks.
    ///
    /// Nothing is written unless the whole input encodes.
    pub fn encode_to<W: Write>(&self, nla: &[u8], mut sink: W) -> Result<Progress> {
        let (text, consumed) = self.encode_text(nla)?;
        for chunk in text.as_bytes().chunks(OUTPUT_CHUNK_SIZE) {
            write_chunk(&mut sink, chunk)?;
        }
        flush(&mut sink)?;
        Ok(Progress {
            consumed,
            produced: text.len(),
        })
    }

    /// See [`decode`].
    pub fn decode(&self, input: &[u8], output: &mut [u8]) -> Result<Progress> {
        decode(input, output)
    }

    /// See [`decode_alloc`].
    pub fn decode_alloc(&self, input: &[u8]) -> Result<Transcoded<Bytes>> {
        decode_alloc(input)
    }

    /// See [`decode_to`].
    pub fn decode_to<W: Write>(&self, input: &[u8], sink: W) -> Result<Progress> {
        decode_to(input, sink)
    }
}

/// Decode the first JSON document in `input` into `output`.
///
/// Decoding needs no policy: every attribute object carries its own type,
/// data type and length. Fails with [`CodecError::Capacity`] and leaves
/// `output` untouched when it is too small.
pub fn decode(input: &[u8], output: &mut [u8]) -> Result<Progress> {
    let (writer, consumed) = decode_document(input)?;
    let produced = copy_into(writer.as_slice(), output)?;
    Ok(Progress { consumed, produced })
}

/// Decode the first JSON document in `input` into a buffer sized exactly to
/// the encoded stream.
pub fn decode_alloc(input: &[u8]) -> Result<Transcoded<Bytes>> {
    let (writer, consumed) = decode_document(input)?;
    let output = alloc_exact(writer.chunks(), writer.len())?;
    Ok(Transcoded {
        consumed,
        output: Bytes::from(output),
    })
}

/// Decode the first JSON document in `input` and push each record to `sink`
/// with its own write.
pub fn decode_to<W: Write>(input: &[u8], mut sink: W) -> Result<Progress> {
    let (writer, consumed) = decode_document(input)?;
    for record in writer.chunks() {
        write_chunk(&mut sink, record)?;
    }
    flush(&mut sink)?;
    Ok(Progress {
        consumed,
        produced: writer.len(),
    })
}

//! Binary attribute stream to JSON.

use nljson_attr::{Attr, AttrReader, DataType};
use nljson_policy::{AttributePolicy, AttributeSpec};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::document::{
    qualify, unknown_attr_label, Timestamp, DATA_TYPE_KEY, LENGTH_KEY, TIMESTAMP_KEY, TYPE_KEY,
    VALUE_KEY,
};
use crate::error::{CodecError, Result};

/// Encode the complete records at the front of `nla`.
///
/// Returns the top-level members and the number of bytes walked, padding
/// included. An incomplete trailing record is left for the caller.
pub(crate) fn encode_members(
    nla: &[u8],
    policy: Option<&AttributePolicy>,
    config: &CodecConfig,
) -> Result<(Map<String, Value>, usize)> {
    let mut members = Map::new();
    if config.add_timestamp {
        members.insert(TIMESTAMP_KEY.to_string(), Timestamp::now().into_value());
    }

    let consumed = encode_level(nla, policy, config, "", &mut members)?;
    debug!(
        consumed,
        available = nla.len(),
        members = members.len(),
        "encoded attribute stream"
    );
    Ok((members, consumed))
}

fn encode_level(
    buf: &[u8],
    policy: Option<&AttributePolicy>,
    config: &CodecConfig,
    path: &str,
    members: &mut Map<String, Value>,
) -> Result<usize> {
    let mut reader = AttrReader::new(buf);
    for attr in reader.by_ref() {
        let spec = policy.and_then(|policy| policy.get(attr.kind()));
        if spec.is_none() && config.skip_unknown_attrs {
            trace!(type_id = attr.type_id, path, "skipping unknown attribute");
            continue;
        }

        let label = spec
            .map(|spec| spec.name().to_string())
            .unwrap_or_else(|| unknown_attr_label(attr.type_id));
        let qualified = qualify(path, &label);
        let object = encode_attr(&attr, spec, config, &qualified)?;

        if members.insert(label, Value::Object(object)).is_some() {
            debug!(attr = %qualified, "repeated attribute replaces earlier value");
        }
    }
    Ok(reader.consumed())
}

fn encode_attr(
    attr: &Attr<'_>,
    spec: Option<&AttributeSpec>,
    config: &CodecConfig,
    qualified: &str,
) -> Result<Map<String, Value>> {
    let data_type = spec.map(AttributeSpec::data_type).unwrap_or_default();
    let payload = attr.payload;

    if let Some(spec) = spec {
        if !spec.accepts_len(payload.len()) {
            return Err(CodecError::invalid(
                qualified,
                format!(
                    "payload length {} outside policy bounds {}..={}",
                    payload.len(),
                    spec.min_length(),
                    spec.max_length()
                ),
            ));
        }
    }

    let value = match data_type {
        DataType::U8
        | DataType::U16
        | DataType::U32
        | DataType::U64
        | DataType::Flag
        | DataType::Milliseconds => Value::from(read_uint(payload, data_type, qualified)?),
        DataType::String => {
            let end = payload
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(payload.len());
            Value::String(String::from_utf8_lossy(&payload[..end]).into_owned())
        }
        DataType::Nested => {
            let mut nested = Map::new();
            let walked = encode_level(
                payload,
                spec.and_then(AttributeSpec::nested_policy),
                config,
                qualified,
                &mut nested,
            )?;
            if walked != payload.len() {
                return Err(CodecError::invalid(
                    qualified,
                    format!(
                        "nested payload is {} bytes but its records cover {walked}",
                        payload.len()
                    ),
                ));
            }
            Value::Object(nested)
        }
        DataType::Unspecified => Value::Array(payload.iter().map(|&b| Value::from(b)).collect()),
    };

    let mut object = Map::new();
    object.insert(DATA_TYPE_KEY.to_string(), Value::from(data_type.label()));
    object.insert(TYPE_KEY.to_string(), Value::from(attr.type_id));
    object.insert(LENGTH_KEY.to_string(), Value::from(payload.len()));
    object.insert(VALUE_KEY.to_string(), value);
    Ok(object)
}

fn read_uint(payload: &[u8], data_type: DataType, qualified: &str) -> Result<u64> {
    let mismatch = || {
        CodecError::invalid(
            qualified,
            format!(
                "{data_type} payload is {} bytes, expected {}",
                payload.len(),
                data_type.fixed_width().unwrap_or_default()
            ),
        )
    };

    if data_type.fixed_width() != Some(payload.len()) {
        return Err(mismatch());
    }
    let value = match payload {
        [b] => u64::from(*b),
        [a, b] => u64::from(u16::from_ne_bytes([*a, *b])),
        [a, b, c, d] => u64::from(u32::from_ne_bytes([*a, *b, *c, *d])),
        _ => u64::from_ne_bytes(payload.try_into().map_err(|_| mismatch())?),
    };
    Ok(value)
}

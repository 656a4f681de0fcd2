//! JSON to binary attribute stream.

use nljson_attr::{AttrWriter, DataType};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::document::{kind_of, parse_document, qualify, AttrDoc, Timestamp, TIMESTAMP_KEY};
use crate::error::{CodecError, Result};

/// Decode the first JSON document in `input`.
///
/// Returns the encoded stream and the number of input bytes the document
/// spans. Nothing is produced unless every member validates.
pub(crate) fn decode_document(input: &[u8]) -> Result<(AttrWriter, usize)> {
    let (members, consumed) = parse_document(input)?;
    let writer = decode_members(&members)?;
    debug!(
        consumed,
        produced = writer.len(),
        records = writer.records(),
        "decoded JSON document"
    );
    Ok((writer, consumed))
}

/// Encode already parsed top-level members.
pub(crate) fn decode_members(members: &Map<String, Value>) -> Result<AttrWriter> {
    let mut writer = AttrWriter::new();
    decode_level(members, "", &mut writer)?;
    Ok(writer)
}

fn decode_level(members: &Map<String, Value>, path: &str, out: &mut AttrWriter) -> Result<()> {
    for (label, value) in members {
        if path.is_empty() && label == TIMESTAMP_KEY && Timestamp::from_value(value).is_some() {
            trace!("skipping timestamp member");
            continue;
        }
        decode_attr(&qualify(path, label), value, out)?;
    }
    Ok(())
}

fn decode_attr(qualified: &str, value: &Value, out: &mut AttrWriter) -> Result<()> {
    if !value.is_object() {
        return Err(CodecError::invalid(
            qualified,
            format!("expected an attribute object, found {}", kind_of(value)),
        ));
    }
    let doc =
        AttrDoc::deserialize(value).map_err(|err| CodecError::invalid(qualified, err.to_string()))?;

    let type_id = u16::try_from(doc.type_id).map_err(|_| {
        CodecError::invalid(
            qualified,
            format!("type {} is outside 0..=65535", doc.type_id),
        )
    })?;
    let length = doc
        .length
        .map(|len| {
            usize::try_from(len)
                .map_err(|_| CodecError::invalid(qualified, format!("negative length {len}")))
        })
        .transpose()?;
    let data_type = DataType::from_label(&doc.data_type);

    let written = match data_type {
        DataType::U8
        | DataType::U16
        | DataType::U32
        | DataType::U64
        | DataType::Flag
        | DataType::Milliseconds => {
            let (bytes, width) = integer_payload(qualified, data_type, length, &doc.value)?;
            out.put(type_id, &bytes[..width])
        }
        DataType::String => {
            let Value::String(text) = &doc.value else {
                return Err(shape_mismatch(qualified, data_type, &doc.value));
            };
            let len = fit_length(qualified, text.len(), length)?;
            out.put_sized(type_id, text.as_bytes(), len)
        }
        DataType::Unspecified => {
            let Value::Array(items) = &doc.value else {
                return Err(shape_mismatch(qualified, data_type, &doc.value));
            };
            let bytes = byte_array(qualified, items)?;
            let len = fit_length(qualified, bytes.len(), length)?;
            out.put_sized(type_id, &bytes, len)
        }
        DataType::Nested => {
            let Value::Object(members) = &doc.value else {
                return Err(shape_mismatch(qualified, data_type, &doc.value));
            };
            let mut nested = AttrWriter::new();
            decode_level(members, qualified, &mut nested)?;
            if let Some(len) = length.filter(|&len| len != nested.len()) {
                debug!(
                    attr = qualified,
                    declared = len,
                    actual = nested.len(),
                    "nested length differs from encoded members"
                );
            }
            out.put_nested(type_id, &nested)
        }
    };
    written.map_err(|err| CodecError::invalid(qualified, err.to_string()))
}

/// Host-order bytes of an integer value and the width to emit.
fn integer_payload(
    qualified: &str,
    data_type: DataType,
    length: Option<usize>,
    value: &Value,
) -> Result<([u8; 8], usize)> {
    let width = data_type.fixed_width().unwrap_or_default();
    let len = length.unwrap_or(width);
    if len != width {
        return Err(CodecError::invalid(
            qualified,
            format!("length {len} does not match {data_type} width {width}"),
        ));
    }
    if !value.is_i64() && !value.is_u64() {
        return Err(shape_mismatch(qualified, data_type, value));
    }

    let out_of_range =
        || CodecError::invalid(qualified, format!("{value} does not fit in {data_type}"));
    let n = value.as_u64().ok_or_else(out_of_range)?;
    if width < 8 && n >> (width * 8) != 0 {
        return Err(out_of_range());
    }

    let mut bytes = [0u8; 8];
    match width {
        1 => bytes[0] = n as u8,
        2 => bytes[..2].copy_from_slice(&(n as u16).to_ne_bytes()),
        4 => bytes[..4].copy_from_slice(&(n as u32).to_ne_bytes()),
        _ => bytes = n.to_ne_bytes(),
    }
    Ok((bytes, width))
}

fn byte_array(qualified: &str, items: &[Value]) -> Result<Vec<u8>> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            item.as_u64()
                .and_then(|b| u8::try_from(b).ok())
                .ok_or_else(|| {
                    CodecError::invalid(
                        qualified,
                        format!("element {idx} ({item}) is not an integer in 0..=255"),
                    )
                })
        })
        .collect()
}

/// Payload length for a variable-size value: the explicit length when given,
/// which must be able to hold the value.
fn fit_length(qualified: &str, actual: usize, length: Option<usize>) -> Result<usize> {
    match length {
        None => Ok(actual),
        Some(len) if len >= actual => Ok(len),
        Some(len) => Err(CodecError::invalid(
            qualified,
            format!("value is {actual} bytes but length is {len}"),
        )),
    }
}

fn shape_mismatch(qualified: &str, data_type: DataType, value: &Value) -> CodecError {
    let expected = match data_type {
        DataType::Unspecified => "an array",
        DataType::String => "a string",
        DataType::Nested => "an object",
        _ => "an integer",
    };
    CodecError::invalid(
        qualified,
        format!("{data_type} value must be {expected}, found {}", kind_of(value)),
    )
}

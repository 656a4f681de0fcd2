//! JSON side of the codec: attribute objects, the timestamp member and
//! first-value parsing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{CodecError, Result};

pub const TYPE_KEY: &str = "type";
pub const DATA_TYPE_KEY: &str = "data_type";
pub const LENGTH_KEY: &str = "length";
pub const VALUE_KEY: &str = "value";
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Label prefix for records that have no policy entry.
pub const UNKNOWN_ATTR_PREFIX: &str = "UNKNOWN_ATTR_";

/// Label used for a record the policy does not name.
pub fn unknown_attr_label(type_id: u16) -> String {
    format!("{UNKNOWN_ATTR_PREFIX}{type_id}")
}

/// One attribute object as found in a document, before validation.
#[derive(Debug, Deserialize)]
pub(crate) struct AttrDoc {
    #[serde(rename = "type")]
    pub type_id: i64,
    pub data_type: String,
    #[serde(default)]
    pub length: Option<i64>,
    pub value: Value,
}

/// Wall-clock annotation added by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timestamp {
    pub sec: u64,
    pub nsec: u32,
}

impl Timestamp {
    pub fn now() -> Self {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| Self {
                sec: elapsed.as_secs(),
                nsec: elapsed.subsec_nanos(),
            })
            .unwrap_or_default()
    }

    /// Recognize a value previously produced by [`Timestamp::into_value`].
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }

    pub fn into_value(self) -> Value {
        json!({ "sec": self.sec, "nsec": self.nsec })
    }
}

/// Parse the first JSON value in `input`.
///
/// Returns the top-level members and the offset just past the value.
/// Trailing bytes are left alone.
pub(crate) fn parse_document(input: &[u8]) -> Result<(Map<String, Value>, usize)> {
    let mut values = serde_json::Deserializer::from_slice(input).into_iter::<Value>();
    match values.next() {
        None => Err(CodecError::Incomplete),
        Some(Err(err)) if err.is_eof() => Err(CodecError::Incomplete),
        Some(Err(err)) => Err(CodecError::Parse(err)),
        Some(Ok(Value::Object(members))) => Ok((members, values.byte_offset())),
        Some(Ok(other)) => Err(CodecError::invalid(
            "",
            format!("top-level JSON value must be an object, found {}", kind_of(&other)),
        )),
    }
}

/// Serialize an encoded document.
pub(crate) fn render(members: Map<String, Value>, pretty: bool) -> Result<String> {
    let doc = Value::Object(members);
    let rendered = if pretty {
        serde_json::to_string_pretty(&doc)
    } else {
        serde_json::to_string(&doc)
    };
    rendered.map_err(CodecError::Output)
}

pub(crate) fn qualify(path: &str, label: &str) -> String {
    if path.is_empty() {
        label.to_string()
    } else {
        format!("{path}.{label}")
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_value_and_reports_offset() {
        let input = br#"  {"a":{"type":1,"data_type":"NLA_U8","value":1}} {"b":2}"#;
        let (members, consumed) = parse_document(input).unwrap();
        assert_eq!(members.len(), 1);
        assert!(members.contains_key("a"));
        assert_eq!(&input[consumed..], br#" {"b":2}"#);
    }

    #[test]
    fn truncated_and_empty_input_are_incomplete() {
        assert!(matches!(parse_document(b""), Err(CodecError::Incomplete)));
        assert!(matches!(parse_document(b"  \n"), Err(CodecError::Incomplete)));
        assert!(matches!(
            parse_document(br#"{"a":{"type":1"#),
            Err(CodecError::Incomplete)
        ));
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        assert!(matches!(parse_document(b"{]"), Err(CodecError::Parse(_))));
        assert!(matches!(parse_document(b"nope"), Err(CodecError::Parse(_))));
    }

    #[test]
    fn non_object_document_is_rejected() {
        let err = parse_document(b"[1,2]").unwrap_err();
        assert!(matches!(err, CodecError::Validation { .. }));
    }

    #[test]
    fn member_order_is_preserved() {
        let (members, _) = parse_document(br#"{"z":1,"a":2,"m":3}"#).unwrap();
        let keys: Vec<&str> = members.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn attr_doc_requires_type_data_type_and_value() {
        let ok = AttrDoc::deserialize(&json!({"type": 3, "data_type": "NLA_U8", "value": 1}));
        let doc = ok.unwrap();
        assert_eq!(doc.type_id, 3);
        assert_eq!(doc.length, None);

        assert!(AttrDoc::deserialize(&json!({"data_type": "NLA_U8", "value": 1})).is_err());
        assert!(AttrDoc::deserialize(&json!({"type": 3, "value": 1})).is_err());
        assert!(AttrDoc::deserialize(&json!({"type": 3, "data_type": "NLA_U8"})).is_err());
        assert!(AttrDoc::deserialize(&json!({"type": "3", "data_type": "NLA_U8", "value": 1}))
            .is_err());
    }

    #[test]
    fn timestamp_value_shape() {
        let ts = Timestamp { sec: 12, nsec: 34 };
        let value = ts.into_value();
        assert_eq!(value, json!({"sec": 12, "nsec": 34}));
        assert_eq!(Timestamp::from_value(&value), Some(ts));

        assert_eq!(Timestamp::from_value(&json!({"sec": 1})), None);
        assert_eq!(
            Timestamp::from_value(&json!({"sec": 1, "nsec": 2, "type": 3})),
            None
        );
        assert!(Timestamp::now().sec > 0);
    }

    #[test]
    fn labels() {
        assert_eq!(unknown_attr_label(42), "UNKNOWN_ATTR_42");
        assert_eq!(qualify("", "A"), "A");
        assert_eq!(qualify("A.B", "C"), "A.B.C");
    }
}

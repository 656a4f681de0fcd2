use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SchemaError};

/// One member of a policy document, before range and shape checks.
#[derive(Debug, Deserialize)]
pub(crate) struct PolicyEntryDoc {
    pub attr_type: i64,
    pub data_type: String,
    #[serde(default)]
    pub attr_len: Option<usize>,
    #[serde(default, alias = "min_length")]
    pub min_len: Option<usize>,
    #[serde(default)]
    pub policy: Option<Value>,
}

impl PolicyEntryDoc {
    pub(crate) fn parse(name: &str, value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(SchemaError::InvalidEntry {
                name: name.to_string(),
                message: "entry is not a JSON object".to_string(),
            });
        }

        Self::deserialize(value).map_err(|err| SchemaError::InvalidEntry {
            name: name.to_string(),
            message: err.to_string(),
        })
    }

    pub(crate) fn attr_type(&self, name: &str) -> Result<u16> {
        u16::try_from(self.attr_type).map_err(|_| SchemaError::AttrTypeOutOfRange {
            name: name.to_string(),
            value: self.attr_type,
        })
    }
}
